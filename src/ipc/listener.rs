//! Unix-socket [`EventSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Whatever a client sends in its first write is taken as one complete
//! command; nothing is sent back.
//!
//! # Wire format
//!
//! The client's arguments joined by single spaces, with no length prefix
//! and no terminator:
//!
//! ```text
//! term
//! web --pull
//! ```
//!
//! Messages longer than [`MAX_MESSAGE`] bytes are truncated, and two
//! messages coalesced into one read are not split apart.

use crate::daemon::Event;
use crate::traits::EventSource;
use log::{debug, error, info};
use std::io::Read;
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Fixed socket path shared by the daemon and the client.
pub const SOCKET_PATH: &str = "/tmp/dapper.socket";

/// Largest message read from a single connection.
pub const MAX_MESSAGE: usize = 1024;

/// An [`EventSource`] that accepts client commands on a Unix stream socket.
pub struct UnixSocketListener {
    path: PathBuf,
    listener: UnixListener,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("couldn't bind {path}: {source}")]
    Bind {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl UnixSocketListener {
    /// Bind the socket at `path`, replacing a stale socket file.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self, UnixSocketError> {
        let path = path.as_ref().to_path_buf();
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).map_err(|source| UnixSocketError::Bind {
            path: path.display().to_string(),
            source,
        })?;
        info!("listening on {}", path.display());
        Ok(Self { path, listener })
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read one message from `stream`.  `None` if the client sent nothing.
fn read_message(mut stream: impl Read) -> std::io::Result<Option<String>> {
    let mut buf = [0u8; MAX_MESSAGE];
    let n = stream.read(&mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf[..n]).into_owned()))
}

impl EventSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Accept connections and forward each message as [`Event::Client`].
    ///
    /// This method **blocks** until the receiving side hangs up.  Run it
    /// on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => match read_message(stream) {
                    Ok(Some(message)) => {
                        debug!("received {:?}", message);
                        if sink.send(Event::Client(message)).is_err() {
                            info!("sink closed, shutting down");
                            return Ok(());
                        }
                    }
                    Ok(None) => debug!("client sent nothing"),
                    Err(e) => error!("read error: {}", e),
                },
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
        Ok(())
    }
}

/// Remove the socket file when the listener goes away.
pub fn remove_socket(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            error!("failed to remove {}: {}", path.display(), e);
        }
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Monotonic counter to generate unique socket paths per test.
    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    /// Helper: create a unique temporary socket path for each test.
    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("dapper-test-{}-{}.sock", std::process::id(), id))
    }

    fn send(path: &Path, message: &str) {
        let mut stream = UnixStream::connect(path).expect("connect");
        stream.write_all(message.as_bytes()).unwrap();
    }

    #[test]
    fn each_connection_is_one_command() {
        let path = tmp_socket_path();
        let mut listener = UnixSocketListener::bind(&path).unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = listener.run(tx);
        });

        send(&path, "term");
        send(&path, "web --pull");

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(first, Event::Client("term".into()));
        assert_eq!(second, Event::Client("web --pull".into()));

        remove_socket(&path);
    }

    #[test]
    fn empty_connection_is_skipped() {
        let path = tmp_socket_path();
        let mut listener = UnixSocketListener::bind(&path).unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = listener.run(tx);
        });

        drop(UnixStream::connect(&path).expect("connect"));
        send(&path, "term");

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event, Event::Client("term".into()));

        remove_socket(&path);
    }

    #[test]
    fn bind_replaces_stale_socket_file() {
        let path = tmp_socket_path();
        std::fs::write(&path, b"stale").unwrap();
        let listener = UnixSocketListener::bind(&path).unwrap();
        assert_eq!(listener.path(), path.as_path());
        remove_socket(&path);
        assert!(!path.exists());
    }

    #[test]
    fn bind_in_missing_directory_fails() {
        let path = std::env::temp_dir()
            .join("dapper-test-no-such-dir")
            .join("x.sock");
        assert!(matches!(
            UnixSocketListener::bind(&path),
            Err(UnixSocketError::Bind { .. })
        ));
    }

    #[test]
    fn long_messages_are_truncated() {
        let long = "x".repeat(MAX_MESSAGE + 100);
        let message = read_message(long.as_bytes()).unwrap().unwrap();
        assert_eq!(message.len(), MAX_MESSAGE);
    }
}
