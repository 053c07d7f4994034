//! One-shot client side of the command socket.

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::Path;

/// Errors a client can hit.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("No arguments given")]
    NoArguments,
    #[error("Failed to connect to the socket: {0}")]
    Connect(#[source] std::io::Error),
    #[error("Failed to send the data: {0}")]
    Send(#[source] std::io::Error),
}

/// Join `args` into the wire form: single spaces, no terminator.
pub fn encode<S: AsRef<str>>(args: &[S]) -> Result<String, ClientError> {
    if args.is_empty() {
        return Err(ClientError::NoArguments);
    }
    Ok(args
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(" "))
}

/// Send `args` as one command to the daemon listening at `path`.
pub fn send_command<S: AsRef<str>>(path: &Path, args: &[S]) -> Result<(), ClientError> {
    let message = encode(args)?;
    let mut stream = UnixStream::connect(path).map_err(ClientError::Connect)?;
    stream
        .write_all(message.as_bytes())
        .map_err(ClientError::Send)?;
    Ok(())
}
