//! Translates the bspwm event feed into [`WmEvent`]s.
//!
//! `bspc subscribe` prints one event per line, fields separated by single
//! spaces, with every id in base 16:
//!
//! | Event            | Fields                                                   |
//! |------------------|----------------------------------------------------------|
//! | `node_add`       | `<monitor_id> <desktop_id> <ip_id> <node_id>`            |
//! | `node_remove`    | `<monitor_id> <desktop_id> <node_id>`                    |
//! | `desktop_remove` | `<monitor_id> <desktop_id>`                              |
//!
//! [`BspcSubscriber`] runs `bspc subscribe` as a child process and forwards
//! every recognised line as [`Event::Wm`].  Short lines, unparsable ids and
//! other event tags are dropped without comment.

use crate::command::{DesktopId, NodeId, WmEvent};
use crate::daemon::Event;
use crate::traits::EventSource;
use log::{info, warn};
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::{mpsc, Arc, Mutex};

/// Event tags the daemon subscribes to.
pub const SUBSCRIBED_EVENTS: [&str; 3] = ["node_add", "node_remove", "desktop_remove"];

/// Parse a single line of the event feed.
pub fn parse_event_line(line: &str) -> Option<WmEvent> {
    let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split(' ').collect();
    match *fields.first()? {
        "node_add" => Some(WmEvent::NodeAdd {
            desktop: DesktopId::from_hex(fields.get(2)?)?,
            node: NodeId::from_hex(fields.get(4)?)?,
        }),
        "node_remove" => Some(WmEvent::NodeRemove {
            node: NodeId::from_hex(fields.get(3)?)?,
        }),
        "desktop_remove" => Some(WmEvent::DesktopRemove {
            desktop: DesktopId::from_hex(fields.get(2)?)?,
        }),
        _ => None,
    }
}

/// Forward every recognised line read from `reader` into `sink`.
///
/// Returns `Ok(false)` once the receiving side has hung up.
fn forward_lines(reader: impl BufRead, sink: &mpsc::Sender<Event>) -> std::io::Result<bool> {
    for line in reader.lines() {
        if let Some(event) = parse_event_line(&line?) {
            if sink.send(Event::Wm(event)).is_err() {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// An [`EventSource`] reading `bspc subscribe`.
pub struct BspcSubscriber {
    child: Arc<Mutex<Option<Child>>>,
    stdout: Option<ChildStdout>,
}

/// Stops the `bspc subscribe` child from outside the reader thread.
#[derive(Clone)]
pub struct SubscriptionHandle(Arc<Mutex<Option<Child>>>);

impl SubscriptionHandle {
    /// Kill and reap the child.  The reader then sees end of feed.  Calling
    /// this more than once is harmless.
    pub fn stop(&self) {
        let mut slot = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(mut child) = slot.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Error from the bspwm event feed.
#[derive(Debug, thiserror::Error)]
#[error("bspwm event feed error: {0}")]
pub struct BspcSubscribeError(String);

impl BspcSubscriber {
    /// Start `bspc subscribe`.
    ///
    /// The subscription is opened eagerly so a missing `bspc` is reported
    /// at startup rather than from the reader thread.
    pub fn spawn() -> Result<Self, BspcSubscribeError> {
        let mut cmd = Command::new("bspc");
        cmd.arg("subscribe").args(SUBSCRIBED_EVENTS);
        Self::spawn_command(cmd)
    }

    fn spawn_command(mut cmd: Command) -> Result<Self, BspcSubscribeError> {
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| BspcSubscribeError(format!("failed to start bspc subscribe: {}", e)))?;
        let stdout = child.stdout.take();
        Ok(Self {
            child: Arc::new(Mutex::new(Some(child))),
            stdout,
        })
    }

    /// A handle that can end the subscription while [`run`](EventSource::run)
    /// blocks on another thread.
    pub fn handle(&self) -> SubscriptionHandle {
        SubscriptionHandle(Arc::clone(&self.child))
    }
}

impl EventSource for BspcSubscriber {
    type Error = BspcSubscribeError;

    /// Read the feed until it ends.
    ///
    /// This method **blocks**.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        let stdout = self
            .stdout
            .take()
            .ok_or_else(|| BspcSubscribeError("subscription already consumed".into()))?;
        info!("subscribed to {}", SUBSCRIBED_EVENTS.join(", "));

        let result = forward_lines(BufReader::new(stdout), &sink);
        self.handle().stop();
        match result {
            Ok(true) => {
                warn!("bspwm event feed ended");
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => Err(BspcSubscribeError(format!("read error: {}", e))),
        }
    }
}

impl Drop for BspcSubscriber {
    fn drop(&mut self) {
        self.handle().stop();
    }
}
