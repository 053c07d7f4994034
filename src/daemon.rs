//! The event reactor.
//!
//! [`Daemon`] owns the window manager handle, the [`BindingEngine`] and the
//! [`Dispatcher`].  Event sources run on their own threads and only parse;
//! every [`Event`] they produce is handled here, one at a time and to
//! completion, in the order it arrived.  Nothing else mutates the binding
//! state, so it needs no locking.

use crate::binding::{BindingEngine, BindingError};
use crate::command::WmEvent;
use crate::config::Registry;
use crate::dispatcher::{DispatchError, Dispatcher};
use crate::process::SystemRunner;
use crate::traits::{ProcessRunner, WindowManager};
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Upper bound on how long a shutdown request can go unnoticed while the
/// daemon is idle.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Everything the daemon reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A line from the window manager's event feed.
    Wm(WmEvent),
    /// A raw message from a client.
    Client(String),
}

/// Possible errors while handling an event.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// The running daemon.
pub struct Daemon<W: WindowManager, R: ProcessRunner = SystemRunner> {
    wm: W,
    engine: BindingEngine,
    dispatcher: Dispatcher<R>,
}

impl<W: WindowManager, R: ProcessRunner> Daemon<W, R> {
    /// Bind `registry` to `wm` and get ready to handle events.
    pub fn start(wm: W, registry: Registry, dispatcher: Dispatcher<R>) -> Result<Self, BindingError> {
        let engine = BindingEngine::initialize(registry, &wm)?;
        Ok(Self {
            wm,
            engine,
            dispatcher,
        })
    }

    pub fn engine(&self) -> &BindingEngine {
        &self.engine
    }

    pub fn wm(&self) -> &W {
        &self.wm
    }

    pub fn dispatcher(&self) -> &Dispatcher<R> {
        &self.dispatcher
    }

    /// Handle a single event.
    pub fn handle(&mut self, event: Event) -> Result<(), DaemonError> {
        match event {
            Event::Wm(WmEvent::NodeAdd { desktop, node }) => {
                let outcome = self.engine.classify_window(&self.wm, node, desktop)?;
                debug!("node_add {} on {}: {:?}", node, desktop, outcome);
            }
            Event::Wm(WmEvent::NodeRemove { node }) => {
                self.engine.release_window(node);
            }
            Event::Wm(WmEvent::DesktopRemove { desktop }) => {
                self.engine.on_desktop_removed(&self.wm, desktop)?;
            }
            Event::Client(message) => {
                let outcome = self.dispatcher.handle(&self.engine, &self.wm, &message)?;
                debug!("{:?}: {:?}", message, outcome);
            }
        }
        Ok(())
    }

    /// Handle events until `shutdown` is set or every source has gone away.
    ///
    /// `shutdown` is checked before each event.  A failing event is logged
    /// and does not stop the loop.
    pub fn run(&mut self, events: &Receiver<Event>, shutdown: &AtomicBool) {
        info!("dapper running");
        while !shutdown.load(Ordering::SeqCst) {
            match events.recv_timeout(POLL_INTERVAL) {
                Ok(event) => {
                    if let Err(e) = self.handle(event) {
                        error!("event error: {}", e);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("all event sources closed");
                    return;
                }
            }
        }
        info!("shutdown requested");
    }

    /// Remove the app desktops.
    pub fn shutdown(&self) {
        self.engine.shutdown(&self.wm);
    }
}

//  Tests
