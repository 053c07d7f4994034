//! Core traits that decouple dapper from any specific window manager,
//! process backend or transport mechanism.
//!
//! The [`BindingEngine`](crate::binding::BindingEngine) and the
//! [`dispatcher`](crate::dispatcher) only depend on these abstractions, so
//! tests drive them with recording mocks instead of a live bspwm session.

use crate::command::{DesktopId, DesktopInfo, NodeId};
use crate::daemon::Event;
use crate::process::ProcessError;
use std::sync::mpsc;

/// Abstraction over a window manager that owns named desktops and can move
/// windows between them.
///
/// Every call is synchronous: it returns once the window manager has
/// carried out the request.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// Create a desktop called `name` on the focused monitor.
    fn create_desktop(&self, name: &str) -> Result<(), Self::Error>;

    /// Remove the desktop called `name`.
    fn remove_desktop(&self, name: &str) -> Result<(), Self::Error>;

    /// Focus the desktop called `name`.
    fn focus_desktop(&self, name: &str) -> Result<(), Self::Error>;

    /// Move `window` to the desktop called `desktop`.
    ///
    /// `desktop` may be [`FOCUSED_DESKTOP`](crate::command::FOCUSED_DESKTOP)
    /// to target whatever desktop currently has focus.
    fn move_window(&self, window: NodeId, desktop: &str) -> Result<(), Self::Error>;

    /// Return every desktop on every monitor, with the windows it holds.
    fn desktops(&self) -> Result<Vec<DesktopInfo>, Self::Error>;

    /// Return the class of `window`, or `None` if it has none (or no longer
    /// exists).
    fn window_class(&self, window: NodeId) -> Result<Option<String>, Self::Error>;

    /// Resolve a desktop id to its name, or `None` if the id is unknown.
    fn desktop_name(&self, desktop: DesktopId) -> Result<Option<String>, Self::Error>;
}

/// Runs external programs.
///
/// `argv[0]` is the program, the rest are its arguments.
pub trait ProcessRunner {
    /// Run to completion and return the exit code.  Blocks the caller.
    fn run_sync(&self, argv: &[&str]) -> Result<i32, ProcessError>;

    /// Start the program and return immediately.  The child is detached
    /// from the caller and never waited on by it.
    fn run_detached(&self, argv: &[&str]) -> Result<(), ProcessError>;

    /// Run to completion, optionally feeding `input` to its stdin, and
    /// return everything it wrote to stdout.
    fn run_capture(&self, argv: &[&str], input: Option<&[u8]>) -> Result<Vec<u8>, ProcessError>;
}

/// A source of daemon [`Event`]s.
///
/// Implementations listen on some transport (the bspwm event feed, the
/// command socket, a test harness) and forward what they receive into the
/// provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Events are sent in arrival order, each exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Event`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error>;
}
