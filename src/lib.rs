//! **dapper** — binds applications to dedicated bspwm desktops.
//!
//! Every configured app gets a desktop of its own name.  Asking for an app
//! (`dapperc term`) either gathers its open windows onto that desktop and
//! focuses it, or launches the app when none are open.  `--pull` brings the
//! windows to the focused desktop instead.  The daemon follows the window
//! manager's event feed to know which windows are live without polling.
//!
//! # Architecture
//!
//! The crate is organised around three core traits:
//!
//! * [`traits::WindowManager`] — desktop and window operations, so the
//!   binding logic is not coupled to any specific window manager.
//! * [`traits::ProcessRunner`] — synchronous, detached and captured child
//!   processes.
//! * [`traits::EventSource`] — the transports that deliver events (the
//!   window-manager feed, the command socket) so the reactor is not coupled
//!   to any specific IPC mechanism.
//!
//! State lives in [`binding::BindingEngine`]; client commands are
//! interpreted by [`dispatcher::Dispatcher`]; [`daemon::Daemon`] feeds both
//! from a single channel.  Concrete implementations live in [`bspwm`]
//! (`bspc`), [`process`] and [`ipc`] (Unix socket).

pub mod binding;
pub mod bspwm;
pub mod command;
pub mod config;
pub mod daemon;
pub mod dispatcher;
pub mod ipc;
pub mod process;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
