//! [`WindowManager`] implementation backed by the `bspc` client.
//!
//! Every request is one synchronous `bspc` invocation through a
//! [`ProcessRunner`]: mutations check the exit code, queries parse what
//! `bspc` prints.

use super::tree::{Node, WmState};
use crate::command::{DesktopId, DesktopInfo, NodeId};
use crate::process::{ProcessError, SystemRunner};
use crate::traits::{ProcessRunner, WindowManager};
use log::debug;

const BSPC: &str = "bspc";

/// bspwm-backed window manager.
pub struct BspwmWm<R: ProcessRunner = SystemRunner> {
    runner: R,
}

/// Errors that can occur when talking to bspwm.
#[derive(Debug, thiserror::Error)]
pub enum BspwmError {
    #[error("bspc: {0}")]
    Process(#[from] ProcessError),
    #[error("`{command}` exited with status {code}")]
    Failed { command: String, code: i32 },
    #[error("bspc printed invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Default for BspwmWm<SystemRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl BspwmWm<SystemRunner> {
    /// Create a handle that runs the real `bspc`.
    pub fn new() -> Self {
        Self {
            runner: SystemRunner,
        }
    }
}

impl<R: ProcessRunner> BspwmWm<R> {
    /// Create a handle that runs `bspc` through `runner`.
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run `bspc <args>` and require a zero exit status.
    fn bspc(&self, args: &[&str]) -> Result<(), BspwmError> {
        let argv: Vec<&str> = std::iter::once(BSPC).chain(args.iter().copied()).collect();
        debug!("{}", argv.join(" "));
        match self.runner.run_sync(&argv)? {
            0 => Ok(()),
            code => Err(BspwmError::Failed {
                command: argv.join(" "),
                code,
            }),
        }
    }

    /// Run `bspc <args>` and return its stdout.
    ///
    /// bspc prints nothing when a query matches nothing, so an empty string
    /// means "not found".
    fn bspc_query(&self, args: &[&str]) -> Result<String, BspwmError> {
        let argv: Vec<&str> = std::iter::once(BSPC).chain(args.iter().copied()).collect();
        let out = self.runner.run_capture(&argv, None)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

impl<R: ProcessRunner> WindowManager for BspwmWm<R> {
    type Error = BspwmError;

    fn create_desktop(&self, name: &str) -> Result<(), Self::Error> {
        self.bspc(&["monitor", "-a", name])
    }

    fn remove_desktop(&self, name: &str) -> Result<(), Self::Error> {
        self.bspc(&["desktop", name, "-r"])
    }

    fn focus_desktop(&self, name: &str) -> Result<(), Self::Error> {
        self.bspc(&["desktop", "-f", name])
    }

    fn move_window(&self, window: NodeId, desktop: &str) -> Result<(), Self::Error> {
        let id = window.to_string();
        self.bspc(&["node", id.as_str(), "-d", desktop])
    }

    fn desktops(&self) -> Result<Vec<DesktopInfo>, Self::Error> {
        let json = self.bspc_query(&["wm", "-d"])?;
        let state: WmState = serde_json::from_str(&json)?;
        Ok(state.desktops())
    }

    fn window_class(&self, window: NodeId) -> Result<Option<String>, Self::Error> {
        let id = window.to_string();
        let json = self.bspc_query(&["query", "-T", "-n", id.as_str()])?;
        if json.trim().is_empty() {
            return Ok(None);
        }
        let node: Node = serde_json::from_str(&json)?;
        Ok(node.class_name().map(str::to_string))
    }

    fn desktop_name(&self, desktop: DesktopId) -> Result<Option<String>, Self::Error> {
        let id = desktop.to_string();
        let out = self.bspc_query(&["query", "-D", "-d", id.as_str(), "--names"])?;
        Ok(out
            .lines()
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string))
    }
}
