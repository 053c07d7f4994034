//! Client command handling.
//!
//! A command names an app, optionally followed by `--pull`.  Depending on
//! whether the app has live windows the [`Dispatcher`] either *gathers*
//! them (onto the app's desktop, or onto the focused desktop when pulling)
//! or *launches* the app:
//!
//! * one configured command is started directly;
//! * several commands are offered to the launcher, a chooser such as
//!   `dmenu`, and the first line it prints is started.
//!
//! Launched programs are detached; only the launcher round-trip blocks.

use crate::binding::BindingEngine;
use crate::command::AppCommand;
use crate::config::AppSpec;
use crate::process::{ProcessError, SystemRunner};
use crate::traits::{ProcessRunner, WindowManager};
use log::{debug, info, warn};

/// Shell used to run configured command lines.
const SHELL: &str = "/bin/sh";

/// Possible errors from the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The window manager returned an error.
    #[error("window manager error: {0}")]
    WindowManager(String),
    /// A launch could not be started.
    #[error("launch failed: {0}")]
    Launch(#[from] ProcessError),
}

/// What a command ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Empty message or unknown app.
    Ignored,
    /// Live windows were moved to the target desktop; `windows` counts the
    /// moves that succeeded.
    Gathered { windows: usize },
    /// A command line was started.
    Launched(String),
    /// No windows and nothing to start (no commands, or the launcher
    /// selected nothing).
    NothingLaunched,
}

/// Interprets client commands against a [`BindingEngine`].
pub struct Dispatcher<R: ProcessRunner = SystemRunner> {
    runner: R,
}

impl Default for Dispatcher<SystemRunner> {
    fn default() -> Self {
        Self::new(SystemRunner)
    }
}

impl<R: ProcessRunner> Dispatcher<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Handle one raw client message.
    ///
    /// Unknown apps are ignored without touching the window manager.  A
    /// window that cannot be moved is skipped; the rest are still gathered.
    pub fn handle<W: WindowManager>(
        &self,
        engine: &BindingEngine,
        wm: &W,
        message: &str,
    ) -> Result<Outcome, DispatchError> {
        let Some(cmd) = AppCommand::parse(message) else {
            return Ok(Outcome::Ignored);
        };
        let Some(app) = engine.registry().get(&cmd.app) else {
            return Ok(Outcome::Ignored);
        };
        info!("{}", cmd);

        if engine.has_live_windows(&app.name) {
            let target = cmd.target_desktop();
            let mut moved = 0;
            for window in engine.windows_of(&app.name) {
                debug!("  {} -> {}", window, target);
                match wm.move_window(window, target) {
                    Ok(()) => moved += 1,
                    Err(e) => warn!("failed to move {} to {}: {}", window, target, e),
                }
            }
            if !cmd.pull {
                wm.focus_desktop(&app.name)
                    .map_err(|e| DispatchError::WindowManager(e.to_string()))?;
            }
            return Ok(Outcome::Gathered { windows: moved });
        }

        if !cmd.pull {
            wm.focus_desktop(&app.name)
                .map_err(|e| DispatchError::WindowManager(e.to_string()))?;
        }
        self.launch(app, engine.registry().launcher())
    }

    /// Start `app`, asking `launcher` to choose when it has several
    /// commands.
    fn launch(&self, app: &AppSpec, launcher: &str) -> Result<Outcome, DispatchError> {
        let line = match app.commands.as_slice() {
            [] => {
                debug!("{} has no commands", app.name);
                return Ok(Outcome::NothingLaunched);
            }
            [only] => only.clone(),
            many => {
                // Candidates are joined without a separator.
                let candidates = many.concat();
                let out = self
                    .runner
                    .run_capture(&[SHELL, "-c", launcher], Some(candidates.as_bytes()))?;
                match String::from_utf8_lossy(&out).lines().next() {
                    Some(first) if !first.trim().is_empty() => first.to_string(),
                    _ => {
                        debug!("launcher selected nothing for {}", app.name);
                        return Ok(Outcome::NothingLaunched);
                    }
                }
            }
        };
        info!("launching {}", line);
        self.runner.run_detached(&[SHELL, "-c", line.as_str()])?;
        Ok(Outcome::Launched(line))
    }
}

//  Tests
