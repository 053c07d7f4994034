//! [`ProcessRunner`] implementation backed by [`std::process`].
//!
//! Synchronous calls block the caller until the child exits.  Detached
//! children are put in their own process group with null stdio so they
//! outlive the daemon and ignore its terminal; a short-lived thread reaps
//! each one so no zombies pile up.

use crate::traits::ProcessRunner;
use log::{debug, warn};
use std::io::Write;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

/// Errors that can occur when running an external program.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("empty command line")]
    EmptyArgv,
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} was terminated by a signal")]
    Signaled { program: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs programs as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

fn command(argv: &[&str]) -> Result<Command, ProcessError> {
    let (program, args) = argv.split_first().ok_or(ProcessError::EmptyArgv)?;
    let mut cmd = Command::new(program);
    cmd.args(args);
    Ok(cmd)
}

fn spawn_error(argv: &[&str], source: std::io::Error) -> ProcessError {
    ProcessError::Spawn {
        program: argv.first().copied().unwrap_or_default().to_string(),
        source,
    }
}

impl ProcessRunner for SystemRunner {
    fn run_sync(&self, argv: &[&str]) -> Result<i32, ProcessError> {
        let status = command(argv)?
            .stdin(Stdio::null())
            .status()
            .map_err(|e| spawn_error(argv, e))?;
        status.code().ok_or_else(|| ProcessError::Signaled {
            program: argv[0].to_string(),
        })
    }

    fn run_detached(&self, argv: &[&str]) -> Result<(), ProcessError> {
        let mut child = command(argv)?
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .map_err(|e| spawn_error(argv, e))?;
        debug!("detached {:?} as pid {}", argv, child.id());
        std::thread::spawn(move || {
            if let Err(e) = child.wait() {
                warn!("failed to reap detached child: {}", e);
            }
        });
        Ok(())
    }

    fn run_capture(&self, argv: &[&str], input: Option<&[u8]>) -> Result<Vec<u8>, ProcessError> {
        let mut cmd = command(argv)?;
        cmd.stdout(Stdio::piped());
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        let mut child = cmd.spawn().map_err(|e| spawn_error(argv, e))?;

        // Feed stdin from a separate thread so a child that starts writing
        // before it has read everything cannot deadlock us.
        let writer = match (input, child.stdin.take()) {
            (Some(bytes), Some(mut stdin)) => {
                let bytes = bytes.to_vec();
                Some(std::thread::spawn(move || stdin.write_all(&bytes)))
            }
            _ => None,
        };

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            match writer.join() {
                Ok(Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                    return Err(ProcessError::Io(e))
                }
                _ => {}
            }
        }
        Ok(output.stdout)
    }
}
