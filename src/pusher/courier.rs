// ABOUTME: Runs cf CLI commands with an isolated CF_HOME per foundation.
// ABOUTME: Streams combined output to the response or captures it quietly.

use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use super::PusherError;
use crate::output::OutputHandle;

/// Executes `cf` subcommands against one foundation.
///
/// Each courier owns a scratch `CF_HOME` so concurrent logins to different
/// foundations do not clobber one another's tokens.
pub struct Courier {
    binary: PathBuf,
    cf_home: PathBuf,
    working_dir: Option<PathBuf>,
}

impl Courier {
    pub fn new(binary: PathBuf, cf_home: PathBuf) -> Self {
        Self {
            binary,
            cf_home,
            working_dir: None,
        }
    }

    /// Run subsequent commands from `dir` (cf push reads the artifact and
    /// manifest from the working directory).
    pub fn set_working_dir(&mut self, dir: PathBuf) {
        self.working_dir = Some(dir);
    }

    /// Run a cf subcommand, forwarding its combined output to the response
    /// stream. The output is written as one block so the multiplexer keeps it
    /// contiguous.
    pub async fn run(&self, args: &[&str], out: &mut OutputHandle) -> Result<(), PusherError> {
        let (output, description) = self.execute(args).await?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        out.write_all(&combined).map_err(PusherError::Output)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(PusherError::CommandFailed(format!(
                "{} failed: {}",
                description,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    /// Run a cf subcommand without touching the response stream. Returns the
    /// captured stdout on success.
    pub async fn run_quiet(&self, args: &[&str]) -> Result<String, PusherError> {
        let (output, description) = self.execute(args).await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(PusherError::CommandFailed(format!(
                "{} failed: {}",
                description,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    async fn execute(&self, args: &[&str]) -> Result<(std::process::Output, String), PusherError> {
        // Identify the command by its subcommand only; login arguments carry
        // credentials.
        let description = format!(
            "cf {}",
            args.first().copied().unwrap_or_default()
        );

        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .env("CF_HOME", &self.cf_home)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = self.working_dir {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| PusherError::Spawn {
            command: description.clone(),
            source: e,
        })?;

        Ok((output, description))
    }
}
