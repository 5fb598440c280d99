use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::FetchError;

/// Ordered commands handed to the transfer client for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferScript {
    pub commands: Vec<String>,
}

impl TransferScript {
    /// Open the session, change to `remote_dir`, download `filename` into
    /// `staging_dir`, exit.
    pub fn download(
        session_url: &str,
        host_key: &str,
        remote_dir: &str,
        filename: &str,
        staging_dir: &Path,
    ) -> Self {
        let mut target = staging_dir.display().to_string();
        if !target.ends_with(['/', '\\']) {
            target.push(std::path::MAIN_SEPARATOR);
        }
        Self {
            commands: vec![
                format!("open {session_url} -hostkey=\"{host_key}\""),
                "pwd".to_string(),
                format!("cd {remote_dir}"),
                format!("get {filename} {target}"),
                "exit".to_string(),
            ],
        }
    }
}

/// Captured transcript of one client invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOutput {
    /// Standard output split into lines, trailing whitespace removed.
    pub lines: Vec<String>,
    pub exit_success: bool,
}

impl TransferOutput {
    pub fn from_stdout(stdout: &[u8], exit_success: bool) -> Self {
        let lines = String::from_utf8_lossy(stdout)
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect();
        Self {
            lines,
            exit_success,
        }
    }

    /// Last line with visible text, if any.
    pub fn last_non_empty_line(&self) -> Option<&str> {
        self.lines
            .iter()
            .rev()
            .map(String::as_str)
            .find(|line| !line.trim().is_empty())
    }
}

/// Black-box transfer collaborator.
pub trait TransferClient {
    /// Run the script to completion and return its transcript.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] only when the client cannot be run at all.
    /// Transfer failures are reported through the transcript.
    fn run(&self, script: &TransferScript) -> Result<TransferOutput, FetchError>;
}

/// Runs a WinSCP-style console client: `<program> <leading args> <command>...`.
#[derive(Debug, Clone)]
pub struct ScriptedTransferClient {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl ScriptedTransferClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: vec!["/ini=nul".to_string(), "/command".to_string()],
        }
    }

    #[must_use]
    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl TransferClient for ScriptedTransferClient {
    fn run(&self, script: &TransferScript) -> Result<TransferOutput, FetchError> {
        debug!(
            program = %self.program.display(),
            commands = ?script.commands,
            "running transfer script"
        );
        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .args(&script.commands)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| FetchError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim_end(), "transfer client wrote to stderr");
        }
        Ok(TransferOutput::from_stdout(
            &output.stdout,
            output.status.success(),
        ))
    }
}
