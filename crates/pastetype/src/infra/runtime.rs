//! External code generation runtime integration.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Executable probed on `PATH` when no command is configured.
pub const DEFAULT_COMMAND: &str = "quicktype";

/// Errors surfaced by a [`Runtime`] implementation.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime is not initialized")]
    NotInitialized,
    #[error("failed to run '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// The runtime ran but rejected the request; the message is its stderr.
    #[error("{0}")]
    Generation(String),
}

/// The JSON-to-code engine consumed by the paste command.
///
/// The handle is injected rather than reached through a global, so callers
/// own its lifecycle. `initialize` doubles as the reset operation invoked
/// after a failed generation.
pub trait Runtime {
    /// Whether the runtime is ready to serve [`Runtime::generate`] calls.
    fn is_initialized(&self) -> bool;

    /// Build or rebuild internal state, reporting whether it succeeded.
    fn initialize(&mut self) -> bool;

    /// Produce generated source lines for the given JSON text.
    fn generate(&self, json: &str, language: &str, just_types: bool) -> Result<Vec<String>, RuntimeError>;
}

/// Runtime backed by the quicktype command-line tool.
///
/// Initialization resolves the executable on `PATH`. Each generation spawns
/// one process: JSON goes to its stdin, generated code comes back on stdout,
/// and stderr text becomes the failure message. Requests are not subject to
/// a timeout; a stuck process blocks the invocation.
#[derive(Debug, Clone)]
pub struct ProcessRuntime {
    command: String,
    extra_args: Vec<String>,
    top_level: String,
    resolved: Option<PathBuf>,
}

impl Default for ProcessRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND)
    }
}

impl ProcessRuntime {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            extra_args: Vec::new(),
            top_level: "TopLevel".to_owned(),
            resolved: None,
        }
    }

    /// Extra arguments appended after the built-in ones.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Name given to the top-level generated type.
    pub fn with_top_level(mut self, name: impl Into<String>) -> Self {
        self.top_level = name.into();
        self
    }
}

impl Runtime for ProcessRuntime {
    fn is_initialized(&self) -> bool {
        self.resolved.is_some()
    }

    fn initialize(&mut self) -> bool {
        match which::which(&self.command) {
            Ok(path) => {
                tracing::debug!(command = %path.display(), "resolved code generation runtime");
                self.resolved = Some(path);
                true
            }
            Err(err) => {
                tracing::warn!(command = %self.command, error = %err, "code generation runtime not found");
                self.resolved = None;
                false
            }
        }
    }

    fn generate(&self, json: &str, language: &str, just_types: bool) -> Result<Vec<String>, RuntimeError> {
        let Some(program) = self.resolved.as_ref() else {
            return Err(RuntimeError::NotInitialized);
        };

        let mut command = Command::new(program);
        command
            .arg("--lang")
            .arg(language)
            .arg("--src-lang")
            .arg("json")
            .arg("--top-level")
            .arg(&self.top_level);
        if just_types {
            command.arg("--just-types");
        }
        command.args(&self.extra_args);
        command.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| RuntimeError::Io {
            command: self.command.clone(),
            source,
        })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(json.as_bytes()).map_err(|source| RuntimeError::Io {
                command: self.command.clone(),
                source,
            })?;
        }
        let output = child.wait_with_output().map_err(|source| RuntimeError::Io {
            command: self.command.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            let message = if stderr.is_empty() {
                format!("runtime exited with {}", output.status)
            } else {
                stderr
            };
            return Err(RuntimeError::Generation(message));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().map(str::to_owned).collect())
    }
}
