//! Clipboard integration utilities.

use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

/// Cross-platform clipboard helper with fallbacks for headless environments.
pub struct Clipboard {
    primary: Option<arboard::Clipboard>,
}

impl Clipboard {
    /// Attempt to initialize the system clipboard. When unavailable we fall back to shell-based
    /// clipboard utilities.
    pub fn new() -> Self {
        let primary = arboard::Clipboard::new().ok();
        Self { primary }
    }

    /// Read the clipboard's plain-text content, falling back to platform-specific executables
    /// if needed. `Ok(None)` means the clipboard holds no text at all.
    pub fn read(&mut self) -> Result<Option<String>> {
        if let Some(primary) = self.primary.as_mut() {
            match primary.get_text() {
                Ok(text) => return Ok(Some(text)),
                Err(arboard::Error::ContentNotAvailable) => return Ok(None),
                Err(_) => self.primary = None,
            }
        }

        fallback_read()
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

fn fallback_read() -> Result<Option<String>> {
    for command in fallback_commands() {
        if let Ok(text) = try_command_read(command) {
            return Ok(text);
        }
    }

    Err(anyhow!(
        "failed to read clipboard text using available backends"
    ))
}

fn try_command_read(command: &[&str]) -> Result<Option<String>> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to spawn clipboard command: {program}"))?;

    if !output.status.success() {
        return Err(anyhow!(
            "clipboard command exited with status {}",
            output.status
        ));
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    Ok((!text.is_empty()).then_some(text))
}

#[cfg(target_os = "macos")]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![&["pbpaste"]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![
        &["xclip", "-selection", "clipboard", "-o"],
        &["wl-paste", "--no-newline"],
    ]
}

#[cfg(target_os = "windows")]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![&["powershell.exe", "-NoProfile", "-Command", "Get-Clipboard"]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    Vec::new()
}
