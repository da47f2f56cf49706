//! The clipboard-to-code paste pipeline.

use crate::domain::buffer::{Position, Selection, TextBuffer};
use crate::domain::clean::{CleanProfile, clean_edges, contains_code};
use crate::domain::errors::PasteError;
use crate::infra::runtime::{Runtime, RuntimeError};

/// Inputs controlling one paste invocation.
#[derive(Debug, Clone)]
pub struct PasteOptions {
    pub language: String,
    pub just_types: bool,
    pub profile: CleanProfile,
}

impl PasteOptions {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            just_types: false,
            profile: CleanProfile::default(),
        }
    }

    pub fn with_just_types(mut self, just_types: bool) -> Self {
        self.just_types = just_types;
        self
    }

    pub fn with_profile(mut self, profile: CleanProfile) -> Self {
        self.profile = profile;
        self
    }
}

/// What a successful paste did to the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteOutcome {
    pub inserted: usize,
    pub removed: usize,
    pub cleaned: bool,
    pub cursor: Position,
}

/// Splices code generated from clipboard JSON into a text buffer.
///
/// The runtime handle is injected so callers own its lifecycle. A failed
/// generation triggers one reinitialization attempt before the error is
/// reported; the reinitialization result is logged and never replaces the
/// original error.
pub struct PasteCommand<R> {
    runtime: R,
}

impl<R: Runtime> PasteCommand<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Run one paste invocation against `buffer`.
    ///
    /// On any error the buffer is left exactly as it was; the edit is a
    /// single remove-and-insert applied only on success.
    pub fn run(
        &mut self,
        clipboard: Option<String>,
        buffer: &mut TextBuffer,
        options: &PasteOptions,
    ) -> Result<PasteOutcome, PasteError> {
        if !self.runtime.is_initialized() && !self.runtime.initialize() {
            return Err(PasteError::RuntimeInit);
        }

        let json = clipboard
            .filter(|text| !text.trim().is_empty())
            .ok_or(PasteError::EmptyClipboard)?;

        match self.runtime.generate(&json, &options.language, options.just_types) {
            Ok(lines) => splice_generated(buffer, lines, &options.profile),
            Err(err) => Err(self.handle_failure(err)),
        }
    }

    fn handle_failure(&mut self, err: RuntimeError) -> PasteError {
        let message = err.to_string();
        tracing::warn!(error = %message, "code generation failed");

        // A failure can leave the runtime's internal state unusable; reset it
        // so the next invocation starts clean.
        if self.runtime.initialize() {
            tracing::info!("runtime reinitialized after failure");
        } else {
            tracing::warn!("runtime reinitialization failed");
        }

        if message.to_lowercase().contains("parse") {
            PasteError::InvalidJson { details: message }
        } else {
            PasteError::Internal { details: message }
        }
    }
}

fn splice_generated(
    buffer: &mut TextBuffer,
    generated: Vec<String>,
    profile: &CleanProfile,
) -> Result<PasteOutcome, PasteError> {
    let Some(selection) = buffer.first_selection() else {
        return Err(PasteError::Internal {
            details: "buffer has no selection".to_owned(),
        });
    };

    let preceding = &buffer.lines()[..selection.start.line.min(buffer.line_count())];
    let at_start = !contains_code(preceding, profile);
    let (lines, cleaned) = if at_start {
        (generated, false)
    } else {
        (clean_edges(&generated, profile), true)
    };

    let remove = removal_range(&selection, buffer.line_count());
    let removed = remove.len();
    let inserted = lines.len();
    buffer.replace_lines(remove, lines);

    let cursor = Position::new(selection.start.line, 0);
    buffer.set_cursor(cursor);

    Ok(PasteOutcome {
        inserted,
        removed,
        cleaned,
        cursor,
    })
}

/// Lines removed ahead of insertion. A selection covers every line it
/// touches, clamped so a selection ending past the last line never addresses
/// one that does not exist.
fn removal_range(selection: &Selection, line_count: usize) -> std::ops::Range<usize> {
    if selection.is_empty() {
        return selection.start.line..selection.start.line;
    }
    let end = (selection.end.line + 1).min(line_count);
    let start = selection.start.line.min(end);
    start..end
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct ScriptedRuntime {
        initialized: bool,
        init_ok: bool,
        init_calls: usize,
        generate_calls: Cell<usize>,
        response: Result<Vec<String>, String>,
    }

    impl ScriptedRuntime {
        fn ready(lines: &[&str]) -> Self {
            Self {
                initialized: true,
                init_ok: true,
                init_calls: 0,
                generate_calls: Cell::new(0),
                response: Ok(lines.iter().map(|line| (*line).to_owned()).collect()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_owned()),
                ..Self::ready(&[])
            }
        }

        fn uninitialized(init_ok: bool) -> Self {
            Self {
                initialized: false,
                init_ok,
                ..Self::ready(&["struct S {}"])
            }
        }
    }

    impl Runtime for ScriptedRuntime {
        fn is_initialized(&self) -> bool {
            self.initialized
        }

        fn initialize(&mut self) -> bool {
            self.init_calls += 1;
            self.initialized = self.init_ok;
            self.init_ok
        }

        fn generate(
            &self,
            _json: &str,
            _language: &str,
            _just_types: bool,
        ) -> Result<Vec<String>, RuntimeError> {
            self.generate_calls.set(self.generate_calls.get() + 1);
            match &self.response {
                Ok(lines) => Ok(lines.clone()),
                Err(message) => Err(RuntimeError::Generation(message.clone())),
            }
        }
    }

    fn buffer_with_cursor(text: &str, line: usize) -> TextBuffer {
        let mut buffer = TextBuffer::from_text(text);
        buffer.set_cursor(Position::new(line, 0));
        buffer
    }

    fn swift() -> PasteOptions {
        PasteOptions::new("swift")
    }

    #[test]
    fn cleans_generated_edges_when_pasting_mid_file() {
        let mut buffer = buffer_with_cursor("a\nb\nc\n", 1);
        let runtime = ScriptedRuntime::ready(&["import Foundation", "", "struct S {}"]);
        let mut command = PasteCommand::new(runtime);

        let outcome = command
            .run(Some("{\"s\": 1}".to_owned()), &mut buffer, &swift())
            .expect("paste succeeds");

        assert_eq!(buffer.lines(), ["a", "struct S {}", "b", "c"]);
        assert!(outcome.cleaned);
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.cursor, Position::new(1, 0));
    }

    #[test]
    fn keeps_generated_lines_at_buffer_start() {
        let mut buffer = buffer_with_cursor("// placeholder\n\n", 2);
        let runtime = ScriptedRuntime::ready(&["import Foundation", "", "struct S {}"]);
        let mut command = PasteCommand::new(runtime);

        let outcome = command
            .run(Some("{}".to_owned()), &mut buffer, &swift())
            .expect("paste succeeds");

        assert_eq!(
            buffer.lines(),
            ["// placeholder", "", "import Foundation", "", "struct S {}"]
        );
        assert!(!outcome.cleaned);
        assert_eq!(outcome.inserted, 3);
    }

    #[test]
    fn replaces_the_selected_line_range() {
        let mut buffer = TextBuffer::from_text("a\nb\nc\nd\n");
        buffer.select(Selection::new(Position::new(1, 0), Position::new(2, 1)));
        let runtime = ScriptedRuntime::ready(&["struct S {}"]);
        let mut command = PasteCommand::new(runtime);

        let outcome = command
            .run(Some("{}".to_owned()), &mut buffer, &swift())
            .expect("paste succeeds");

        assert_eq!(buffer.lines(), ["a", "struct S {}", "d"]);
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.cursor, Position::new(1, 0));
    }

    #[test]
    fn clamps_a_selection_ending_past_the_last_line() {
        let mut buffer = TextBuffer::from_text("a\nb\nc\n");
        buffer.select(Selection::new(Position::new(1, 0), Position::new(3, 0)));
        let runtime = ScriptedRuntime::ready(&["struct S {}"]);
        let mut command = PasteCommand::new(runtime);

        let outcome = command
            .run(Some("{}".to_owned()), &mut buffer, &swift())
            .expect("paste succeeds");

        assert_eq!(buffer.lines(), ["a", "struct S {}"]);
        assert_eq!(outcome.removed, 2);
    }

    #[test]
    fn empty_selection_removes_nothing() {
        let mut buffer = buffer_with_cursor("a\nb\n", 1);
        let runtime = ScriptedRuntime::ready(&["struct S {}"]);
        let mut command = PasteCommand::new(runtime);

        let outcome = command
            .run(Some("{}".to_owned()), &mut buffer, &swift())
            .expect("paste succeeds");

        assert_eq!(buffer.lines(), ["a", "struct S {}", "b"]);
        assert_eq!(outcome.removed, 0);
    }

    #[test]
    fn collapses_to_a_single_cursor_after_insertion() {
        let mut buffer = TextBuffer::from_text("a\nb\nc\n");
        buffer.select(Selection::new(Position::new(1, 0), Position::new(2, 1)));
        let mut command = PasteCommand::new(ScriptedRuntime::ready(&["x"]));

        command
            .run(Some("{}".to_owned()), &mut buffer, &swift())
            .expect("paste succeeds");

        assert_eq!(buffer.selections().len(), 1);
        assert_eq!(
            buffer.first_selection(),
            Some(Selection::cursor(Position::new(1, 0)))
        );
    }

    #[test]
    fn missing_clipboard_is_an_error_without_mutation() {
        let mut buffer = buffer_with_cursor("a\nb\n", 1);
        let before = buffer.clone();
        let mut command = PasteCommand::new(ScriptedRuntime::ready(&["x"]));

        let err = command.run(None, &mut buffer, &swift()).unwrap_err();

        assert_eq!(err.to_string(), "Couldn't get JSON from clipboard");
        assert_eq!(buffer, before);
        assert_eq!(command.runtime().generate_calls.get(), 0);
    }

    #[test]
    fn whitespace_only_clipboard_counts_as_missing() {
        let mut buffer = buffer_with_cursor("a\n", 0);
        let mut command = PasteCommand::new(ScriptedRuntime::ready(&["x"]));

        let err = command
            .run(Some("  \n\t".to_owned()), &mut buffer, &swift())
            .unwrap_err();

        assert!(matches!(err, PasteError::EmptyClipboard));
    }

    #[test]
    fn initializes_the_runtime_lazily() {
        let mut buffer = buffer_with_cursor("a\n", 0);
        let mut command = PasteCommand::new(ScriptedRuntime::uninitialized(true));

        command
            .run(Some("{}".to_owned()), &mut buffer, &swift())
            .expect("paste succeeds");

        assert_eq!(command.runtime().init_calls, 1);
    }

    #[test]
    fn failed_initialization_is_terminal() {
        let mut buffer = buffer_with_cursor("a\n", 0);
        let before = buffer.clone();
        let mut command = PasteCommand::new(ScriptedRuntime::uninitialized(false));

        let err = command
            .run(Some("{}".to_owned()), &mut buffer, &swift())
            .unwrap_err();

        assert!(matches!(err, PasteError::RuntimeInit));
        assert_eq!(buffer, before);
        assert_eq!(command.runtime().generate_calls.get(), 0);
    }

    #[test]
    fn parse_failures_surface_as_invalid_json() {
        let mut buffer = buffer_with_cursor("a\n", 0);
        let mut command =
            PasteCommand::new(ScriptedRuntime::failing("Unable to parse input at line 3"));

        let err = command
            .run(Some("nonsense".to_owned()), &mut buffer, &swift())
            .unwrap_err();

        assert_eq!(err.to_string(), "Clipboard does not contain valid JSON");
        assert_eq!(err.details(), "Unable to parse input at line 3");
        // One reinitialization attempt happens on the failure path.
        assert_eq!(command.runtime().init_calls, 1);
    }

    #[test]
    fn other_failures_surface_as_internal_errors() {
        let mut buffer = buffer_with_cursor("a\n", 0);
        let before = buffer.clone();
        let mut command = PasteCommand::new(ScriptedRuntime::failing("renderer crashed"));

        let err = command
            .run(Some("{}".to_owned()), &mut buffer, &swift())
            .unwrap_err();

        assert!(matches!(err, PasteError::Internal { .. }));
        assert_eq!(err.details(), "renderer crashed");
        assert_eq!(buffer, before);
    }

    #[test]
    fn reinitialization_failure_does_not_mask_the_error() {
        let mut buffer = buffer_with_cursor("a\n", 0);
        let mut runtime = ScriptedRuntime::failing("Unable to parse clipboard");
        runtime.init_ok = false;
        let mut command = PasteCommand::new(runtime);

        let err = command
            .run(Some("nonsense".to_owned()), &mut buffer, &swift())
            .unwrap_err();

        assert!(matches!(err, PasteError::InvalidJson { .. }));
        assert_eq!(command.runtime().init_calls, 1);
    }

    #[test]
    fn buffer_without_selection_is_an_internal_error() {
        let mut buffer = TextBuffer::from_text("a\n");
        let mut command = PasteCommand::new(ScriptedRuntime::ready(&["x"]));

        let err = command
            .run(Some("{}".to_owned()), &mut buffer, &swift())
            .unwrap_err();

        assert!(matches!(err, PasteError::Internal { .. }));
    }
}
