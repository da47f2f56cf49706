//! Text buffer primitives for the paste command.

/// A zero-based line/column location inside a buffer.
///
/// Ordering follows document order: first by line, then by column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A span between two positions. Construction normalizes the endpoints so
/// `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    /// Create a selection, swapping the endpoints when given in reverse order.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// A collapsed selection acting as a plain cursor.
    pub fn cursor(at: Position) -> Self {
        Self { start: at, end: at }
    }

    /// Whether the selection covers no text.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// An in-memory line buffer with editor-style selections.
///
/// Buffers live for a single command invocation: they are built from source
/// text, mutated once, and serialized back. Whether the source text ended
/// with a newline is tracked so an in-place rewrite reproduces it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextBuffer {
    lines: Vec<String>,
    selections: Vec<Selection>,
    trailing_newline: bool,
}

impl TextBuffer {
    /// An empty buffer with no lines and no selections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split source text into lines. An empty input produces zero lines.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::new();
        }

        let trailing_newline = text.ends_with('\n');
        let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
        if trailing_newline {
            lines.pop();
        }

        Self {
            lines,
            selections: Vec::new(),
            trailing_newline,
        }
    }

    /// Join the lines back into text, restoring the trailing newline when the
    /// original had one.
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            text.push('\n');
        }
        text
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Replace all selections with the provided one.
    pub fn select(&mut self, selection: Selection) {
        self.selections.clear();
        self.selections.push(selection);
    }

    /// Collapse all selections into a single cursor.
    pub fn set_cursor(&mut self, at: Position) {
        self.select(Selection::cursor(at));
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn first_selection(&self) -> Option<Selection> {
        self.selections.first().copied()
    }

    /// Remove `range` and insert `replacement` in its place as a single edit.
    ///
    /// The range is clamped to the current line count, so a range reaching
    /// past the last line removes only what exists.
    pub fn replace_lines(&mut self, range: std::ops::Range<usize>, replacement: Vec<String>) {
        let end = range.end.min(self.lines.len());
        let start = range.start.min(end);
        self.lines.splice(start..end, replacement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_normalizes_reversed_endpoints() {
        let selection = Selection::new(Position::new(3, 2), Position::new(1, 0));
        assert_eq!(selection.start, Position::new(1, 0));
        assert_eq!(selection.end, Position::new(3, 2));
    }

    #[test]
    fn selection_orders_by_column_within_a_line() {
        let selection = Selection::new(Position::new(2, 7), Position::new(2, 3));
        assert_eq!(selection.start, Position::new(2, 3));
        assert_eq!(selection.end, Position::new(2, 7));
    }

    #[test]
    fn cursor_selection_is_empty() {
        assert!(Selection::cursor(Position::new(4, 1)).is_empty());
        assert!(!Selection::new(Position::new(0, 0), Position::new(0, 1)).is_empty());
    }

    #[test]
    fn from_text_splits_lines_and_tracks_trailing_newline() {
        let buffer = TextBuffer::from_text("a\nb\nc\n");
        assert_eq!(buffer.lines(), ["a", "b", "c"]);
        assert_eq!(buffer.to_text(), "a\nb\nc\n");

        let buffer = TextBuffer::from_text("a\nb");
        assert_eq!(buffer.lines(), ["a", "b"]);
        assert_eq!(buffer.to_text(), "a\nb");
    }

    #[test]
    fn empty_text_produces_an_empty_buffer() {
        let buffer = TextBuffer::from_text("");
        assert_eq!(buffer.line_count(), 0);
        assert_eq!(buffer.to_text(), "");
    }

    #[test]
    fn replace_lines_inserts_without_removal() {
        let mut buffer = TextBuffer::from_text("a\nb\n");
        buffer.replace_lines(1..1, vec!["x".into(), "y".into()]);
        assert_eq!(buffer.lines(), ["a", "x", "y", "b"]);
    }

    #[test]
    fn replace_lines_swaps_a_range() {
        let mut buffer = TextBuffer::from_text("a\nb\nc\nd\n");
        buffer.replace_lines(1..3, vec!["x".into()]);
        assert_eq!(buffer.lines(), ["a", "x", "d"]);
    }

    #[test]
    fn replace_lines_clamps_past_the_end() {
        let mut buffer = TextBuffer::from_text("a\nb\n");
        buffer.replace_lines(1..9, vec!["x".into()]);
        assert_eq!(buffer.lines(), ["a", "x"]);
    }

    #[test]
    fn select_keeps_exactly_one_selection() {
        let mut buffer = TextBuffer::from_text("a\nb\n");
        buffer.select(Selection::new(Position::new(0, 0), Position::new(1, 1)));
        buffer.set_cursor(Position::new(1, 0));
        assert_eq!(buffer.selections().len(), 1);
        assert_eq!(buffer.first_selection(), Some(Selection::cursor(Position::new(1, 0))));
    }
}
