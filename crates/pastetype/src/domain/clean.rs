//! Line cleaning applied to generated code before insertion.
//!
//! Code generators emit file-shaped output: a comment banner, import
//! statements, then the declarations. When pasting into the middle of an
//! existing file only the declarations are wanted, so the edges are stripped
//! with per-language prefix rules.

/// Prefix rules describing which lines count as comments or imports for one
/// target language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanProfile {
    comment_prefixes: Vec<String>,
    import_prefixes: Vec<String>,
}

impl Default for CleanProfile {
    /// Rules matching most generator targets: `//` comments and `import`
    /// statements. Languages with other syntax get their own configuration
    /// entry.
    fn default() -> Self {
        Self::new(vec!["//".to_owned()], vec!["import ".to_owned()])
    }
}

impl CleanProfile {
    pub fn new(comment_prefixes: Vec<String>, import_prefixes: Vec<String>) -> Self {
        Self {
            comment_prefixes,
            import_prefixes,
        }
    }

    /// Whether the line is a comment, ignoring leading indentation.
    pub fn is_comment(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        self.comment_prefixes.iter().any(|prefix| trimmed.starts_with(prefix))
    }

    /// Whether the line is an import statement, ignoring leading indentation.
    pub fn is_import(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        self.import_prefixes.iter().any(|prefix| trimmed.starts_with(prefix))
    }

    /// Whether the line carries nothing worth keeping at a file edge.
    pub fn is_ignorable(&self, line: &str) -> bool {
        is_blank(line) || self.is_comment(line) || self.is_import(line)
    }
}

/// Whether the line contains only whitespace.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Drop ignorable lines from both edges of `lines`, keeping everything in
/// between untouched. Returns an empty vector when every line is ignorable.
///
/// The result has non-ignorable first and last lines, so applying this twice
/// yields the same output as applying it once.
pub fn clean_edges(lines: &[String], profile: &CleanProfile) -> Vec<String> {
    let Some(first) = lines.iter().position(|line| !profile.is_ignorable(line)) else {
        return Vec::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !profile.is_ignorable(line))
        .unwrap_or(first);
    lines[first..=last].to_vec()
}

/// Whether any of `lines` is real code, meaning neither blank nor a comment.
/// Imports count as code here: a file that already has imports is past its
/// header.
pub fn contains_code(lines: &[String], profile: &CleanProfile) -> bool {
    lines.iter().any(|line| !is_blank(line) && !profile.is_comment(line))
}
