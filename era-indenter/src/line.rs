/// A single document line as handed over by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Zero-based line index within the document.
    pub index: usize,
    pub text: String,
}

impl Line {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Split a document into line records, dropping the line terminators.
///
/// A trailing newline does not produce an extra empty record, matching
/// [`str::lines`].
pub fn split_lines(source: &str) -> Vec<Line> {
    source
        .lines()
        .enumerate()
        .map(|(index, text)| Line::new(index, text))
        .collect()
}
