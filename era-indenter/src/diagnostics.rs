use crate::error::FormatError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Zero-based line the message belongs to.
    pub line: usize,
    pub message: String,
}

impl From<&FormatError> for Diagnostic {
    fn from(error: &FormatError) -> Self {
        Self {
            line: error.line,
            message: error.message(),
        }
    }
}

/// The per-line diagnostics of one document, ordered by line.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_errors(errors: &[FormatError]) -> Self {
        let mut diagnostics = Self::new();
        diagnostics.extend_errors(errors);
        diagnostics
    }

    pub fn push<S: Into<String>>(&mut self, line: usize, message: S) {
        let position = self.entries.partition_point(|entry| entry.line <= line);
        self.entries.insert(
            position,
            Diagnostic {
                line,
                message: message.into(),
            },
        );
    }

    pub fn extend_errors(&mut self, errors: &[FormatError]) {
        for error in errors {
            self.push(error.line, error.message());
        }
    }

    /// Replace everything reported for lines before `end` with `errors`.
    ///
    /// Used after a pass that replayed lines `0..end`; diagnostics further down
    /// the document were not re-evaluated and are kept.
    pub fn replace_before(&mut self, end: usize, errors: &[FormatError]) {
        self.entries.retain(|entry| entry.line >= end);
        self.extend_errors(errors);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }
}
