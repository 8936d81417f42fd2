use std::fmt;

use thiserror::Error;

/// The closing token a structural error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closer {
    Block,
    SelectCase,
    SkipBlock,
    Continuation,
}

impl fmt::Display for Closer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Closer::Block => "block terminator",
            Closer::SelectCase => "ENDSELECT",
            Closer::SkipBlock => "[SKIPEND]",
            Closer::Continuation => "`}`",
        };
        f.write_str(label)
    }
}

fn illegal_sif_body_message(closer: &Option<Closer>) -> String {
    match closer {
        Some(closer) => format!("{closer} directly after SIF has no matching opener"),
        None => "the line after SIF may not open or close a block".to_string(),
    }
}

/// Why a line could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatErrorKind {
    /// A closing token with nothing open to close.
    #[error("{0} has no matching opener")]
    StructuralMismatch(Closer),
    /// A `{` while a continuation is still waiting for its body.
    #[error("continuation blocks may not nest")]
    NestedConstruct,
    /// The statement governed by `SIF` is structural.
    #[error("{}", illegal_sif_body_message(.closer))]
    IllegalSifBody { closer: Option<Closer> },
}

/// A line the indenter refused to rewrite. Processing continues past it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {}: {kind}", .line + 1)]
pub struct FormatError {
    /// Zero-based index of the offending line.
    pub line: usize,
    pub kind: FormatErrorKind,
}

impl FormatError {
    pub fn new(line: usize, kind: FormatErrorKind) -> Self {
        Self { line, kind }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}
