use crate::classify::LineCategory;
use crate::config::IndenterConfig;
use crate::line::Line;

/// The structural mode the indenter is in between two lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseContext {
    /// No special construct is active.
    Normal,
    /// Inside a `[SKIPSTART]` block.
    Comment { is_in_sif: bool },
    /// A continuation was opened on `buffered_line` and its body has not started yet.
    ContinuationOpen { buffered_line: Line, is_in_sif: bool },
    /// Inside a continuation whose kind was pinned by its first body line.
    Continuation {
        body_category: LineCategory,
        is_in_sif: bool,
    },
    /// The previous statement was a `SIF`; the next one is indented once.
    ConditionalSingleLine,
}

impl ParseContext {
    /// Whether a pending `SIF` adds an extra level to the current line.
    pub fn is_in_sif(&self) -> bool {
        match self {
            ParseContext::ConditionalSingleLine => true,
            ParseContext::Comment { is_in_sif }
            | ParseContext::ContinuationOpen { is_in_sif, .. }
            | ParseContext::Continuation { is_in_sif, .. } => *is_in_sif,
            ParseContext::Normal => false,
        }
    }

    /// The context to return to once a nested construct resolves.
    pub(crate) fn resume(is_in_sif: bool) -> Self {
        if is_in_sif {
            ParseContext::ConditionalSingleLine
        } else {
            ParseContext::Normal
        }
    }
}

/// Everything the indenter carries from one line to the next.
///
/// The value is never mutated; each processed line produces a new state.
/// Stray closers are rejected, so `indent_depth` stays non-negative; levels
/// are still clamped when applied to a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentState {
    pub indent_depth: isize,
    pub context: ParseContext,
    pub config: IndenterConfig,
}

impl IndentState {
    pub fn new(config: IndenterConfig) -> Self {
        Self {
            indent_depth: 0,
            context: ParseContext::Normal,
            config,
        }
    }

    pub fn with_depth(&self, indent_depth: isize) -> Self {
        Self {
            indent_depth,
            ..self.clone()
        }
    }

    pub fn with_context(&self, context: ParseContext) -> Self {
        Self {
            context,
            ..self.clone()
        }
    }

    /// The indent an ordinary statement would get on the current line.
    pub fn baseline(&self) -> isize {
        self.indent_depth + isize::from(self.context.is_in_sif())
    }
}
