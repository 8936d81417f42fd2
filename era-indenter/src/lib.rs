mod classify;
mod config;
mod diagnostics;
mod driver;
mod error;
mod line;
mod predict;
mod resolve;
mod rewrite;
mod state;
mod transition;

pub use crate::classify::{classify, classify_in_context, LineCategory};
pub use crate::config::{ConfigError, IndentUnit, IndenterConfig};
pub use crate::diagnostics::{Diagnostic, Diagnostics};
pub use crate::driver::{
    format_document, format_lines, format_source, FormatOutcome, FormattedSource, Indenter,
    LineEdit,
};
pub use crate::error::{Closer, FormatError, FormatErrorKind};
pub use crate::line::{split_lines, Line};
pub use crate::predict::{predict_next_line, NewLinePrediction, TRIGGER_CHARACTERS};
pub use crate::resolve::{indent_for, resolve, resolve_line, IndentTarget, Resolution};
pub use crate::rewrite::{indent_string, rewrite_line};
pub use crate::state::{IndentState, ParseContext};
pub use crate::transition::transition;
