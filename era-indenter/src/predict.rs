use crate::classify::LineCategory;
use crate::driver::LineEdit;
use crate::resolve::{clamp_level, resolve};
use crate::rewrite::{indent_string, rewrite_line};
use crate::state::{IndentState, ParseContext};

/// Characters after which a host should re-run the indenter while typing.
///
/// Letters can complete a keyword, `}` and `]` can close a continuation or a
/// skip block, and a newline asks for [`predict_next_line`] as well.
pub const TRIGGER_CHARACTERS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz}]\n";

/// What to insert for a new line, plus a late fix for a just-typed `{` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLinePrediction {
    /// Leading whitespace for the new line.
    pub indent: String,
    pub opening_line: Option<LineEdit>,
}

/// Predict the indentation of a line inserted after the line that produced `state`.
///
/// Returns `None` inside a continuation body and inside skip blocks, where
/// the placement of the next line is not known yet.
pub fn predict_next_line(state: &IndentState) -> Option<NewLinePrediction> {
    if let ParseContext::Continuation { .. } = state.context {
        return None;
    }

    let level = resolve(LineCategory::Normal, state)?;
    let unit = state.config.indent_unit;
    let opening_line = match &state.context {
        ParseContext::ContinuationOpen { buffered_line, .. } => Some(LineEdit {
            line: buffered_line.index,
            text: rewrite_line(&buffered_line.text, clamp_level(level - 1), unit),
        }),
        _ => None,
    };

    Some(NewLinePrediction {
        indent: indent_string(unit, clamp_level(level)),
        opening_line,
    })
}
