use crate::classify::LineCategory;
use crate::error::{Closer, FormatError, FormatErrorKind};
use crate::line::Line;
use crate::state::{IndentState, ParseContext};

/// Advance `state` past `line`, which was classified as `category`.
///
/// On error the caller keeps `state` as it was; the offending line does not
/// move the automaton.
pub fn transition(
    line: &Line,
    category: LineCategory,
    state: &IndentState,
) -> Result<IndentState, FormatError> {
    let error = |kind| FormatError::new(line.index, kind);

    match &state.context {
        ParseContext::Normal => transition_normal(line, category, state),
        ParseContext::Comment { is_in_sif } => match category {
            LineCategory::SkipBlockClose => Ok(state.with_context(ParseContext::resume(*is_in_sif))),
            _ => Ok(state.clone()),
        },
        ParseContext::ContinuationOpen { is_in_sif, .. } => match category {
            LineCategory::Empty => Ok(state.clone()),
            LineCategory::ContinuationClose => {
                Ok(state.with_context(ParseContext::resume(*is_in_sif)))
            }
            LineCategory::ContinuationOpen => Err(error(FormatErrorKind::NestedConstruct)),
            body_category => Ok(state.with_context(ParseContext::Continuation {
                body_category,
                is_in_sif: *is_in_sif,
            })),
        },
        ParseContext::Continuation { body_category, .. } => match category {
            LineCategory::ContinuationClose => {
                let closed = state.with_context(ParseContext::Normal);
                transition_normal(line, *body_category, &closed)
            }
            _ => Ok(state.clone()),
        },
        ParseContext::ConditionalSingleLine => match category {
            LineCategory::Empty | LineCategory::Comment => Ok(state.clone()),
            LineCategory::SkipBlockOpen => {
                Ok(state.with_context(ParseContext::Comment { is_in_sif: true }))
            }
            LineCategory::ContinuationOpen => {
                Ok(state.with_context(ParseContext::ContinuationOpen {
                    buffered_line: line.clone(),
                    is_in_sif: true,
                }))
            }
            LineCategory::SkipBlockClose => Err(error(FormatErrorKind::IllegalSifBody {
                closer: Some(Closer::SkipBlock),
            })),
            LineCategory::ContinuationClose => Err(error(FormatErrorKind::IllegalSifBody {
                closer: Some(Closer::Continuation),
            })),
            LineCategory::BlockOpen
            | LineCategory::BlockClose
            | LineCategory::BlockMid
            | LineCategory::TwoLevelOpen
            | LineCategory::TwoLevelClose
            | LineCategory::ConditionalSingleLine => {
                Err(error(FormatErrorKind::IllegalSifBody { closer: None }))
            }
            LineCategory::FunctionDeclaration => Ok(state
                .with_depth(state.config.function_body_depth())
                .with_context(ParseContext::Normal)),
            LineCategory::Normal | LineCategory::ContinuationBody => {
                Ok(state.with_context(ParseContext::Normal))
            }
        },
    }
}

/// The state to continue from after `transition` rejected a line of `category`.
///
/// Errors normally hold the automaton in place. The closing `}` of a
/// continuation is the exception: when the pinned statement is rejected
/// (an `ENDIF` body at depth 0, say) the braces still balance, so the
/// continuation ends and the depth stays as it was.
pub(crate) fn recover(category: LineCategory, state: &IndentState) -> Option<IndentState> {
    match (&state.context, category) {
        (ParseContext::Continuation { .. }, LineCategory::ContinuationClose) => {
            Some(state.with_context(ParseContext::Normal))
        }
        _ => None,
    }
}

/// Transition rules for a state whose context is [`ParseContext::Normal`].
fn transition_normal(
    line: &Line,
    category: LineCategory,
    state: &IndentState,
) -> Result<IndentState, FormatError> {
    let mismatch = |closer| {
        Err(FormatError::new(
            line.index,
            FormatErrorKind::StructuralMismatch(closer),
        ))
    };
    let depth = state.indent_depth;

    match category {
        // ContinuationBody only arises inside a continuation; elsewhere it is an ordinary statement.
        LineCategory::Empty
        | LineCategory::Normal
        | LineCategory::Comment
        | LineCategory::BlockMid
        | LineCategory::ContinuationBody => Ok(state.clone()),
        LineCategory::FunctionDeclaration => {
            Ok(state.with_depth(state.config.function_body_depth()))
        }
        LineCategory::BlockOpen => Ok(state.with_depth(depth + 1)),
        LineCategory::BlockClose if depth < 1 => mismatch(Closer::Block),
        LineCategory::BlockClose => Ok(state.with_depth(depth - 1)),
        LineCategory::TwoLevelOpen => Ok(state.with_depth(depth + 2)),
        LineCategory::TwoLevelClose if depth < 2 => mismatch(Closer::SelectCase),
        LineCategory::TwoLevelClose => Ok(state.with_depth(depth - 2)),
        LineCategory::ConditionalSingleLine => {
            Ok(state.with_context(ParseContext::ConditionalSingleLine))
        }
        LineCategory::ContinuationOpen => Ok(state.with_context(ParseContext::ContinuationOpen {
            buffered_line: line.clone(),
            is_in_sif: false,
        })),
        LineCategory::SkipBlockOpen => {
            Ok(state.with_context(ParseContext::Comment { is_in_sif: false }))
        }
        LineCategory::ContinuationClose => mismatch(Closer::Continuation),
        LineCategory::SkipBlockClose => mismatch(Closer::SkipBlock),
    }
}
