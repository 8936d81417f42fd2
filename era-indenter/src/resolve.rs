use crate::classify::LineCategory;
use crate::config::IndenterConfig;
use crate::line::Line;
use crate::state::{IndentState, ParseContext};

/// A clamped indentation level to apply to one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentTarget {
    pub line: usize,
    pub level: usize,
}

/// The rewrites one processed line asks for.
///
/// Usually zero or one target for the line itself; a line that starts the
/// body of a continuation also places the buffered opening line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub targets: Vec<IndentTarget>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// The level for the line with `index`, if it is rewritten.
    pub fn level_of(&self, index: usize) -> Option<usize> {
        self.targets
            .iter()
            .find(|target| target.line == index)
            .map(|target| target.level)
    }
}

pub(crate) fn clamp_level(level: isize) -> usize {
    level.max(0).unsigned_abs()
}

/// Target indent of a line of `category` when ordinary statements sit at `baseline`.
///
/// `None` means the line keeps its current indentation.
pub fn indent_for(
    category: LineCategory,
    baseline: isize,
    config: &IndenterConfig,
) -> Option<isize> {
    match category {
        LineCategory::Empty => Some(0),
        LineCategory::Comment => config.indent_commented_lines.then_some(baseline),
        LineCategory::Normal
        | LineCategory::BlockOpen
        | LineCategory::TwoLevelOpen
        | LineCategory::ConditionalSingleLine => Some(baseline),
        LineCategory::FunctionDeclaration => Some(config.function_body_depth()),
        LineCategory::BlockClose | LineCategory::BlockMid => Some(baseline - 1),
        LineCategory::TwoLevelClose => Some(baseline - 2),
        LineCategory::SkipBlockOpen => Some(0),
        // Placed by the owning context once more of the construct is known.
        LineCategory::ContinuationOpen
        | LineCategory::ContinuationBody
        | LineCategory::ContinuationClose
        | LineCategory::SkipBlockClose => None,
    }
}

/// Unclamped target indent for the current line of `category` under `state`.
pub fn resolve(category: LineCategory, state: &IndentState) -> Option<isize> {
    let baseline = state.baseline();
    let config = &state.config;
    match &state.context {
        ParseContext::Normal | ParseContext::ConditionalSingleLine => {
            indent_for(category, baseline, config)
        }
        ParseContext::Comment { .. } => (category == LineCategory::SkipBlockClose).then_some(0),
        ParseContext::ContinuationOpen { .. } => match category {
            LineCategory::ContinuationClose => Some(baseline),
            _ => indent_for(category, baseline + 1, config),
        },
        ParseContext::Continuation { body_category, .. } => match category {
            LineCategory::ContinuationClose => indent_for(*body_category, baseline, config),
            _ => indent_for(*body_category, baseline + 2, config),
        },
    }
}

/// Every rewrite that processing `line` as `category` implies, clamped at zero.
pub fn resolve_line(line: &Line, category: LineCategory, state: &IndentState) -> Resolution {
    let mut targets = Vec::with_capacity(2);
    if let Some(level) = resolve(category, state) {
        targets.push(IndentTarget {
            line: line.index,
            level: clamp_level(level),
        });
    }

    // The opening line is settled by the first non-empty line after it.
    if let ParseContext::ContinuationOpen { buffered_line, .. } = &state.context {
        if category != LineCategory::Empty {
            targets.push(IndentTarget {
                line: buffered_line.index,
                level: clamp_level(state.baseline()),
            });
        }
    }

    Resolution { targets }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(depth: isize, context: ParseContext) -> IndentState {
        IndentState::new(IndenterConfig::default())
            .with_depth(depth)
            .with_context(context)
    }

    #[test]
    fn openers_keep_their_own_column() {
        let state = state_at(1, ParseContext::Normal);
        assert_eq!(resolve(LineCategory::BlockOpen, &state), Some(1));
        assert_eq!(resolve(LineCategory::TwoLevelOpen, &state), Some(1));
        assert_eq!(resolve(LineCategory::ConditionalSingleLine, &state), Some(1));
        assert_eq!(resolve(LineCategory::Normal, &state), Some(1));
    }

    #[test]
    fn closers_and_mids_step_back() {
        let state = state_at(3, ParseContext::Normal);
        assert_eq!(resolve(LineCategory::BlockClose, &state), Some(2));
        assert_eq!(resolve(LineCategory::BlockMid, &state), Some(2));
        assert_eq!(resolve(LineCategory::TwoLevelClose, &state), Some(1));
    }

    #[test]
    fn empty_lines_always_go_to_zero() {
        for context in [
            ParseContext::Normal,
            ParseContext::ConditionalSingleLine,
            ParseContext::ContinuationOpen {
                buffered_line: Line::new(0, "{"),
                is_in_sif: true,
            },
        ] {
            assert_eq!(resolve(LineCategory::Empty, &state_at(4, context)), Some(0));
        }
    }

    #[test]
    fn comments_follow_configuration() {
        let state = state_at(2, ParseContext::Normal);
        assert_eq!(resolve(LineCategory::Comment, &state), None);

        let config = IndenterConfig {
            indent_commented_lines: true,
            ..IndenterConfig::default()
        };
        let state = IndentState::new(config).with_depth(2);
        assert_eq!(resolve(LineCategory::Comment, &state), Some(2));
    }

    #[test]
    fn function_declarations_use_the_function_column() {
        let state = state_at(5, ParseContext::Normal);
        assert_eq!(resolve(LineCategory::FunctionDeclaration, &state), Some(0));

        let config = IndenterConfig {
            indent_inside_function_body: true,
            ..IndenterConfig::default()
        };
        let state = IndentState::new(config).with_depth(5);
        assert_eq!(resolve(LineCategory::FunctionDeclaration, &state), Some(1));
    }

    #[test]
    fn pending_sif_adds_a_level() {
        let state = state_at(1, ParseContext::ConditionalSingleLine);
        assert_eq!(resolve(LineCategory::Normal, &state), Some(2));
    }

    #[test]
    fn skip_block_contents_are_untouched() {
        let state = state_at(2, ParseContext::Comment { is_in_sif: false });
        assert_eq!(resolve(LineCategory::Normal, &state), None);
        assert_eq!(resolve(LineCategory::BlockClose, &state), None);
        assert_eq!(resolve(LineCategory::SkipBlockClose, &state), Some(0));
        assert_eq!(
            resolve(LineCategory::SkipBlockOpen, &state_at(2, ParseContext::Normal)),
            Some(0)
        );
    }

    #[test]
    fn continuation_body_follows_the_pinned_category() {
        let state = state_at(
            1,
            ParseContext::Continuation {
                body_category: LineCategory::BlockClose,
                is_in_sif: false,
            },
        );
        assert_eq!(resolve(LineCategory::ContinuationBody, &state), Some(2));
        assert_eq!(resolve(LineCategory::ContinuationClose, &state), Some(0));
    }

    #[test]
    fn first_body_line_places_the_opening_line() {
        let opening = Line::new(3, "X = {");
        let state = state_at(
            1,
            ParseContext::ContinuationOpen {
                buffered_line: opening,
                is_in_sif: false,
            },
        );

        let body = resolve_line(&Line::new(4, "1"), LineCategory::Normal, &state);
        assert_eq!(body.level_of(4), Some(2));
        assert_eq!(body.level_of(3), Some(1));

        let close = resolve_line(&Line::new(4, "}"), LineCategory::ContinuationClose, &state);
        assert_eq!(close.level_of(4), Some(1));
        assert_eq!(close.level_of(3), Some(1));

        let blank = resolve_line(&Line::new(4, ""), LineCategory::Empty, &state);
        assert_eq!(blank.level_of(4), Some(0));
        assert_eq!(blank.level_of(3), None);
    }

    #[test]
    fn negative_levels_are_clamped_per_line() {
        let state = state_at(-2, ParseContext::Normal);
        assert_eq!(resolve(LineCategory::BlockClose, &state), Some(-3));
        let resolution = resolve_line(&Line::new(0, "ENDIF"), LineCategory::BlockClose, &state);
        assert_eq!(resolution.level_of(0), Some(0));
    }
}
