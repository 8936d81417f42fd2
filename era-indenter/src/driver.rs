use std::ops::Range;

use tracing::{debug, trace};

use crate::classify::classify_in_context;
use crate::config::IndenterConfig;
use crate::error::FormatError;
use crate::line::{split_lines, Line};
use crate::predict::{predict_next_line, NewLinePrediction};
use crate::resolve::resolve_line;
use crate::rewrite::rewrite_line;
use crate::state::{IndentState, ParseContext};
use crate::transition::{recover, transition};

/// Replacement text for one whole line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    pub line: usize,
    pub text: String,
}

/// The result of one pass: line rewrites ordered by line, and rejected lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOutcome {
    pub edits: Vec<LineEdit>,
    pub errors: Vec<FormatError>,
}

impl FormatOutcome {
    /// Apply the edits to `source`, keeping its line terminator style.
    pub fn apply_to(&self, source: &str) -> String {
        let mut lines: Vec<&str> = source.lines().collect();
        for edit in &self.edits {
            if let Some(slot) = lines.get_mut(edit.line) {
                *slot = edit.text.as_str();
            }
        }

        let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
        let mut output = lines.join(newline);
        if source.ends_with('\n') {
            output.push_str(newline);
        }
        output
    }
}

/// A formatted document together with the lines that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedSource {
    pub text: String,
    pub errors: Vec<FormatError>,
}

/// Incremental indenter for one document.
///
/// Lines must be fed strictly in document order starting at line 0. The
/// state before the most recent successful update is kept for
/// [`Indenter::next_line`].
#[derive(Debug, Clone)]
pub struct Indenter {
    state: IndentState,
    previous: IndentState,
}

impl Indenter {
    pub fn new(config: IndenterConfig) -> Self {
        let state = IndentState::new(config);
        Self {
            previous: state.clone(),
            state,
        }
    }

    pub fn state(&self) -> &IndentState {
        &self.state
    }

    pub fn previous(&self) -> &IndentState {
        &self.previous
    }

    /// Process the next line, returning the rewrites whose text actually changes.
    ///
    /// On error nothing is rewritten and neither state moves, except that a
    /// rejected closing `}` still ends its continuation.
    pub fn update(&mut self, line: &Line) -> Result<Vec<LineEdit>, FormatError> {
        let category = classify_in_context(&line.text, &self.state.context);
        let resolution = resolve_line(line, category, &self.state);
        let next = match transition(line, category, &self.state) {
            Ok(next) => next,
            Err(err) => {
                if let Some(resumed) = recover(category, &self.state) {
                    self.previous = std::mem::replace(&mut self.state, resumed);
                }
                return Err(err);
            }
        };

        trace!(
            line = line.index,
            ?category,
            depth = next.indent_depth,
            context = ?next.context,
            "indented line"
        );

        let edits = resolution
            .targets
            .iter()
            .filter_map(|target| {
                let original = self.source_text(line, target.line)?;
                let text = rewrite_line(original, target.level, self.state.config.indent_unit);
                (text != original).then_some(LineEdit {
                    line: target.line,
                    text,
                })
            })
            .collect();

        self.previous = std::mem::replace(&mut self.state, next);
        Ok(edits)
    }

    /// The text of a line a resolution may target: the current one or the buffered opener.
    fn source_text<'a>(&'a self, current: &'a Line, index: usize) -> Option<&'a str> {
        if current.index == index {
            return Some(current.text.as_str());
        }
        match &self.state.context {
            ParseContext::ContinuationOpen { buffered_line, .. } if buffered_line.index == index => {
                Some(buffered_line.text.as_str())
            }
            _ => None,
        }
    }

    /// Replay `lines` up to `range.end`, keeping edits that fall inside `range`.
    ///
    /// Every line before `range.start` is still processed because depth and
    /// context accumulate from the top of the document.
    pub fn format(&mut self, lines: &[Line], range: Range<usize>) -> FormatOutcome {
        let mut outcome = FormatOutcome::default();

        for line in lines.iter().take_while(|line| line.index < range.end) {
            match self.update(line) {
                Ok(edits) => outcome
                    .edits
                    .extend(edits.into_iter().filter(|edit| range.contains(&edit.line))),
                Err(err) => {
                    debug!(line = err.line, error = %err.kind, "line left as written");
                    outcome.errors.push(err);
                }
            }
        }

        outcome.edits.sort_by_key(|edit| edit.line);
        outcome
    }

    /// Indentation for a line the user is creating.
    ///
    /// Hosts replay through the freshly inserted empty line before asking, so
    /// the prediction is made from the state that line started from.
    pub fn next_line(&self) -> Option<NewLinePrediction> {
        predict_next_line(&self.previous)
    }
}

/// Format the lines in `range`. Lines before it are replayed but not rewritten.
pub fn format_lines(lines: &[Line], config: &IndenterConfig, range: Range<usize>) -> FormatOutcome {
    Indenter::new(*config).format(lines, range)
}

/// Format every line of a document.
pub fn format_document(lines: &[Line], config: &IndenterConfig) -> FormatOutcome {
    let end = lines.last().map(|line| line.index + 1).unwrap_or(0);
    format_lines(lines, config, 0..end)
}

/// Format a whole script given as text.
pub fn format_source(input: &str, config: &IndenterConfig) -> FormattedSource {
    let outcome = format_document(&split_lines(input), config);
    FormattedSource {
        text: outcome.apply_to(input),
        errors: outcome.errors,
    }
}
