use std::sync::LazyLock;

use regex::Regex;

use crate::state::ParseContext;

/// The structural role a single line plays for indentation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineCategory {
    /// Blank or whitespace-only line.
    Empty,
    /// Any statement without structural meaning.
    Normal,
    /// A `;` line comment.
    Comment,
    /// `@NAME`, always placed at the function column.
    FunctionDeclaration,
    /// `IF`, `FOR`, `WHILE`, ... deepen the following lines.
    BlockOpen,
    /// `ENDIF`, `NEXT`, `WEND`, ... dedent from this line on.
    BlockClose,
    /// `ELSE`, `CASE`, `CATCH`, ... dedent only this line.
    BlockMid,
    /// `SELECTCASE`, a block whose body sits two levels deeper.
    TwoLevelOpen,
    /// `ENDSELECT`.
    TwoLevelClose,
    /// `SIF`, indents only the next statement.
    ConditionalSingleLine,
    /// A line ending with an unpaired `{`.
    ContinuationOpen,
    /// A line inside an open continuation.
    ContinuationBody,
    /// A line ending with an unpaired `}`.
    ContinuationClose,
    /// `[SKIPSTART]`.
    SkipBlockOpen,
    /// `[SKIPEND]`.
    SkipBlockClose,
}

// A keyword only counts when followed by whitespace, `;`, `(`, or the end of the line.
fn keyword_regex(pattern: &str) -> Regex {
    let source = format!(r"(?i)^(?:{pattern})(?:[\s;(]|$)");
    Regex::new(&source).unwrap_or_else(|err| panic!("invalid keyword table {pattern}: {err}"))
}

static BLOCK_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    keyword_regex(
        "DATALIST|DO|FOR|IF|NOSKIP|PRINTDATA(?:K|D)?(?:L|W)?|REPEAT|STRDATA\
         |TRY(?:CALL|GOTO|JUMP)LIST|TRYC(?:CALL|GOTO|JUMP)(?:FORM)?|WHILE",
    )
});
static BLOCK_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| keyword_regex("END(?:CATCH|DATA|FUNC|IF|LIST|NOSKIP)|LOOP|NEXT|REND|WEND"));
static BLOCK_MID: LazyLock<Regex> =
    LazyLock::new(|| keyword_regex("ELSE(?:IF)?|CASE(?:ELSE)?|CATCH"));
static TWO_LEVEL_OPEN: LazyLock<Regex> = LazyLock::new(|| keyword_regex("SELECTCASE"));
static TWO_LEVEL_CLOSE: LazyLock<Regex> = LazyLock::new(|| keyword_regex("ENDSELECT"));
static CONDITIONAL_SINGLE_LINE: LazyLock<Regex> = LazyLock::new(|| keyword_regex("SIF"));

const SKIP_START: &str = "[SKIPSTART]";
const SKIP_END: &str = "[SKIPEND]";

/// Prefixes that mark a line as commented out but conditionally live.
const LIVE_MARKERS: [&str; 2] = [";!;", ";#;"];

/// The statement text with leading whitespace and an optional live marker removed.
fn statement_body(text: &str) -> &str {
    let trimmed = text.trim_start();
    LIVE_MARKERS
        .iter()
        .find_map(|marker| trimmed.strip_prefix(marker))
        .map(str::trim_start)
        .unwrap_or(trimmed)
}

fn starts_with_ignore_case(body: &str, marker: &str) -> bool {
    body.get(..marker.len())
        .map(|head| head.eq_ignore_ascii_case(marker))
        .unwrap_or(false)
}

/// Net count of unescaped `{` over `}` on the line.
fn brace_balance(text: &str) -> isize {
    let mut balance = 0;
    let mut escaped = false;
    for ch in text.chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '{' => balance += 1,
            '}' => balance -= 1,
            _ => {}
        }
    }
    balance
}

/// Whether the line ends in `brace` and that brace is not paired on the same line.
///
/// `PRINTFORML {A}` ends in `}` but is an ordinary statement.
fn ends_with_unpaired(text: &str, brace: char) -> bool {
    let Some(rest) = text.trim_end().strip_suffix(brace) else {
        return false;
    };
    if rest.ends_with('\\') {
        return false;
    }
    let balance = brace_balance(text);
    if brace == '{' {
        balance > 0
    } else {
        balance < 0
    }
}

fn is_line_comment(body: &str) -> bool {
    body.starts_with(';') && !LIVE_MARKERS.iter().any(|marker| body.starts_with(marker))
}

fn is_function_declaration(body: &str) -> bool {
    body.strip_prefix('@')
        .and_then(|name| name.chars().next())
        .map(|ch| !ch.is_whitespace())
        .unwrap_or(false)
}

/// Classify a line without regard to the surrounding structure.
///
/// The checks run in a fixed priority order, so `IF X == {` is a block
/// opener rather than a continuation. A line comment never counts as a
/// brace line, so `; X = {` stays a comment.
pub fn classify(text: &str) -> LineCategory {
    let body = statement_body(text);
    let commented = is_line_comment(body);

    if BLOCK_OPEN.is_match(body) {
        LineCategory::BlockOpen
    } else if BLOCK_CLOSE.is_match(body) {
        LineCategory::BlockClose
    } else if BLOCK_MID.is_match(body) {
        LineCategory::BlockMid
    } else if TWO_LEVEL_OPEN.is_match(body) {
        LineCategory::TwoLevelOpen
    } else if TWO_LEVEL_CLOSE.is_match(body) {
        LineCategory::TwoLevelClose
    } else if CONDITIONAL_SINGLE_LINE.is_match(body) {
        LineCategory::ConditionalSingleLine
    } else if !commented && ends_with_unpaired(text, '{') {
        LineCategory::ContinuationOpen
    } else if !commented && ends_with_unpaired(text, '}') {
        LineCategory::ContinuationClose
    } else if starts_with_ignore_case(body, SKIP_START) {
        LineCategory::SkipBlockOpen
    } else if starts_with_ignore_case(body, SKIP_END) {
        LineCategory::SkipBlockClose
    } else if commented {
        LineCategory::Comment
    } else if is_function_declaration(body) {
        LineCategory::FunctionDeclaration
    } else if body.trim_end().is_empty() {
        LineCategory::Empty
    } else {
        LineCategory::Normal
    }
}

/// Classify a line given the structure it appears in.
///
/// Continuation bodies are opaque: only a closing brace is recognised there.
pub fn classify_in_context(text: &str, context: &ParseContext) -> LineCategory {
    let category = classify(text);
    match context {
        ParseContext::Continuation { .. } => match category {
            LineCategory::ContinuationClose => LineCategory::ContinuationClose,
            _ => LineCategory::ContinuationBody,
        },
        ParseContext::Normal
        | ParseContext::Comment { .. }
        | ParseContext::ContinuationOpen { .. }
        | ParseContext::ConditionalSingleLine => category,
    }
}
