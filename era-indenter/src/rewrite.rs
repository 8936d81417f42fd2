use crate::config::IndentUnit;

/// The leading whitespace for `level` indentation steps.
pub fn indent_string(unit: IndentUnit, level: usize) -> String {
    if unit.use_spaces {
        " ".repeat(unit.width * level)
    } else {
        "\t".repeat(level)
    }
}

/// Replace the leading whitespace of `text` with `level` indentation steps.
///
/// Trailing whitespace and the statement itself are left as written.
pub fn rewrite_line(text: &str, level: usize, unit: IndentUnit) -> String {
    let statement = text.trim_start();
    let mut buf = indent_string(unit, level);
    buf.push_str(statement);
    buf
}
