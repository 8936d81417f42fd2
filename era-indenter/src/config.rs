//! Indenter configuration.

use serde::Deserialize;
use thiserror::Error;

/// Failure to load an [`IndenterConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid indenter configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("indent width must be at least 1")]
    ZeroWidth,
}

/// The literal text inserted per indentation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndentUnit {
    /// Number of spaces per level, or the display width of a tab.
    pub width: usize,
    /// Indent with `width` spaces instead of one tab per level.
    pub use_spaces: bool,
}

impl IndentUnit {
    pub fn spaces(width: usize) -> Self {
        Self {
            width,
            use_spaces: true,
        }
    }

    pub fn tabs() -> Self {
        Self {
            width: 4,
            use_spaces: false,
        }
    }
}

impl Default for IndentUnit {
    fn default() -> Self {
        Self::spaces(4)
    }
}

/// Options recognised by the indenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndenterConfig {
    pub indent_unit: IndentUnit,
    /// Re-indent `;` comment lines instead of leaving them as written.
    #[serde(alias = "indentCommentRow")]
    pub indent_commented_lines: bool,
    /// Start the body of a function declaration at depth 1.
    #[serde(alias = "indentInsideOfFunction")]
    pub indent_inside_function_body: bool,
}

impl IndenterConfig {
    /// Parse a JSON configuration document. Missing keys keep their defaults.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()
    }

    /// Build a configuration from an already parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.indent_unit.width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        Ok(self)
    }

    pub fn with_indent_unit(self, indent_unit: IndentUnit) -> Self {
        Self {
            indent_unit,
            ..self
        }
    }

    /// The depth a function body starts at.
    pub(crate) fn function_body_depth(&self) -> isize {
        if self.indent_inside_function_body {
            1
        } else {
            0
        }
    }
}
