use std::fmt;

use crate::error::AppError;

/// Message returned to callers when no usable query text was supplied.
pub const QUERY_REQUIRED: &str = "Query is required";

/// A caller-supplied search query, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(QUERY_REQUIRED.to_string()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    /// Single-line preview for log fields.
    pub fn preview(&self, max_chars: usize) -> String {
        preview_text(&self.0, max_chars)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Truncates to `max_chars` characters and flattens newlines.
pub fn preview_text(text: &str, max_chars: usize) -> String {
    let preview: String = text.chars().take(max_chars).collect();
    preview.replace('\n', " ")
}
