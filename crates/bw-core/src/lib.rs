//! Shared primitives used across Boxwood crates.

use core::fmt;

/// Result alias used across the workspace.
pub type EngineResult<T> = Result<T, EngineError>;

/// Error raised by any pipeline stage.
///
/// `code` is a stable dotted identifier (`html.tokenizer.unexpected_character`,
/// `net.http.chunk_size_invalid`, ...) that callers and tests match on; the
/// message is for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub code: &'static str,
    pub message: String,
}

impl EngineError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Returns true when the error was raised by the stage owning `prefix`
    /// (for example `"html."` or `"net.http."`).
    pub fn is_from(&self, prefix: &str) -> bool {
        self.code.starts_with(prefix)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::EngineError;

    #[test]
    fn display_includes_code_and_message() {
        let error = EngineError::new("html.tree.unbalanced_end_tag", "stray `</div>`");
        assert_eq!(error.to_string(), "html.tree.unbalanced_end_tag: stray `</div>`");
    }

    #[test]
    fn matches_stage_prefix() {
        let error = EngineError::new("net.http.chunk_size_invalid", "bad size");
        assert!(error.is_from("net."));
        assert!(error.is_from("net.http."));
        assert!(!error.is_from("html."));
    }
}
