#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]
//! Error types for the LSCL codec.
//!
//! Four kinds, all carrying positional detail where it makes sense:
//! [`LsclError::Decode`] (lexer/parser failures), [`LsclError::UnexpectedToken`]
//! (a `Decode` specialization that also names the offending token kind),
//! [`LsclError::StringRendering`] and [`LsclError::SelectorElementRendering`]
//! (renderer failures under a restrictive escape policy).

use lscl_token::TokenKind;
use thiserror::Error;

/// Failure produced by the lexer, parser, or renderer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LsclError {
    /// A lexer or parser failure not tied to a specific expected token.
    #[error("at line {line}, column {column}: {message}")]
    Decode {
        message: String,
        line: u32,
        column: u32,
        offset: usize,
    },

    /// The parser read a token that no grammar rule at that position accepts.
    #[error("at line {line}, column {column}: unexpected token {kind:?}")]
    UnexpectedToken {
        kind: TokenKind,
        line: u32,
        column: u32,
        offset: usize,
    },

    /// A string could not be rendered under the active escape policy.
    #[error("the following string could not be rendered: {string:?}")]
    StringRendering { string: String },

    /// A selector segment could not be rendered under the active
    /// field-reference escape style.
    #[error("the following selector could not be rendered: {selector_element:?}")]
    SelectorElementRendering { selector_element: String },
}

impl LsclError {
    /// Build a [`LsclError::Decode`] error.
    pub fn decode(message: impl Into<String>, line: u32, column: u32, offset: usize) -> Self {
        LsclError::Decode { message: message.into(), line, column, offset }
    }

    /// Build an [`LsclError::UnexpectedToken`] error from the offending token.
    pub fn unexpected_token(kind: TokenKind, line: u32, column: u32, offset: usize) -> Self {
        LsclError::UnexpectedToken { kind, line, column, offset }
    }

    /// Build a [`LsclError::StringRendering`] error.
    pub fn string_rendering(string: impl Into<String>) -> Self {
        LsclError::StringRendering { string: string.into() }
    }

    /// Build a [`LsclError::SelectorElementRendering`] error.
    pub fn selector_element_rendering(selector_element: impl Into<String>) -> Self {
        LsclError::SelectorElementRendering { selector_element: selector_element.into() }
    }

    /// The 1-based line this error occurred at, if it carries a position.
    pub fn line(&self) -> Option<u32> {
        match self {
            LsclError::Decode { line, .. } | LsclError::UnexpectedToken { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The 1-based column this error occurred at, if it carries a position.
    pub fn column(&self) -> Option<u32> {
        match self {
            LsclError::Decode { column, .. } | LsclError::UnexpectedToken { column, .. } => {
                Some(*column)
            }
            _ => None,
        }
    }

    /// The 0-based byte offset this error occurred at, if it carries one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            LsclError::Decode { offset, .. } | LsclError::UnexpectedToken { offset, .. } => {
                Some(*offset)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_message_matches_reference_format() {
        let err = LsclError::decode("unrecognized input near '@'", 2, 5, 10);
        assert_eq!(err.to_string(), "at line 2, column 5: unrecognized input near '@'");
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.column(), Some(5));
        assert_eq!(err.offset(), Some(10));
    }

    #[test]
    fn unexpected_token_carries_kind_and_position() {
        let err = LsclError::unexpected_token(TokenKind::RightBrace, 1, 1, 0);
        assert!(err.to_string().contains("RightBrace"));
        assert_eq!(err.offset(), Some(0));
    }

    #[test]
    fn rendering_errors_carry_no_position() {
        let err = LsclError::string_rendering("bad\0string");
        assert_eq!(err.line(), None);
        assert!(err.to_string().contains("bad"));

        let err = LsclError::selector_element_rendering("a,b");
        assert_eq!(err.offset(), None);
        assert!(err.to_string().contains("a,b"));
    }
}
