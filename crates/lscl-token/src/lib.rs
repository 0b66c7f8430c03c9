//! LSCL token definitions shared by the lexer and parser.

use std::sync::Arc;

/// Token produced by the lexer and consumed by the parser.
///
/// The text is kept in an `Arc<str>` so buffering and lookahead can clone
/// tokens cheaply.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text the token was matched from (for `DQUOT`/`SQUOT`/
    /// `PATTERN` this is the raw, still-escaped payload between delimiters;
    /// for `NUMBER` this is the raw lexeme, used verbatim when a number
    /// appears where a name is required).
    pub text: Arc<str>,
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        text: impl Into<Arc<str>>,
        start: usize,
        end: usize,
        line: u32,
        column: u32,
    ) -> Self {
        Token { kind, text: text.into(), start, end, line, column }
    }
}

/// Token classification for LSCL parsing (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // ===== Keywords (lexed as simple tokens, never identifiers) =====
    If,
    Else,
    In,
    Not,
    And,
    Or,
    Xor,
    Nand,

    // ===== Structural symbols =====
    FatArrow,
    EqualEqual,
    NotEqual,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
    Match,
    NotMatch,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Bang,
    Comma,

    /// `\[([^\[\],]+)\]` — inner text is the verbatim, untrimmed payload.
    SelectorElement,
    /// Double-quoted string; `text` is unescaped per the string-escape rules.
    Dquot,
    /// Single-quoted string; `text` is unescaped per the string-escape rules.
    Squot,
    /// `/.../`; `text` is unescaped per the pattern-escape rules.
    Pattern,
    /// Optional `-`, digits, optional `.` + digits. `text` is the raw lexeme.
    Number,
    /// `[A-Za-z_][A-Za-z0-9_]+` — at least two characters; a lone
    /// letter/underscore falls through to `DigitBareword` instead.
    Bareword,
    /// `[A-Za-z0-9_-]+` starting with a digit — a name token, not a value.
    DigitBareword,
    /// Synthetic end-of-input sentinel.
    End,
}

impl TokenKind {
    /// The keyword this bareword text denotes, if any (§4.2, boundary law:
    /// a bareword `if`/`else`/`and`/`or`/`xor`/`nand`/`in`/`not` never
    /// lexes as `BAREWORD`).
    pub fn keyword_for(word: &str) -> Option<TokenKind> {
        Some(match word {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "in" => TokenKind::In,
            "not" => TokenKind::Not,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "xor" => TokenKind::Xor,
            "nand" => TokenKind::Nand,
            _ => return None,
        })
    }

    /// Whether this token kind is one of the four logical connectives.
    pub fn is_connective(self) -> bool {
        matches!(self, TokenKind::And | TokenKind::Or | TokenKind::Xor | TokenKind::Nand)
    }
}
