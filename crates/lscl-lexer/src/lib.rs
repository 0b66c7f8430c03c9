#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]
//! Regex-driven tokenizer for LSCL source text (§4.2).
//!
//! Tokenization is a single master pattern tried at each position, in
//! priority order: inline comments, selector elements, structural symbols,
//! quoted strings, regex patterns, numbers, barewords, and finally
//! digit-leading names. The first alternative that matches at the current
//! position wins; this mirrors the upstream treetop grammar's single
//! combined token rule rather than a conventional maximal-munch lexer with
//! independently-ordered sub-lexers.
//!
//! [`Lexer`] is an iterator, so callers can stop early without paying for
//! tokens they never look at. [`lex_from`] exposes the re-lexing entry
//! point a parser needs when it must treat a selector element's inner text
//! as an independent token stream (§9, "Selector re-lexing").

use lscl_error::LsclError;
use lscl_position::Position;
use lscl_token::{Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// The combined token pattern, anchored so every call matches only at the
/// start of whatever suffix of the source remains. Capture groups, in
/// order: comment, selector element, structural symbol, dquot, squot,
/// pattern, number, bareword, digit-bareword.
static TOKEN_PATTERN: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        ^(?:
            (\#[^\n]*)
            |\[([^\[\],]+)\]
            |(=>|==|!=|<=|>=|<|>|=~|!~|\{|\}|\[|\]|\(|\)|!|,)
            |"((?:\\.|[^"])*)"
            |'((?:\\.|[^'])*)'
            |/((?:\\.|[^/])*)/
            |(-?[0-9]+(?:\.[0-9]*)?)
            |([A-Za-z_][A-Za-z0-9_]+)
            |([A-Za-z0-9_-]+)
        )"#,
    )
});

/// An escape map matching `elastic/logstash`'s `string_escape.rb`:
/// `\x` for any other `x` decodes to the literal two characters `\x`.
fn unescape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some(next) => {
                let mapped = match next {
                    '"' => Some('"'),
                    '\'' => Some('\''),
                    '\\' => Some('\\'),
                    'n' => Some('\n'),
                    'r' => Some('\r'),
                    't' => Some('\t'),
                    '0' => Some('\0'),
                    _ => None,
                };
                chars.next();
                match mapped {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Only `\/` is unescaped to `/`; every other `\x` sequence (including the
/// backslash) is preserved verbatim so the regex engine can interpret it.
fn unescape_pattern(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'/') {
            chars.next();
            out.push('/');
        } else {
            out.push(c);
        }
    }
    out
}

/// Up to the first 27 characters of `remaining`, with a trailing `...`
/// marker if more was cut off, for use in "unrecognized input" messages.
fn preview(remaining: &str) -> String {
    const MAX_CHARS: usize = 27;
    let mut end = remaining.len();
    let mut truncated = false;
    for (count, (idx, ch)) in remaining.char_indices().enumerate() {
        if count == MAX_CHARS {
            end = idx;
            truncated = true;
            break;
        }
        let _ = ch;
    }
    let mut out = remaining[..end].to_string();
    if truncated {
        out.push_str("...");
    }
    out
}

fn symbol_kind(text: &str) -> Option<TokenKind> {
    Some(match text {
        "=>" => TokenKind::FatArrow,
        "==" => TokenKind::EqualEqual,
        "!=" => TokenKind::NotEqual,
        "<=" => TokenKind::LessEqual,
        ">=" => TokenKind::GreaterEqual,
        "<" => TokenKind::Less,
        ">" => TokenKind::Greater,
        "=~" => TokenKind::Match,
        "!~" => TokenKind::NotMatch,
        "{" => TokenKind::LeftBrace,
        "}" => TokenKind::RightBrace,
        "[" => TokenKind::LeftBracket,
        "]" => TokenKind::RightBracket,
        "(" => TokenKind::LeftParen,
        ")" => TokenKind::RightParen,
        "!" => TokenKind::Bang,
        "," => TokenKind::Comma,
        _ => return None,
    })
}

/// A lazy stream of [`Token`]s over a source string, ending in exactly one
/// [`TokenKind::End`].
pub struct Lexer<'a> {
    remaining: &'a str,
    position: Position,
    done: bool,
}

impl<'a> Lexer<'a> {
    /// Start tokenizing `source` from the beginning.
    pub fn new(source: &'a str) -> Self {
        tracing::trace!(len = source.len(), "starting lexer");
        Lexer { remaining: source, position: Position::start(), done: false }
    }

    /// Start tokenizing `source` as though it began at `start` — used to
    /// re-lex a selector element's inner text in place (§9).
    pub fn from_position(source: &'a str, start: Position) -> Self {
        tracing::trace!(len = source.len(), line = start.line, column = start.column, "re-lexing from position");
        Lexer { remaining: source, position: start, done: false }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LsclError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let stripped = self.remaining.trim_start();
            let skipped_len = self.remaining.len() - stripped.len();
            let skipped = &self.remaining[..skipped_len];
            self.position.advance_str(skipped);
            self.remaining = stripped;

            if self.remaining.is_empty() {
                self.done = true;
                let pos = self.position;
                return Some(Ok(Token::new(
                    TokenKind::End,
                    "",
                    pos.offset,
                    pos.offset,
                    pos.line,
                    pos.column,
                )));
            }

            let pattern = match TOKEN_PATTERN.as_ref() {
                Ok(pattern) => pattern,
                Err(err) => {
                    self.done = true;
                    let pos = self.position;
                    return Some(Err(LsclError::decode(
                        format!("internal: invalid token pattern: {err}"),
                        pos.line,
                        pos.column,
                        pos.offset,
                    )));
                }
            };

            let caps = match pattern.captures(self.remaining) {
                Some(caps) => caps,
                None => {
                    self.done = true;
                    let pos = self.position;
                    return Some(Err(LsclError::decode(
                        format!("unrecognized input near {:?}", preview(self.remaining)),
                        pos.line,
                        pos.column,
                        pos.offset,
                    )));
                }
            };

            let whole = caps.get(0).map(|m| m.as_str()).unwrap_or("");
            let start_pos = self.position;
            self.position.advance_str(whole);
            self.remaining = &self.remaining[whole.len()..];

            if caps.get(1).is_some() {
                // Inline comment: discarded, keep looking for a real token.
                continue;
            }

            let token = if let Some(m) = caps.get(2) {
                Token::new(
                    TokenKind::SelectorElement,
                    m.as_str(),
                    start_pos.offset,
                    self.position.offset,
                    start_pos.line,
                    start_pos.column,
                )
            } else if let Some(m) = caps.get(3) {
                let kind = match symbol_kind(m.as_str()) {
                    Some(kind) => kind,
                    None => {
                        self.done = true;
                        return Some(Err(LsclError::decode(
                            format!("internal: unrecognized structural symbol {:?}", m.as_str()),
                            start_pos.line,
                            start_pos.column,
                            start_pos.offset,
                        )));
                    }
                };
                Token::new(kind, m.as_str(), start_pos.offset, self.position.offset, start_pos.line, start_pos.column)
            } else if let Some(m) = caps.get(4) {
                Token::new(
                    TokenKind::Dquot,
                    unescape_string(m.as_str()),
                    start_pos.offset,
                    self.position.offset,
                    start_pos.line,
                    start_pos.column,
                )
            } else if let Some(m) = caps.get(5) {
                Token::new(
                    TokenKind::Squot,
                    unescape_string(m.as_str()),
                    start_pos.offset,
                    self.position.offset,
                    start_pos.line,
                    start_pos.column,
                )
            } else if let Some(m) = caps.get(6) {
                Token::new(
                    TokenKind::Pattern,
                    unescape_pattern(m.as_str()),
                    start_pos.offset,
                    self.position.offset,
                    start_pos.line,
                    start_pos.column,
                )
            } else if let Some(m) = caps.get(7) {
                Token::new(
                    TokenKind::Number,
                    m.as_str(),
                    start_pos.offset,
                    self.position.offset,
                    start_pos.line,
                    start_pos.column,
                )
            } else if let Some(m) = caps.get(8) {
                let kind = TokenKind::keyword_for(m.as_str()).unwrap_or(TokenKind::Bareword);
                Token::new(kind, m.as_str(), start_pos.offset, self.position.offset, start_pos.line, start_pos.column)
            } else if let Some(m) = caps.get(9) {
                Token::new(
                    TokenKind::DigitBareword,
                    m.as_str(),
                    start_pos.offset,
                    self.position.offset,
                    start_pos.line,
                    start_pos.column,
                )
            } else {
                self.done = true;
                return Some(Err(LsclError::decode(
                    "internal: token pattern matched with no recognized group",
                    start_pos.line,
                    start_pos.column,
                    start_pos.offset,
                )));
            };

            return Some(Ok(token));
        }
    }
}

/// Tokenize `source` from its beginning.
pub fn lex(source: &str) -> Lexer<'_> {
    Lexer::new(source)
}

/// Tokenize `source` as though it began at `start` (selector re-lexing, §9).
pub fn lex_from(source: &str, start: Position) -> Lexer<'_> {
    Lexer::from_position(source, start)
}
