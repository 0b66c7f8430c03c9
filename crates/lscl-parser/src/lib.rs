#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]
//! Recursive-descent parser for LSCL source text (§4.3).
//!
//! The parser consumes the token stream produced by [`lscl_lexer`] and
//! builds the [`lscl_ast::Content`] tree. Grammar violations fail with
//! [`LsclError::UnexpectedToken`]; an input that runs past
//! [`ParseOptions::max_depth`] levels of nesting fails with
//! [`LsclError::Decode`] instead of overflowing the stack.
//!
//! The trickiest corner is condition parsing (§4.3.3): LSCL conditions have
//! no operator precedence, only a left-to-right accumulation rule with
//! "same connective extends, different connective wraps". The upstream
//! Python reference implements that rule with a variable-aliasing bug that
//! produces a self-referential accumulator (see `DESIGN.md`); this parser
//! reproduces the rule's *observable* result (verified against the
//! reference test suite) without the aliasing, since Rust's ownership model
//! has no way to express a condition node that contains itself.

use indexmap::IndexMap;
use lscl_ast::{
    Attribute, Block, ComparisonOp, Condition, Conditions, Content, ContentItem, ConnectiveOp,
    Data, Decimal, MatchOp, MembershipOp, MethodCall, Pattern, RValue, Selector,
};
use lscl_error::LsclError;
use lscl_position::Position;
use lscl_token::{Token, TokenKind};

/// Options controlling grammar tolerance and recursion limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Permit a terminal `,` before `)`, `]`, or (data context) `}` in
    /// lists, mappings, and method-call argument lists. Default: reject.
    pub accept_trailing_commas: bool,
    /// Maximum nesting depth (blocks, conditions, lists, mappings, nested
    /// parens) before parsing fails with a `Decode` error rather than
    /// recursing further. Matches the teacher's `ParseBudget` default.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { accept_trailing_commas: false, max_depth: 256 }
    }
}

/// Parse `source` into [`Content`] (§4.3, §6 `parse`).
pub fn parse(source: &str, options: ParseOptions) -> Result<Content, LsclError> {
    tracing::debug!(len = source.len(), "parsing LSCL source");
    let tokens = collect_tokens(lscl_lexer::lex(source))?;
    let mut parser = Parser { tokens, pos: 0, options, depth: 0 };
    parser.parse_content(TokenKind::End)
}

fn collect_tokens(lexer: impl Iterator<Item = Result<Token, LsclError>>) -> Result<Vec<Token>, LsclError> {
    lexer.collect()
}

fn unexpected(token: &Token) -> LsclError {
    LsclError::unexpected_token(token.kind, token.line, token.column, token.start)
}

fn trailing_comma_error(token: &Token) -> LsclError {
    LsclError::decode("Trailing commas have been disabled.", token.line, token.column, token.start)
}

enum NumberValue {
    Integer(i64),
    Decimal(String),
}

fn classify_number(token: &Token) -> Result<NumberValue, LsclError> {
    if token.text.contains('.') {
        Ok(NumberValue::Decimal(token.text.to_string()))
    } else {
        token
            .text
            .parse::<i64>()
            .map(NumberValue::Integer)
            .map_err(|_| LsclError::decode(
                format!("integer literal out of range: {}", token.text),
                token.line,
                token.column,
                token.start,
            ))
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    options: ParseOptions,
    depth: usize,
}

impl Parser {
    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn putback(&mut self) {
        debug_assert!(self.pos > 0, "putback with nothing consumed");
        self.pos -= 1;
    }

    fn enter(&mut self) -> Result<(), LsclError> {
        if self.depth >= self.options.max_depth {
            let token = &self.tokens[self.pos];
            return Err(LsclError::decode(
                format!("maximum nesting depth of {} exceeded", self.options.max_depth),
                token.line,
                token.column,
                token.start,
            ));
        }
        self.depth += 1;
        if self.depth % 16 == 0 {
            tracing::trace!(depth = self.depth, max_depth = self.options.max_depth, "nesting depth milestone");
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // --- §4.3.1 Content parsing ---

    fn parse_content(&mut self, end: TokenKind) -> Result<Content, LsclError> {
        self.enter()?;
        let mut content = Content::new();
        let mut token = self.bump();

        while token.kind != end {
            if token.kind == TokenKind::If {
                let initial_condition = self.parse_condition(TokenKind::LeftBrace)?;
                let mut branches =
                    vec![(initial_condition, self.parse_content(TokenKind::RightBrace)?)];
                let mut default = None;

                loop {
                    let maybe_else = self.bump();
                    if maybe_else.kind != TokenKind::Else {
                        token = maybe_else;
                        break;
                    }

                    let branch_kind = self.bump();
                    if branch_kind.kind == TokenKind::LeftBrace {
                        default = Some(self.parse_content(TokenKind::RightBrace)?);
                        token = self.bump();
                        break;
                    } else if branch_kind.kind == TokenKind::If {
                        let other_condition = self.parse_condition(TokenKind::LeftBrace)?;
                        let body = self.parse_content(TokenKind::RightBrace)?;
                        branches.push((other_condition, body));
                    } else {
                        return Err(unexpected(&branch_kind));
                    }
                }

                content.push(ContentItem::Conditions(Conditions { branches, default }));
                continue;
            }

            let name = match token.kind {
                TokenKind::Number | TokenKind::Bareword | TokenKind::DigitBareword => {
                    token.text.to_string()
                }
                _ => return Err(unexpected(&token)),
            };

            let op_token = self.bump();
            match op_token.kind {
                TokenKind::LeftBrace => {
                    let body = self.parse_content(TokenKind::RightBrace)?;
                    content.push(ContentItem::Block(Block { name, content: body }));
                }
                TokenKind::FatArrow => {
                    let data = self.parse_data()?;
                    content.push(ContentItem::Attribute(Attribute { name, content: data }));
                }
                _ => return Err(unexpected(&op_token)),
            }

            token = self.bump();
        }

        self.leave();
        Ok(content)
    }

    // --- §4.3.2 Data parsing ---

    fn parse_data(&mut self) -> Result<Data, LsclError> {
        let token = self.bump();
        match token.kind {
            TokenKind::Bareword | TokenKind::Squot | TokenKind::Dquot => {
                Ok(Data::String(token.text.to_string()))
            }
            TokenKind::Number => match classify_number(&token)? {
                NumberValue::Integer(v) => Ok(Data::Integer(v)),
                NumberValue::Decimal(raw) => Ok(Data::Decimal(Decimal::new(raw))),
            },
            TokenKind::SelectorElement => {
                // Re-lex the bracket contents as an independent token stream,
                // starting one column/byte past the opening `[` (§9).
                let start = Position::new(token.line, token.column + 1, token.start + 1);
                let inner_tokens = collect_tokens(lscl_lexer::lex_from(&token.text, start))?;
                let mut inner = Parser { tokens: inner_tokens, pos: 0, options: self.options, depth: self.depth };
                let value = inner.parse_data()?;
                Ok(Data::List(vec![value]))
            }
            TokenKind::LeftBracket => self.parse_data_list(),
            TokenKind::LeftBrace => self.parse_data_mapping(),
            _ => Err(unexpected(&token)),
        }
    }

    fn parse_data_list(&mut self) -> Result<Data, LsclError> {
        self.enter()?;
        let items = self.parse_comma_separated(TokenKind::RightBracket, Self::parse_data)?;
        self.leave();
        Ok(Data::List(items))
    }

    fn parse_data_mapping(&mut self) -> Result<Data, LsclError> {
        self.enter()?;
        let mut map = IndexMap::new();
        loop {
            let token = self.bump();
            if token.kind == TokenKind::RightBrace {
                break;
            }

            let key = match token.kind {
                TokenKind::SelectorElement
                | TokenKind::Dquot
                | TokenKind::Squot
                | TokenKind::Pattern
                | TokenKind::Bareword
                | TokenKind::DigitBareword => token.text.to_string(),
                _ => return Err(unexpected(&token)),
            };

            let fat_arrow = self.bump();
            if fat_arrow.kind != TokenKind::FatArrow {
                return Err(unexpected(&fat_arrow));
            }

            let value = self.parse_data()?;
            // Duplicate keys silently overwrite (last-wins, §9).
            map.insert(key, value);
        }
        self.leave();
        Ok(Data::Mapping(map))
    }

    /// Shared comma-separated-list helper for `[...]` in both data and
    /// rvalue contexts (§4.3.2/§4.3.4 both delegate list elements to
    /// `parse_data`).
    fn parse_comma_separated<T>(
        &mut self,
        end: TokenKind,
        mut parse_one: impl FnMut(&mut Self) -> Result<T, LsclError>,
    ) -> Result<Vec<T>, LsclError> {
        let mut items = Vec::new();
        let mut count = 0usize;
        loop {
            let token = self.bump();
            if token.kind == end {
                if !self.options.accept_trailing_commas && count > 0 {
                    return Err(trailing_comma_error(&token));
                }
                break;
            }

            self.putback();
            items.push(parse_one(self)?);
            count += 1;

            let token = self.bump();
            if token.kind == end {
                break;
            }
            if token.kind == TokenKind::Comma {
                continue;
            }
            return Err(unexpected(&token));
        }
        Ok(items)
    }

    // --- §4.3.4 RValue parsing ---

    fn parse_rvalue(&mut self) -> Result<RValue, LsclError> {
        let token = self.bump();
        match token.kind {
            TokenKind::Squot | TokenKind::Dquot => Ok(RValue::String(token.text.to_string())),
            TokenKind::Pattern => Ok(RValue::Pattern(Pattern::new(token.text.to_string()))),
            TokenKind::Number => match classify_number(&token)? {
                NumberValue::Integer(v) => Ok(RValue::Integer(v)),
                NumberValue::Decimal(raw) => Ok(RValue::Decimal(Decimal::new(raw))),
            },
            TokenKind::SelectorElement => {
                let mut names = vec![token.text.to_string()];
                while self.peek().kind == TokenKind::SelectorElement {
                    names.push(self.bump().text.to_string());
                }
                Ok(RValue::Selector(Selector::new(names)))
            }
            TokenKind::LeftBracket => {
                self.enter()?;
                let items = self.parse_comma_separated(TokenKind::RightBracket, Self::parse_data)?;
                self.leave();
                Ok(RValue::List(items))
            }
            TokenKind::Bareword => {
                let name = token.text.to_string();
                let left_paren = self.bump();
                if left_paren.kind != TokenKind::LeftParen {
                    return Err(unexpected(&left_paren));
                }
                self.enter()?;
                let params = self.parse_comma_separated(TokenKind::RightParen, Self::parse_rvalue)?;
                self.leave();
                Ok(RValue::MethodCall(MethodCall { name, params }))
            }
            _ => Err(unexpected(&token)),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    // --- §4.3.3 Condition parsing ---

    /// Parse a condition terminated by `end` (consuming the terminator).
    ///
    /// The LSCL condition grammar has no operator precedence: a run of
    /// same-connective atoms extends one accumulator; a differing
    /// connective wraps the accumulator so far as the first child of a new
    /// one (§9, "Selector re-lexing" design note covers the similarly
    /// quirky sibling rule; this one is documented in §4.3.3 and verified
    /// by scenario S7 in spec.md).
    fn parse_condition(&mut self, end: TokenKind) -> Result<Condition, LsclError> {
        self.enter()?;
        let mut current: Option<(ConnectiveOp, Vec<Condition>)> = None;

        let result = loop {
            let (atom, after) = self.parse_condition_atom()?;
            if let Some((_, conds)) = current.as_mut() {
                conds.push(atom.clone());
            }

            if after.kind == end {
                break match current.take() {
                    Some((op, conds)) => Condition::connective(op, conds),
                    None => atom,
                };
            }

            let connective = match after.kind {
                TokenKind::And => ConnectiveOp::And,
                TokenKind::Or => ConnectiveOp::Or,
                TokenKind::Xor => ConnectiveOp::Xor,
                TokenKind::Nand => ConnectiveOp::Nand,
                _ => return Err(unexpected(&after)),
            };

            current = match current.take() {
                None => Some((connective, vec![atom])),
                Some((op, conds)) if op == connective => Some((op, conds)),
                Some((op, conds)) => {
                    let wrapped = Condition::connective(op, conds);
                    Some((connective, vec![wrapped]))
                }
            };
        };

        self.leave();
        Ok(result)
    }

    /// Parse one condition atom (everything that can stand between two
    /// connectives), returning it along with the first token after it.
    fn parse_condition_atom(&mut self) -> Result<(Condition, Token), LsclError> {
        let token = self.bump();

        if token.kind == TokenKind::Bang {
            let inner_start = self.bump();
            return match inner_start.kind {
                TokenKind::LeftParen => {
                    let inner = self.parse_condition(TokenKind::RightParen)?;
                    let after = self.bump();
                    Ok((Condition::Not(Box::new(inner)), after))
                }
                TokenKind::SelectorElement => {
                    let mut names = vec![inner_start.text.to_string()];
                    while self.peek().kind == TokenKind::SelectorElement {
                        names.push(self.bump().text.to_string());
                    }
                    let after = self.bump();
                    let selector = Condition::RValue(RValue::Selector(Selector::new(names)));
                    Ok((Condition::Not(Box::new(selector)), after))
                }
                _ => Err(unexpected(&inner_start)),
            };
        }

        if token.kind == TokenKind::LeftParen {
            let inner = self.parse_condition(TokenKind::RightParen)?;
            let after = self.bump();
            return Ok((inner, after));
        }

        self.putback();
        let first = self.parse_rvalue()?;
        let op_token = self.bump();

        let (condition, after) = match op_token.kind {
            TokenKind::In => {
                let second = self.parse_rvalue()?;
                (Condition::Membership(MembershipOp::In, first, second), self.bump())
            }
            TokenKind::Not => {
                let in_token = self.bump();
                if in_token.kind != TokenKind::In {
                    return Err(unexpected(&in_token));
                }
                let second = self.parse_rvalue()?;
                (Condition::Membership(MembershipOp::NotIn, first, second), self.bump())
            }
            TokenKind::EqualEqual => {
                let second = self.parse_rvalue()?;
                (Condition::Comparison(ComparisonOp::Eq, first, second), self.bump())
            }
            TokenKind::NotEqual => {
                let second = self.parse_rvalue()?;
                (Condition::Comparison(ComparisonOp::NotEq, first, second), self.bump())
            }
            TokenKind::LessEqual => {
                let second = self.parse_rvalue()?;
                (Condition::Comparison(ComparisonOp::Lte, first, second), self.bump())
            }
            TokenKind::GreaterEqual => {
                let second = self.parse_rvalue()?;
                (Condition::Comparison(ComparisonOp::Gte, first, second), self.bump())
            }
            TokenKind::Less => {
                let second = self.parse_rvalue()?;
                (Condition::Comparison(ComparisonOp::Lt, first, second), self.bump())
            }
            TokenKind::Greater => {
                let second = self.parse_rvalue()?;
                (Condition::Comparison(ComparisonOp::Gt, first, second), self.bump())
            }
            TokenKind::Match => {
                let pattern_token = self.bump();
                let pattern = match pattern_token.kind {
                    TokenKind::Squot | TokenKind::Dquot | TokenKind::Pattern => {
                        Pattern::new(pattern_token.text.to_string())
                    }
                    _ => return Err(unexpected(&pattern_token)),
                };
                (Condition::Match(MatchOp::Match, first, pattern), self.bump())
            }
            TokenKind::NotMatch => {
                let pattern_token = self.bump();
                let pattern = match pattern_token.kind {
                    TokenKind::Squot | TokenKind::Dquot | TokenKind::Pattern => {
                        Pattern::new(pattern_token.text.to_string())
                    }
                    _ => return Err(unexpected(&pattern_token)),
                };
                (Condition::Match(MatchOp::NotMatch, first, pattern), self.bump())
            }
            _ => (Condition::RValue(first), op_token),
        };

        Ok((condition, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Content {
        parse(source, ParseOptions::default()).expect("should parse")
    }

    #[test]
    fn empty_source_parses_to_empty_content() {
        assert_eq!(parse_ok(""), Vec::new());
    }

    #[test]
    fn s1_digit_leading_block_name() {
        let content = parse_ok("0auth {}");
        assert_eq!(
            content,
            vec![ContentItem::Block(Block { name: "0auth".to_string(), content: vec![] })]
        );
    }

    #[test]
    fn s2_selector_comparison_against_list() {
        let content = parse_ok("if [a][b] == [1, 2] {}");
        let expected = vec![ContentItem::Conditions(Conditions {
            branches: vec![(
                Condition::Comparison(
                    ComparisonOp::Eq,
                    RValue::Selector(Selector::new(vec!["a".to_string(), "b".to_string()])),
                    RValue::List(vec![Data::Integer(1), Data::Integer(2)]),
                ),
                vec![],
            )],
            default: None,
        })];
        assert_eq!(content, expected);
    }

    #[test]
    fn s3_trailing_comma_requires_option() {
        assert!(parse("if hello('x',) == 0 {}", ParseOptions::default()).is_err());

        let content = parse(
            "if hello('x',) == 0 {}",
            ParseOptions { accept_trailing_commas: true, ..ParseOptions::default() },
        )
        .expect("should parse with trailing commas accepted");
        let expected = vec![ContentItem::Conditions(Conditions {
            branches: vec![(
                Condition::Comparison(
                    ComparisonOp::Eq,
                    RValue::MethodCall(MethodCall {
                        name: "hello".to_string(),
                        params: vec![RValue::String("x".to_string())],
                    }),
                    RValue::Integer(0),
                ),
                vec![],
            )],
            default: None,
        })];
        assert_eq!(content, expected);
    }

    #[test]
    fn s7_differing_connectives_wrap_left_to_right() {
        let content = parse_ok("if !(1 and 2 or 3) {}");
        let inner = Condition::Not(Box::new(Condition::Connective(
            ConnectiveOp::Or,
            vec![
                Condition::Connective(
                    ConnectiveOp::And,
                    vec![
                        Condition::RValue(RValue::Integer(1)),
                        Condition::RValue(RValue::Integer(2)),
                    ],
                ),
                Condition::RValue(RValue::Integer(3)),
            ],
        )));
        assert_eq!(
            content,
            vec![ContentItem::Conditions(Conditions { branches: vec![(inner, vec![])], default: None })]
        );
    }

    #[test]
    fn same_connective_chain_flattens() {
        let content = parse_ok("if 1 and 2 and 3 {}");
        let expected_cond = Condition::Connective(
            ConnectiveOp::And,
            vec![
                Condition::RValue(RValue::Integer(1)),
                Condition::RValue(RValue::Integer(2)),
                Condition::RValue(RValue::Integer(3)),
            ],
        );
        assert_eq!(
            content,
            vec![ContentItem::Conditions(Conditions { branches: vec![(expected_cond, vec![])], default: None })]
        );
    }

    #[test]
    fn else_if_chain_and_default() {
        let content = parse_ok("if 1 == 1 {\n} else if 2 == 2 {\n} else {\n}");
        let ContentItem::Conditions(conditions) = &content[0] else {
            panic!("expected conditions node");
        };
        assert_eq!(conditions.branches.len(), 2);
        assert_eq!(conditions.default, Some(vec![]));
    }

    #[test]
    fn empty_if_branch_followed_by_else() {
        let content = parse_ok("if 1 == 1 {} else {}");
        let ContentItem::Conditions(conditions) = &content[0] else {
            panic!("expected conditions node");
        };
        assert_eq!(conditions.branches[0].1, Vec::new());
        assert_eq!(conditions.default, Some(vec![]));
    }

    #[test]
    fn selector_in_data_position_becomes_one_element_list() {
        let content = parse_ok("hello => [a]\n");
        let ContentItem::Attribute(attribute) = &content[0] else {
            panic!("expected attribute");
        };
        assert_eq!(attribute.content, Data::List(vec![Data::String("a".to_string())]));
    }

    #[test]
    fn mapping_with_bareword_keys_and_duplicate_last_wins() {
        let content = parse_ok(r#"hello => { "a" => 1 a => 2 }"#);
        let ContentItem::Attribute(attribute) = &content[0] else {
            panic!("expected attribute");
        };
        let Data::Mapping(map) = &attribute.content else {
            panic!("expected mapping");
        };
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a"), Some(&Data::Integer(2)));
    }

    #[test]
    fn not_over_bare_selector_renders_distinct_from_parenthesized_not() {
        let content = parse_ok("if ![a] {}");
        let ContentItem::Conditions(conditions) = &content[0] else {
            panic!("expected conditions node");
        };
        assert_eq!(
            conditions.branches[0].0,
            Condition::Not(Box::new(Condition::RValue(RValue::Selector(Selector::new(vec![
                "a".to_string()
            ])))))
        );
    }

    #[test]
    fn unexpected_token_carries_position() {
        let err = parse("hello )", ParseOptions::default()).unwrap_err();
        assert!(matches!(err, LsclError::UnexpectedToken { .. }));
    }

    #[test]
    fn membership_and_not_in_operators() {
        let content = parse_ok(r#"if "a" in [1, 2] {} else if "b" not in [3] {}"#);
        let ContentItem::Conditions(conditions) = &content[0] else {
            panic!("expected conditions node");
        };
        assert_eq!(
            conditions.branches[0].0,
            Condition::Membership(
                MembershipOp::In,
                RValue::String("a".to_string()),
                RValue::List(vec![Data::Integer(1), Data::Integer(2)]),
            )
        );
        assert_eq!(
            conditions.branches[1].0,
            Condition::Membership(
                MembershipOp::NotIn,
                RValue::String("b".to_string()),
                RValue::List(vec![Data::Integer(3)]),
            )
        );
    }

    #[test]
    fn match_and_not_match_accept_pattern_and_string_literals() {
        let content = parse_ok(r#"if [a] =~ /x\/y/ {} else if [b] !~ "z" {}"#);
        let ContentItem::Conditions(conditions) = &content[0] else {
            panic!("expected conditions node");
        };
        assert_eq!(
            conditions.branches[0].0,
            Condition::Match(
                MatchOp::Match,
                RValue::Selector(Selector::new(vec!["a".to_string()])),
                Pattern::new("x/y".to_string()),
            )
        );
        assert_eq!(
            conditions.branches[1].0,
            Condition::Match(
                MatchOp::NotMatch,
                RValue::Selector(Selector::new(vec!["b".to_string()])),
                Pattern::new("z".to_string()),
            )
        );
    }

    #[test]
    fn decimal_preserves_raw_lexeme() {
        let content = parse_ok("hello => 1.50\n");
        let ContentItem::Attribute(attribute) = &content[0] else {
            panic!("expected attribute");
        };
        assert_eq!(attribute.content, Data::Decimal(Decimal::new("1.50")));
    }

    #[test]
    fn max_depth_guards_against_runaway_nesting() {
        let mut source = String::new();
        for _ in 0..10 {
            source.push_str("a { ");
        }
        for _ in 0..10 {
            source.push('}');
        }
        let err = parse(&source, ParseOptions { max_depth: 3, ..ParseOptions::default() }).unwrap_err();
        assert!(matches!(err, LsclError::Decode { .. }));
    }
}
