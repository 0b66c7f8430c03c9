//! AST node definitions.

use indexmap::IndexMap;
use std::fmt;

/// An exact, fixed-point decimal value.
///
/// The textual lexeme is retained verbatim (rather than parsed into a
/// floating-point or rational representation) so that trailing-zero
/// fidelity survives a parse/render round trip, e.g. `1.50` stays `1.50`
/// rather than becoming `1.5`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(String);

impl Decimal {
    /// Wrap a raw decimal lexeme (e.g. `"1.50"`, `"-0.3"`) verbatim.
    pub fn new(raw: impl Into<String>) -> Self {
        Decimal(raw.into())
    }

    /// The original textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The payload of an [`Attribute`], and the element type of list/mapping
/// [`Data`] values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Integer(i64),
    Decimal(Decimal),
    String(String),
    List(Vec<Data>),
    /// Insertion-order-preserved; duplicate keys are resolved last-wins at
    /// parse time, so only one entry per key ever exists here.
    Mapping(IndexMap<String, Data>),
    /// A renderer-only passthrough: emitted verbatim with no quoting or
    /// escaping. Never produced by `parse`.
    Literal(String),
    /// A renderer-only convenience (`true`/`false` barewords). Never
    /// produced by `parse`: a bare `true`/`false` in source lexes as a
    /// bareword and parses as a `Data::String`.
    Boolean(bool),
}

/// A non-empty, ordered sequence of field-path segments, e.g. `[a][b]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Raw segment text, one per `[...]` token. Never contains `[`, `]`,
    /// or `,`. Never empty.
    pub names: Vec<String>,
}

impl Selector {
    pub fn new(names: Vec<String>) -> Self {
        Selector { names }
    }
}

/// A named invocation of a host-provided function inside a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub name: String,
    pub params: Vec<RValue>,
}

/// A regular expression literal. The source text is retained rather than
/// an eagerly compiled pattern: `lscl-ast` has no opinion on which regex
/// engine a caller uses, and compiling eagerly would make every `Pattern`
/// comparison a compiled-automaton comparison instead of a text one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub source: String,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        Pattern { source: source.into() }
    }
}

/// The payload of a condition operand: a superset of [`Data`] minus
/// mappings, plus [`Selector`], [`MethodCall`], and [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RValue {
    Integer(i64),
    Decimal(Decimal),
    String(String),
    List(Vec<Data>),
    Selector(Selector),
    MethodCall(MethodCall),
    Pattern(Pattern),
}

/// A comparison operator (`==`, `!=`, `<`, `<=`, `>`, `>=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// A membership operator (`in`, `not in`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOp {
    In,
    NotIn,
}

/// A regex-match operator (`=~`, `!~`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOp {
    Match,
    NotMatch,
}

/// A logical connective (`and`, `or`, `xor`, `nand`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectiveOp {
    And,
    Or,
    Xor,
    Nand,
}

/// The boolean sub-language used inside `if`/`else if` conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// A bare rvalue used as a truthy test, e.g. `if [a] {}`.
    RValue(RValue),
    Comparison(ComparisonOp, RValue, RValue),
    Membership(MembershipOp, RValue, RValue),
    Match(MatchOp, RValue, Pattern),
    /// At least two children; a single-child connective collapses to its
    /// child (see [`Condition::connective`]).
    Connective(ConnectiveOp, Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Build a connective node, collapsing a single-element list to its
    /// bare child rather than wrapping it (§8, invariant 6: connective
    /// nodes emitted by the parser always have at least two children).
    pub fn connective(op: ConnectiveOp, mut conditions: Vec<Condition>) -> Condition {
        if conditions.len() == 1 {
            match conditions.pop() {
                Some(only) => only,
                None => unreachable!("length checked above"),
            }
        } else {
            Condition::Connective(op, conditions)
        }
    }

    /// True if this condition is a selector used as a bare truthy test;
    /// the renderer special-cases `Not` over such a condition.
    pub fn as_selector(&self) -> Option<&Selector> {
        match self {
            Condition::RValue(RValue::Selector(selector)) => Some(selector),
            _ => None,
        }
    }
}

/// A named block whose body is further [`Content`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Matches `[A-Za-z0-9_-]+`.
    pub name: String,
    pub content: Content,
}

/// A named attribute holding a single [`Data`] value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Matches `[A-Za-z0-9_-]+`.
    pub name: String,
    pub content: Data,
}

/// An `if`/`else if`/`else` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditions {
    /// At least one `(condition, body)` branch, checked sequentially.
    pub branches: Vec<(Condition, Content)>,
    /// The `else { ... }` body, if present. `Some(vec![])` renders as
    /// `else {}`; `None` means there was no `else` at all.
    pub default: Option<Content>,
}

/// One structural item within a [`Content`] list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    Block(Block),
    Attribute(Attribute),
    Conditions(Conditions),
}

/// The structural layer: an ordered list of blocks, attributes, and
/// conditional trees.
pub type Content = Vec<ContentItem>;
