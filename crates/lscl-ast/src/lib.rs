#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]
//! The LSCL abstract syntax tree.
//!
//! Four closed tagged-sum types, matching the data model of the Logstash
//! Configuration Language: [`Data`] (attribute payloads), [`RValue`]
//! (condition operands), [`Condition`] (the boolean sub-language) and
//! [`Content`] (the structural layer of blocks/attributes/conditionals).

pub mod ast;

pub use ast::{
    Attribute, Block, ComparisonOp, Condition, Conditions, Content, ContentItem, ConnectiveOp,
    Data, Decimal, MatchOp, MembershipOp, MethodCall, Pattern, RValue, Selector,
};
