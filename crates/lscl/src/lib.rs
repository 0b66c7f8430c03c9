#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]
//! Bidirectional codec for the Logstash Configuration Language (LSCL).
//!
//! `lscl` ties together the lexer, parser, and renderer crates behind the
//! four entry points a caller needs (§6): [`parse`], [`render`],
//! [`parse_filters`], [`render_filters`]. The filter adapter (§4.5) is a
//! thin projection of [`Content`] into the Logstash filter-pipeline domain
//! model — a list of named plugin configurations and conditional
//! branching between them — and back.

use indexmap::IndexMap;
use lscl_ast::{Attribute, Block, Condition, Content, ContentItem, Conditions, Data};

pub use lscl_ast::{
    ComparisonOp, ConnectiveOp, Decimal, MatchOp, MembershipOp, MethodCall, Pattern, RValue,
    Selector,
};
pub use lscl_error::LsclError;
pub use lscl_lexer::{lex, lex_from};
pub use lscl_parser::ParseOptions;
pub use lscl_position::Position;
pub use lscl_render::{FieldReferenceEscapeStyle, RenderOptions, Renderable};
pub use lscl_token::{Token, TokenKind};
pub use lscl_ast::{Attribute as LsclAttribute, Block as LsclBlock, Condition as LsclCondition,
    Conditions as LsclConditions, Content as LsclContent, ContentItem as LsclContentItem,
    Data as LsclData};

/// Parse LSCL source text into [`Content`] (§6 `parse`).
pub fn parse(source: &str, options: ParseOptions) -> Result<Content, LsclError> {
    lscl_parser::parse(source, options)
}

/// Render any [`Renderable`] node back to LSCL source text (§6 `render`).
pub fn render(node: &Renderable, options: RenderOptions) -> Result<String, LsclError> {
    lscl_render::render(node, options)
}

/// A single Logstash filter plugin invocation: a name and its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogstashFilter {
    pub name: String,
    pub config: IndexMap<String, Data>,
}

/// Conditional branching between Logstash filters, mirroring a `Conditions`
/// node but over filter nodes instead of raw `Content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogstashFilterBranching {
    /// At least one `(condition, filters)` branch.
    pub branches: Vec<(Condition, Vec<FilterNode>)>,
    pub default: Option<Vec<FilterNode>>,
}

/// One element of a Logstash filter pipeline: either a plugin invocation or
/// a conditional branch around more filter nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterNode {
    Filter(LogstashFilter),
    Branching(LogstashFilterBranching),
}

/// Where to look for filters when calling [`parse_filters`] (§4.5).
pub enum FilterSource {
    /// Raw LSCL source text, parsed with [`ParseOptions::default`].
    Text(String),
    /// Already-parsed content (e.g. the output of [`parse`]).
    Content(Content),
    /// A single block — only meaningful if named `filter`.
    Block(Block),
}

impl From<String> for FilterSource {
    fn from(source: String) -> Self {
        FilterSource::Text(source)
    }
}

impl From<Content> for FilterSource {
    fn from(content: Content) -> Self {
        FilterSource::Content(content)
    }
}

impl From<Block> for FilterSource {
    fn from(block: Block) -> Self {
        FilterSource::Block(block)
    }
}

/// Extract the Logstash filter pipeline from `source` (§4.5, §6
/// `parse_filters`).
///
/// `at_root`: `Some(true)` treats the top-level content as the filter list
/// directly; `Some(false)` descends only into blocks named `filter`;
/// `None` (the default) descends into `filter` blocks and falls back to
/// the entire content if none are found.
pub fn parse_filters(
    source: impl Into<FilterSource>,
    at_root: Option<bool>,
) -> Result<Vec<FilterNode>, LsclError> {
    tracing::debug!(?at_root, "extracting logstash filters");
    let content = filter_content(source.into(), at_root)?;
    Ok(extract_filters(&content))
}

/// Re-emit a filter pipeline as LSCL source text (§4.5, §6 `render_filters`).
pub fn render_filters(filters: &[FilterNode]) -> Result<String, LsclError> {
    tracing::debug!(count = filters.len(), "rendering logstash filters");
    let content = filters_to_content(filters);
    lscl_render::render_content(&content, RenderOptions::default(), 0)
}

fn filter_content(source: FilterSource, at_root: Option<bool>) -> Result<Content, LsclError> {
    match source {
        FilterSource::Block(block) => {
            if block.name != "filter" {
                Ok(Vec::new())
            } else {
                Ok(block.content)
            }
        }
        FilterSource::Text(text) => {
            let content = lscl_parser::parse(&text, ParseOptions::default())?;
            Ok(resolve_at_root(content, at_root))
        }
        FilterSource::Content(content) => Ok(resolve_at_root(content, at_root)),
    }
}

fn resolve_at_root(content: Content, at_root: Option<bool>) -> Content {
    if at_root == Some(true) {
        return content;
    }

    let found = find_filter_blocks(&content);
    if found.is_empty() && at_root.is_none() {
        return content;
    }

    found
}

/// Descend through `Conditions` nodes, collecting the content of any block
/// named `filter` found along the way (§4.5).
fn find_filter_blocks(content: &Content) -> Content {
    let mut found = Content::new();
    for item in content {
        match item {
            ContentItem::Block(block) if block.name == "filter" => {
                found.extend(block.content.iter().cloned());
            }
            ContentItem::Conditions(conditions) => {
                let branches = conditions
                    .branches
                    .iter()
                    .map(|(condition, body)| (condition.clone(), find_filter_blocks(body)))
                    .collect();
                let default = conditions.default.as_ref().map(|body| find_filter_blocks(body));
                found.push(ContentItem::Conditions(Conditions { branches, default }));
            }
            ContentItem::Block(_) | ContentItem::Attribute(_) => {}
        }
    }
    found
}

/// Map content at the search level into filter nodes: each `Block` becomes
/// a [`LogstashFilter`] built from its immediate attributes, each
/// `Conditions` node becomes a [`LogstashFilterBranching`] (§4.5).
fn extract_filters(content: &Content) -> Vec<FilterNode> {
    let mut result = Vec::new();
    for item in content {
        match item {
            ContentItem::Block(block) => {
                let mut config = IndexMap::new();
                for child in &block.content {
                    if let ContentItem::Attribute(attribute) = child {
                        config.insert(attribute.name.clone(), attribute.content.clone());
                    }
                }
                result.push(FilterNode::Filter(LogstashFilter { name: block.name.clone(), config }));
            }
            ContentItem::Conditions(conditions) => {
                let branches = conditions
                    .branches
                    .iter()
                    .map(|(condition, body)| (condition.clone(), extract_filters(body)))
                    .collect();
                let default = conditions.default.as_ref().map(|body| extract_filters(body));
                result.push(FilterNode::Branching(LogstashFilterBranching { branches, default }));
            }
            ContentItem::Attribute(_) => {}
        }
    }
    result
}

fn filters_to_content(filters: &[FilterNode]) -> Content {
    let mut content = Content::new();
    for node in filters {
        match node {
            FilterNode::Filter(filter) => {
                let mut entries: Vec<(&String, &Data)> = filter.config.iter().collect();
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                let body = entries
                    .into_iter()
                    .map(|(name, data)| {
                        ContentItem::Attribute(Attribute { name: name.clone(), content: data.clone() })
                    })
                    .collect();
                content.push(ContentItem::Block(Block { name: filter.name.clone(), content: body }));
            }
            FilterNode::Branching(branching) => {
                let branches = branching
                    .branches
                    .iter()
                    .map(|(condition, body)| (condition.clone(), filters_to_content(body)))
                    .collect();
                let default = branching.default.as_ref().map(|body| filters_to_content(body));
                content.push(ContentItem::Conditions(Conditions { branches, default }));
            }
        }
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use lscl_ast::ComparisonOp;

    #[test]
    fn parse_filters_descends_into_filter_block() {
        let source = r#"
input { stdin {} }
filter {
  mutate { id => "m1" }
}
output { stdout {} }
"#;
        let filters = parse_filters(source.to_string(), None).expect("extracts");
        assert_eq!(filters.len(), 1);
        let FilterNode::Filter(filter) = &filters[0] else {
            panic!("expected a filter node");
        };
        assert_eq!(filter.name, "mutate");
        assert_eq!(filter.config.get("id"), Some(&Data::String("m1".to_string())));
    }

    #[test]
    fn parse_filters_falls_back_to_root_when_no_filter_block_present() {
        let source = "mutate { id => \"m1\" }\n";
        let filters = parse_filters(source.to_string(), None).expect("extracts");
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn parse_filters_at_root_true_ignores_filter_block_name() {
        let source = "filter { mutate { id => \"m1\" } }\n";
        let filters = parse_filters(source.to_string(), Some(true)).expect("extracts");
        assert_eq!(filters.len(), 1);
        let FilterNode::Filter(filter) = &filters[0] else {
            panic!("expected a filter node");
        };
        assert_eq!(filter.name, "filter");
    }

    #[test]
    fn parse_filters_at_root_false_returns_empty_without_filter_block() {
        let source = "mutate { id => \"m1\" }\n";
        let filters = parse_filters(source.to_string(), Some(false)).expect("extracts");
        assert!(filters.is_empty());
    }

    #[test]
    fn branching_preserves_condition_and_recurses() {
        let source = r#"
filter {
  if [type] == "apache" {
    grok { match => { "message" => "%{COMBINEDAPACHELOG}" } }
  } else {
    mutate { id => "noop" }
  }
}
"#;
        let filters = parse_filters(source.to_string(), None).expect("extracts");
        assert_eq!(filters.len(), 1);
        let FilterNode::Branching(branching) = &filters[0] else {
            panic!("expected a branching node");
        };
        assert_eq!(branching.branches.len(), 1);
        assert!(matches!(branching.branches[0].0, Condition::Comparison(ComparisonOp::Eq, ..)));
        assert_eq!(branching.branches[0].1.len(), 1);
        assert!(branching.default.is_some());
    }

    #[test]
    fn render_filters_sorts_config_keys() {
        let mut config = IndexMap::new();
        config.insert("z".to_string(), Data::Integer(1));
        config.insert("a".to_string(), Data::Integer(2));
        let filters = vec![FilterNode::Filter(LogstashFilter { name: "mutate".to_string(), config })];
        let rendered = render_filters(&filters).expect("renders");
        assert_eq!(rendered, "mutate {\n  a => 2\n  z => 1\n}\n");
    }

    #[test]
    fn block_source_requires_filter_name() {
        let block = Block { name: "output".to_string(), content: vec![] };
        let filters = parse_filters(block, None).expect("extracts");
        assert!(filters.is_empty());
    }

    #[test]
    fn round_trip_through_parse_and_render_filters() {
        let source = "filter {\n  mutate { id => \"m1\" }\n}\n";
        let filters = parse_filters(source.to_string(), None).expect("extracts");
        let rendered = render_filters(&filters).expect("renders");
        let reparsed = parse_filters(rendered, None).expect("reparses");
        assert_eq!(filters, reparsed);
    }
}
