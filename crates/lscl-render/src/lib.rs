#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]
//! Pretty-printer from the LSCL AST back to source text (§4.4).
//!
//! The renderer never mutates its input and is total over well-formed
//! ASTs except where the active [`RenderOptions`] forbid a character the
//! input actually contains, in which case it fails with
//! [`LsclError::StringRendering`] or [`LsclError::SelectorElementRendering`]
//! rather than silently corrupting the output.

use lscl_ast::{
    Attribute, Block, ComparisonOp, Condition, Conditions, Content, ContentItem, ConnectiveOp,
    Data, MatchOp, MembershipOp, Pattern, RValue, Selector,
};
use lscl_error::LsclError;
use once_cell::sync::Lazy;
use regex::Regex;

static BAREWORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]+$").expect("static pattern is valid"));

static PERCENT_TRIPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([0-9A-Fa-f]{2})").expect("static pattern is valid"));

static AMPERSAND_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#([0-9]+);").expect("static pattern is valid"));

/// How forbidden characters (`[`, `]`, `,`) inside a selector segment are
/// encoded (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldReferenceEscapeStyle {
    /// Fail with [`LsclError::SelectorElementRendering`] rather than emit
    /// an ambiguous segment.
    #[default]
    None,
    /// `%XX`-style percent-encoding; any existing `%XX` triple is escaped
    /// first so it can't be confused with a newly-inserted one.
    Percent,
    /// `&#NN;`-style numeric character references; any existing entity is
    /// escaped first for the same reason.
    Ampersand,
}

/// Options controlling how otherwise-unrepresentable characters are
/// handled (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Whether NUL, CR, and the chosen quote delimiter may be escaped at
    /// all. When false, a string containing NUL, CR, or both quote kinds
    /// fails to render rather than emit something the lexer couldn't
    /// reparse.
    pub escapes_supported: bool,
    pub field_reference_escape_style: FieldReferenceEscapeStyle,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            escapes_supported: false,
            field_reference_escape_style: FieldReferenceEscapeStyle::None,
        }
    }
}

/// Anything [`render`] accepts as a top-level node (§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renderable {
    Content(Content),
    Block(Block),
    Attribute(Attribute),
    Conditions(Conditions),
    Data(Data),
    Condition(Condition),
    RValue(RValue),
    Selector(Selector),
}

impl From<Content> for Renderable {
    fn from(content: Content) -> Self {
        Renderable::Content(content)
    }
}

impl From<Block> for Renderable {
    fn from(block: Block) -> Self {
        Renderable::Block(block)
    }
}

impl From<Attribute> for Renderable {
    fn from(attribute: Attribute) -> Self {
        Renderable::Attribute(attribute)
    }
}

impl From<Conditions> for Renderable {
    fn from(conditions: Conditions) -> Self {
        Renderable::Conditions(conditions)
    }
}

impl From<Data> for Renderable {
    fn from(data: Data) -> Self {
        Renderable::Data(data)
    }
}

impl From<Condition> for Renderable {
    fn from(condition: Condition) -> Self {
        Renderable::Condition(condition)
    }
}

impl From<RValue> for Renderable {
    fn from(rvalue: RValue) -> Self {
        Renderable::RValue(rvalue)
    }
}

impl From<Selector> for Renderable {
    fn from(selector: Selector) -> Self {
        Renderable::Selector(selector)
    }
}

/// Render any [`Renderable`] node to LSCL source text (§6 `render`).
pub fn render(node: &Renderable, options: RenderOptions) -> Result<String, LsclError> {
    tracing::debug!(?options, "rendering LSCL node");
    match node {
        Renderable::Content(content) => render_content(content, options, 0),
        Renderable::Block(block) => {
            render_content(&[ContentItem::Block(block.clone())], options, 0)
        }
        Renderable::Attribute(attribute) => {
            render_content(&[ContentItem::Attribute(attribute.clone())], options, 0)
        }
        Renderable::Conditions(conditions) => {
            render_content(&[ContentItem::Conditions(conditions.clone())], options, 0)
        }
        Renderable::Data(data) => render_data(data, options, 0),
        Renderable::Condition(condition) => render_condition(condition, options),
        Renderable::RValue(rvalue) => render_rvalue(rvalue, options),
        Renderable::Selector(selector) => render_selector(selector, options),
    }
}

/// Render a [`Content`] body (§4.4 "Content rendering") at the given
/// nesting level (two spaces per level).
pub fn render_content(
    items: &[ContentItem],
    options: RenderOptions,
    indent: usize,
) -> Result<String, LsclError> {
    let pad = "  ".repeat(indent);
    let mut out = String::new();

    for item in items {
        match item {
            ContentItem::Block(block) => {
                if block.content.is_empty() {
                    out.push_str(&pad);
                    out.push_str(&block.name);
                    out.push_str(" {}\n");
                } else {
                    out.push_str(&pad);
                    out.push_str(&block.name);
                    out.push_str(" {\n");
                    out.push_str(&render_content(&block.content, options, indent + 1)?);
                    out.push_str(&pad);
                    out.push_str("}\n");
                }
            }
            ContentItem::Attribute(attribute) => {
                out.push_str(&pad);
                out.push_str(&attribute.name);
                out.push_str(" => ");
                out.push_str(&render_data(&attribute.content, options, indent)?);
            }
            ContentItem::Conditions(conditions) => {
                out.push_str(&render_conditions(conditions, options, indent, &pad)?);
            }
        }
    }

    Ok(out)
}

fn render_conditions(
    conditions: &Conditions,
    options: RenderOptions,
    indent: usize,
    pad: &str,
) -> Result<String, LsclError> {
    let mut out = String::new();
    let mut before_branch = pad.to_string();

    for (condition, body) in &conditions.branches {
        out.push_str(&before_branch);
        out.push_str("if ");
        out.push_str(&render_condition(condition, options)?);

        if body.is_empty() {
            out.push_str(" {}");
            before_branch = format!("\n{pad}else ");
        } else {
            out.push_str(" {\n");
            out.push_str(&render_content(body, options, indent + 1)?);
            out.push_str(pad);
            out.push('}');
            before_branch = " else ".to_string();
        }
    }

    if let Some(default) = &conditions.default {
        out.push_str(&before_branch);
        if default.is_empty() {
            out.push_str("{}");
        } else {
            out.push_str("{\n");
            out.push_str(&render_content(default, options, indent + 1)?);
            out.push_str(pad);
            out.push('}');
        }
    }

    out.push('\n');
    Ok(out)
}

/// Render a [`Data`] value (§4.4 "Data rendering"). The result always
/// ends in `\n`; callers embedding it mid-line (e.g. after `name => `)
/// rely on that.
pub fn render_data(data: &Data, options: RenderOptions, indent: usize) -> Result<String, LsclError> {
    match data {
        Data::Integer(value) => Ok(format!("{value}\n")),
        Data::Decimal(value) => Ok(format!("{value}\n")),
        Data::Boolean(value) => Ok(format!("{}\n", if *value { "true" } else { "false" })),
        Data::Literal(raw) => Ok(format!("{raw}\n")),
        Data::String(value) => Ok(format!("{}\n", render_string(value, true, options)?)),
        Data::List(items) => {
            if items.is_empty() {
                return Ok("[]\n".to_string());
            }

            let pad = "  ".repeat(indent);
            let child_pad = "  ".repeat(indent + 1);
            let mut out = String::from("[\n");
            let last = items.len() - 1;
            for (i, item) in items.iter().enumerate() {
                out.push_str(&child_pad);
                let rendered = render_data(item, options, indent + 1)?;
                if i != last {
                    out.push_str(rendered.trim_end_matches('\n'));
                    out.push_str(",\n");
                } else {
                    out.push_str(&rendered);
                }
            }
            out.push_str(&pad);
            out.push_str("]\n");
            Ok(out)
        }
        Data::Mapping(map) => {
            if map.is_empty() {
                return Ok("{}\n".to_string());
            }

            let pad = "  ".repeat(indent);
            let child_pad = "  ".repeat(indent + 1);
            let mut out = String::from("{\n");
            for (key, value) in map {
                out.push_str(&child_pad);
                out.push_str(&render_string(key, true, options)?);
                out.push_str(" => ");
                out.push_str(&render_data(value, options, indent + 1)?);
            }
            out.push_str(&pad);
            out.push_str("}\n");
            Ok(out)
        }
    }
}

/// Render an [`RValue`] (the operand type inside conditions). Barewords
/// are never used here, matching the corresponding upstream comment: a
/// bareword in rvalue position is already spoken for by method calls.
pub fn render_rvalue(rvalue: &RValue, options: RenderOptions) -> Result<String, LsclError> {
    match rvalue {
        RValue::Integer(value) => Ok(value.to_string()),
        RValue::Decimal(value) => Ok(value.to_string()),
        RValue::String(value) => render_string(value, false, options),
        RValue::Pattern(pattern) => Ok(render_pattern(pattern)),
        RValue::Selector(selector) => render_selector(selector, options),
        RValue::List(items) => {
            let rendered = render_data(&Data::List(items.clone()), options, 0)?;
            Ok(rendered.trim_end_matches('\n').to_string())
        }
        RValue::MethodCall(call) => {
            let mut out = String::new();
            out.push_str(&call.name);
            out.push('(');
            for (i, param) in call.params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&render_rvalue(param, options)?);
            }
            out.push(')');
            Ok(out)
        }
    }
}

/// Render a [`Condition`] (§4.4 "Condition rendering").
pub fn render_condition(condition: &Condition, options: RenderOptions) -> Result<String, LsclError> {
    match condition {
        Condition::Connective(op, children) => {
            if children.len() == 1 {
                return render_condition(&children[0], options);
            }

            let joiner = match op {
                ConnectiveOp::And => " and ",
                ConnectiveOp::Or => " or ",
                ConnectiveOp::Xor => " xor ",
                ConnectiveOp::Nand => " nand ",
            };

            let mut pieces = Vec::with_capacity(children.len());
            for child in children {
                let rendered = render_condition(child, options)?;
                if matches!(child, Condition::Connective(_, _)) {
                    pieces.push(format!("({rendered})"));
                } else {
                    pieces.push(rendered);
                }
            }
            Ok(pieces.join(joiner))
        }
        Condition::Not(inner) => match inner.as_selector() {
            Some(selector) => Ok(format!("!{}", render_selector(selector, options)?)),
            None => Ok(format!("!({})", render_condition(inner, options)?)),
        },
        Condition::Comparison(op, first, second) => {
            let op_str = match op {
                ComparisonOp::Eq => "==",
                ComparisonOp::NotEq => "!=",
                ComparisonOp::Lt => "<",
                ComparisonOp::Lte => "<=",
                ComparisonOp::Gt => ">",
                ComparisonOp::Gte => ">=",
            };
            Ok(format!(
                "{} {op_str} {}",
                render_rvalue(first, options)?,
                render_rvalue(second, options)?
            ))
        }
        Condition::Membership(op, needle, haystack) => {
            let op_str = match op {
                MembershipOp::In => "in",
                MembershipOp::NotIn => "not in",
            };
            Ok(format!(
                "{} {op_str} {}",
                render_rvalue(needle, options)?,
                render_rvalue(haystack, options)?
            ))
        }
        Condition::Match(op, value, pattern) => {
            let op_str = match op {
                MatchOp::Match => "=~",
                MatchOp::NotMatch => "!~",
            };
            Ok(format!("{} {op_str} {}", render_rvalue(value, options)?, render_pattern(pattern)))
        }
        Condition::RValue(rvalue) => render_rvalue(rvalue, options),
    }
}

/// Render a [`Selector`] (§4.4, field-reference escape styles).
pub fn render_selector(selector: &Selector, options: RenderOptions) -> Result<String, LsclError> {
    let mut out = String::new();
    for name in &selector.names {
        out.push('[');
        out.push_str(&render_selector_segment(name, options)?);
        out.push(']');
    }
    Ok(out)
}

fn render_selector_segment(name: &str, options: RenderOptions) -> Result<String, LsclError> {
    match options.field_reference_escape_style {
        FieldReferenceEscapeStyle::None => {
            if name.contains('[') || name.contains(']') || name.contains(',') {
                return Err(LsclError::selector_element_rendering(name));
            }
            Ok(name.to_string())
        }
        FieldReferenceEscapeStyle::Percent => {
            let escaped = PERCENT_TRIPLE.replace_all(name, "%25$1");
            let escaped = escaped.replace('[', "%5B").replace(']', "%5D").replace(',', "%2C");
            Ok(escaped)
        }
        FieldReferenceEscapeStyle::Ampersand => {
            let escaped = AMPERSAND_ENTITY.replace_all(name, "&#38;#$1;");
            let escaped = escaped.replace('[', "&#91;").replace(']', "&#93;").replace(',', "&#44;");
            Ok(escaped)
        }
    }
}

/// Render a string value, quoting and escaping per §4.4's policy. Mapping
/// keys and `Data::String` values permit bareword promotion; rvalue
/// strings never do.
fn render_string(raw: &str, allow_bareword: bool, options: RenderOptions) -> Result<String, LsclError> {
    if allow_bareword && BAREWORD_PATTERN.is_match(raw) {
        return Ok(raw.to_string());
    }

    let has_dquote = raw.contains('"');
    let has_squote = raw.contains('\'');
    let quote = if !has_dquote || has_squote { '"' } else { '\'' };

    if !options.escapes_supported
        && (raw.contains('\0') || raw.contains('\r') || (has_dquote && has_squote))
    {
        return Err(LsclError::string_rendering(raw));
    }

    let mut body = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => body.push_str("\\\\"),
            c if c == quote => {
                body.push('\\');
                body.push(c);
            }
            '\0' if options.escapes_supported => body.push_str("\\0"),
            '\r' if options.escapes_supported => body.push_str("\\r"),
            '\n' if options.escapes_supported => body.push_str("\\n"),
            '\t' if options.escapes_supported => body.push_str("\\t"),
            other => body.push(other),
        }
    }

    let mut out = String::with_capacity(body.len() + 2);
    out.push(quote);
    out.push_str(&body);
    out.push(quote);
    Ok(out)
}

fn render_pattern(pattern: &Pattern) -> String {
    let mut out = String::with_capacity(pattern.source.len() + 2);
    out.push('/');
    for ch in pattern.source.chars() {
        if ch == '/' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('/');
    out
}
