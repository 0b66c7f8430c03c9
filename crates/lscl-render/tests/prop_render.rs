//! Property tests over the renderer's boundary laws and round-trip
//! guarantees (§8): rendered output never has trailing spaces and always
//! ends in `\n` (invariant 2); integers, decimals, and ASCII strings
//! without control characters round-trip through render/parse (invariant
//! 4).

use lscl_ast::{Attribute, Content, ContentItem, Data, Decimal};
use lscl_render::{render_content, RenderOptions};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

fn cases() -> u32 {
    std::env::var("PROPTEST_CASES").ok().and_then(|s| s.parse().ok()).unwrap_or(256)
}

fn attribute_content(data: Data) -> Content {
    vec![ContentItem::Attribute(Attribute { name: "x".to_string(), content: data })]
}

fn extract_attribute_data(content: &Content) -> &Data {
    let ContentItem::Attribute(attribute) = &content[0] else {
        panic!("expected a single attribute");
    };
    &attribute.content
}

fn no_trailing_whitespace_and_ends_in_newline(rendered: &str) -> bool {
    if !rendered.ends_with('\n') {
        return false;
    }
    rendered.lines().all(|line| line == line.trim_end())
}

/// A decimal lexeme with at most 12 significant digits, matching the
/// quantified invariant's bound.
fn decimal_lexeme() -> impl Strategy<Value = String> {
    (proptest::collection::vec(0..10u8, 1..7), proptest::collection::vec(0..10u8, 1..6), any::<bool>())
        .prop_map(|(int_digits, frac_digits, negative)| {
            let int_part: String = int_digits.iter().map(|d| (b'0' + d) as char).collect();
            let frac_part: String = frac_digits.iter().map(|d| (b'0' + d) as char).collect();
            format!("{}{int_part}.{frac_part}", if negative { "-" } else { "" })
        })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: cases(), .. ProptestConfig::default() })]

    #[test]
    fn integers_round_trip(value in any::<i64>()) {
        let content = attribute_content(Data::Integer(value));
        let rendered = render_content(&content, RenderOptions::default(), 0).expect("renders");
        prop_assert!(no_trailing_whitespace_and_ends_in_newline(&rendered));
        let reparsed = lscl_parser::parse(&rendered, lscl_parser::ParseOptions::default()).expect("reparses");
        prop_assert_eq!(extract_attribute_data(&reparsed), &Data::Integer(value));
    }

    #[test]
    fn decimals_round_trip(raw in decimal_lexeme()) {
        let content = attribute_content(Data::Decimal(Decimal::new(raw.clone())));
        let rendered = render_content(&content, RenderOptions::default(), 0).expect("renders");
        prop_assert!(no_trailing_whitespace_and_ends_in_newline(&rendered));
        let reparsed = lscl_parser::parse(&rendered, lscl_parser::ParseOptions::default()).expect("reparses");
        prop_assert_eq!(extract_attribute_data(&reparsed), &Data::Decimal(Decimal::new(raw)));
    }

    /// ASCII strings without control characters, rendered with
    /// `escapes_supported: true` so even strings containing both quote
    /// kinds (otherwise rejected, see `both_quote_kinds_without_escape_support_fails`
    /// in `lscl-render`'s unit tests) still have a representable form.
    ///
    /// Excludes the eight connective/keyword spellings (`if`, `else`,
    /// `in`, `not`, `and`, `or`, `xor`, `nand`): the lexer recognizes
    /// these as keyword tokens everywhere, not just inside conditions
    /// (confirmed by `original_source/lscl/parser.py`'s token-type table),
    /// so a bareword-eligible string equal to one of them cannot be
    /// reparsed as data even though the renderer's bareword-promotion
    /// check does not special-case it. This is an inherited quirk, not
    /// one introduced here; see `DESIGN.md`.
    #[test]
    fn ascii_strings_round_trip(value in "[ -~]{0,40}".prop_filter(
        "excludes keyword-colliding barewords",
        |s| !matches!(s.as_str(), "if" | "else" | "in" | "not" | "and" | "or" | "xor" | "nand"),
    )) {
        let options = RenderOptions { escapes_supported: true, ..RenderOptions::default() };
        let content = attribute_content(Data::String(value.clone()));
        let rendered = render_content(&content, options, 0).expect("renders");
        prop_assert!(no_trailing_whitespace_and_ends_in_newline(&rendered));
        let reparsed = lscl_parser::parse(&rendered, lscl_parser::ParseOptions::default()).expect("reparses");
        prop_assert_eq!(extract_attribute_data(&reparsed), &Data::String(value));
    }

    /// Lists and mappings of simple data nest cleanly without introducing
    /// trailing whitespace anywhere in the output.
    #[test]
    fn lists_never_have_trailing_whitespace(values in proptest::collection::vec(any::<i64>(), 0..8)) {
        let content = attribute_content(Data::List(values.into_iter().map(Data::Integer).collect()));
        let rendered = render_content(&content, RenderOptions::default(), 0).expect("renders");
        prop_assert!(no_trailing_whitespace_and_ends_in_newline(&rendered));
    }
}
