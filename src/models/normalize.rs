//! The one place raw store JSON is turned into typed fields.
//!
//! Imported spreadsheets leave numbers as JSON numbers, numeric strings,
//! or strings with thousands separators and currency symbols. Every
//! defaulting rule for missing or malformed values lives here.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?").expect("static regex")
});

/// Trimmed non-empty text; numbers are rendered as text
pub fn text(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decimal from a JSON number or a loosely formatted numeric string
pub fn decimal(raw: &Map<String, Value>, key: &str) -> Option<Decimal> {
    match raw.get(key)? {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

pub fn parse_decimal(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    let parenthesised = trimmed.starts_with('(') && trimmed.ends_with(')');
    let compact: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '_'))
        .collect();

    // first numeric run; currency codes and symbols around it are ignored
    let found = NUMBER.find(&compact)?;
    let number = found.as_str().trim_start_matches('+');
    let parsed = Decimal::from_str(number)
        .or_else(|_| Decimal::from_scientific(number))
        .ok()?;

    let negative = parenthesised || compact[..found.start()].contains('-');
    Some(if negative { -parsed.abs() } else { parsed })
}

/// Stock quantity: missing, negative or unparsable values count as zero
pub fn quantity(raw: &Map<String, Value>, key: &str) -> u64 {
    decimal(raw, key)
        .filter(|d| d.is_sign_positive())
        .and_then(|d| d.trunc().to_u64())
        .unwrap_or(0)
}

/// Comma-separated part codes, trimmed and deduplicated in order
pub fn code_list(input: &str) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for code in input.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if !codes.iter().any(|existing| existing.eq_ignore_ascii_case(code)) {
            codes.push(code.to_string());
        }
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("12.50", Some(dec!(12.50)) ; "plain")]
    #[test_case("1,234.5", Some(dec!(1234.5)) ; "thousands separator")]
    #[test_case("$ 99", Some(dec!(99)) ; "currency symbol")]
    #[test_case("(15.00)", Some(dec!(-15.00)) ; "accounting negative")]
    #[test_case("-3", Some(dec!(-3)) ; "negative")]
    #[test_case("EUR 12", Some(dec!(12)) ; "currency code")]
    #[test_case("12 EUR", Some(dec!(12)) ; "trailing currency code")]
    #[test_case("1.5e2", Some(dec!(150)) ; "scientific")]
    #[test_case("-$5", Some(dec!(-5)) ; "sign before symbol")]
    #[test_case("+7", Some(dec!(7)) ; "explicit plus")]
    #[test_case("n/a", None ; "not a number")]
    #[test_case("   ", None ; "blank")]
    fn parses_loose_decimals(input: &str, expected: Option<Decimal>) {
        assert_eq!(parse_decimal(input), expected);
    }

    #[test]
    fn quantity_defaults_to_zero() {
        let raw = json!({"a": -4, "b": "7", "c": "x", "d": 3.9})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(quantity(&raw, "a"), 0);
        assert_eq!(quantity(&raw, "b"), 7);
        assert_eq!(quantity(&raw, "c"), 0);
        assert_eq!(quantity(&raw, "d"), 3);
        assert_eq!(quantity(&raw, "missing"), 0);
    }

    #[test]
    fn text_drops_blank_values() {
        let raw = json!({"a": "  ", "b": " Bosch ", "c": 2024})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(text(&raw, "a"), None);
        assert_eq!(text(&raw, "b").as_deref(), Some("Bosch"));
        assert_eq!(text(&raw, "c").as_deref(), Some("2024"));
    }

    #[test]
    fn code_list_trims_and_dedups() {
        assert_eq!(
            code_list(" A-1, b-2,,a-1 ,C-3"),
            vec!["A-1".to_string(), "b-2".to_string(), "C-3".to_string()]
        );
        assert!(code_list(" , ").is_empty());
    }
}
