//! Turns the upstream menu-analysis response into a [`Menu`].
//!
//! The upstream service answers with `{ "raw_response": "<text>" }` where the
//! text is model output: usually JSON, often wrapped in a code fence with some
//! commentary around it. Parsing runs in fixed stages: envelope, normalization,
//! structural pre-check, strict decode. Each stage fails with its own
//! [`ParseError`] variant.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use serde::Deserialize;
use serde_json::Value;

use crate::model::menu::Menu;

mod error;
pub mod normalize;
mod schema;

pub use error::{DecodeErrorKind, ParseError};

#[derive(Debug, Deserialize)]
struct Envelope {
    raw_response: String,
}

pub fn parse(raw: &[u8]) -> Result<Menu, ParseError> {
    let text = decode_text(raw)?;

    let envelope: Envelope = serde_json::from_str(&text).map_err(ParseError::EnvelopeDecode)?;
    tracing::debug!(len = envelope.raw_response.len(), "decoded response envelope");

    let cleaned = normalize::normalize(&envelope.raw_response);
    tracing::trace!(preview = %preview(&cleaned), "normalized menu document");

    let doc = precheck(cleaned.as_bytes())?;
    let menu = schema::decode_menu(&doc)?;

    tracing::debug!(
        categories = menu.categories.len(),
        items = menu.categories.iter().map(|c| c.items.len()).sum::<usize>(),
        "parsed menu response"
    );

    Ok(menu)
}

// No BOM means UTF-8. Malformed sequences are rejected, never replaced.
fn decode_text(raw: &[u8]) -> Result<Cow<'_, str>, ParseError> {
    let (encoding, bom_len): (&'static Encoding, usize) =
        Encoding::for_bom(raw).unwrap_or((UTF_8, 0));

    encoding
        .decode_without_bom_handling_and_without_replacement(&raw[bom_len..])
        .ok_or_else(|| {
            ParseError::Encoding(format!("payload is not well-formed {}", encoding.name()))
        })
}

fn precheck(bytes: &[u8]) -> Result<Value, ParseError> {
    let doc: Value = serde_json::from_slice(bytes).map_err(classify_json_error)?;

    match doc.get("categories").and_then(Value::as_array) {
        Some(categories) if !categories.is_empty() => Ok(doc),
        _ => Err(ParseError::Schema("categories".into())),
    }
}

fn classify_json_error(e: serde_json::Error) -> ParseError {
    use serde_json::error::Category;

    let kind = match e.classify() {
        Category::Syntax | Category::Eof => DecodeErrorKind::Corrupted,
        Category::Io | Category::Data => DecodeErrorKind::Unknown,
    };

    ParseError::Decode {
        kind,
        path: "$".into(),
        detail: e.to_string(),
    }
}

fn preview(s: &str) -> &str {
    match s.char_indices().nth(100) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const NOODLES: &str = r#"{"categories":[{"original_name":"面","translated_name":"Noodles","items":[{"original_name":"牛肉面","translated_name":"Beef Noodle Soup","price":28}]}]}"#;

    fn envelope(inner: &str) -> Vec<u8> {
        json!({ "raw_response": inner }).to_string().into_bytes()
    }

    fn decode_err(inner: &str) -> (DecodeErrorKind, String) {
        match parse(&envelope(inner)) {
            Err(ParseError::Decode { kind, path, .. }) => (kind, path),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn parses_fenced_noodle_menu() {
        let menu = parse(&envelope(&format!("```json\n{NOODLES}\n```"))).unwrap();

        assert_eq!(menu.categories.len(), 1);
        let cat = &menu.categories[0];
        assert_eq!(cat.translated_name, "Noodles");
        assert_eq!(cat.items.len(), 1);
        assert_eq!(cat.items[0].price, Some(28));
        assert_eq!(cat.items[0].id, "面_牛肉面");
        assert_eq!(cat.items[0].category, "Noodles");
    }

    #[test]
    fn noisy_wrapping_matches_bare_document() {
        let bare = parse(&envelope(NOODLES)).unwrap();
        let noisy = format!(
            "\u{FEFF}Here is the translated menu:\n```json\n\u{0007}{NOODLES}\u{0001}\n```\nLet me know if you need more.\u{001b}"
        );

        assert_eq!(parse(&envelope(&noisy)).unwrap(), bare);
    }

    #[test]
    fn double_encoded_newlines_are_removed() {
        let inner = "```json\\n{\\n  \"categories\": [{\"original_name\": \"饮品\", \"translated_name\": \"Drinks\", \"items\": []}]\\n}\\n```";
        let menu = parse(&envelope(inner)).unwrap();
        assert_eq!(menu.categories[0].translated_name, "Drinks");
        assert!(menu.categories[0].items.is_empty());
    }

    #[test]
    fn keeps_source_order() {
        let inner = json!({
            "categories": [
                { "original_name": "B", "translated_name": "Second?", "items": [
                    { "original_name": "z", "translated_name": "Z" },
                    { "original_name": "a", "translated_name": "A", "price": null }
                ]},
                { "original_name": "A", "translated_name": "First?", "items": [] }
            ]
        })
        .to_string();

        let menu = parse(&envelope(&inner)).unwrap();
        let names: Vec<&str> = menu.categories.iter().map(|c| c.original_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);

        let ids: Vec<String> = menu.menu_items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["B_z", "B_a"]);
        assert!(menu.menu_items().iter().all(|i| i.price.is_none()));
    }

    #[test]
    fn integral_float_price_is_accepted() {
        let inner = r#"{"categories":[{"original_name":"a","translated_name":"A","items":[{"original_name":"x","translated_name":"X","price":15.0}]}]}"#;
        let menu = parse(&envelope(inner)).unwrap();
        assert_eq!(menu.categories[0].items[0].price, Some(15));
    }

    #[test]
    fn malformed_envelope() {
        assert!(matches!(parse(b"not json at all"), Err(ParseError::EnvelopeDecode(_))));
        assert!(matches!(parse(br#"{"other": 1}"#), Err(ParseError::EnvelopeDecode(_))));
        assert!(matches!(parse(br#"{"raw_response": 5}"#), Err(ParseError::EnvelopeDecode(_))));
    }

    #[test]
    fn invalid_text_is_an_encoding_error() {
        let mut raw = br#"{"raw_response": ""#.to_vec();
        raw.extend_from_slice(&[0xFF, 0xFE, 0xFD]);
        raw.extend_from_slice(br#""}"#);

        assert!(matches!(parse(&raw), Err(ParseError::Encoding(_))));
    }

    #[test]
    fn utf16_envelope_with_bom_is_decoded() {
        let text = String::from_utf8(envelope(NOODLES)).unwrap();
        let mut raw = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            raw.extend_from_slice(&unit.to_le_bytes());
        }

        let menu = parse(&raw).unwrap();
        assert_eq!(menu.categories[0].items[0].translated_name, "Beef Noodle Soup");
    }

    #[test]
    fn missing_categories_is_schema_error() {
        let err = parse(&envelope(r#"{"menu": []}"#)).unwrap_err();
        assert!(matches!(err, ParseError::Schema(ref f) if f == "categories"));
    }

    #[test]
    fn non_array_or_empty_categories_is_schema_error() {
        for inner in [r#"{"categories": {}}"#, r#"{"categories": []}"#, r#"[1, 2]"#] {
            let err = parse(&envelope(inner)).unwrap_err();
            assert!(matches!(err, ParseError::Schema(ref f) if f == "categories"), "{inner}");
        }
    }

    #[test]
    fn wrong_items_type_reports_category_path() {
        let inner = r#"{"categories":[
            {"original_name":"a","translated_name":"A","items":[]},
            {"original_name":"b","translated_name":"B","items":"none"}
        ]}"#;

        let (kind, path) = decode_err(inner);
        assert_eq!(kind, DecodeErrorKind::TypeMismatch);
        assert_eq!(path, "categories[1].items");
    }

    #[test]
    fn missing_item_field_reports_item_path() {
        let inner = r#"{"categories":[{"original_name":"a","translated_name":"A","items":[
            {"original_name":"x","translated_name":"X"},
            {"original_name":"y"}
        ]}]}"#;

        let (kind, path) = decode_err(inner);
        assert_eq!(kind, DecodeErrorKind::MissingField);
        assert_eq!(path, "categories[0].items[1].translated_name");
    }

    #[test]
    fn string_price_is_type_mismatch() {
        let inner = r#"{"categories":[{"original_name":"a","translated_name":"A","items":[
            {"original_name":"x","translated_name":"X","price":"28元"}
        ]}]}"#;

        let err = parse(&envelope(inner)).unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::TypeMismatch));
        assert_eq!(err.path(), Some("categories[0].items[0].price"));
        assert!(err.to_string().contains("expected integer, found string"));
    }

    #[test]
    fn blank_category_translation_is_rejected() {
        let inner = r#"{"categories":[{"original_name":"a","translated_name":"  ","items":[]}]}"#;
        let (kind, path) = decode_err(inner);
        assert_eq!(kind, DecodeErrorKind::MissingField);
        assert_eq!(path, "categories[0].translated_name");
    }

    #[test]
    fn truncated_document_is_corrupted() {
        let (kind, path) = decode_err("```json\n{\"categories\": [{\"original_name\": \n```");
        assert_eq!(kind, DecodeErrorKind::Corrupted);
        assert_eq!(path, "$");
    }

    #[test]
    fn commentary_without_fence_is_not_guessed() {
        let (kind, _) = decode_err(&format!("Here you go: {NOODLES}"));
        assert_eq!(kind, DecodeErrorKind::Corrupted);
    }
}
