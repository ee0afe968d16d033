use serde_json::{Map, Value};

use super::error::{DecodeErrorKind, ParseError};
use crate::model::menu::{Category, Menu, MenuItem};

/// Strict decode of a pre-checked document. Errors carry paths like
/// `categories[1].items[0].price`.
pub(super) fn decode_menu(doc: &Value) -> Result<Menu, ParseError> {
    let categories = doc
        .get("categories")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::Schema("categories".into()))?;

    let mut out: Vec<Category> = Vec::with_capacity(categories.len());

    for (ci, raw) in categories.iter().enumerate() {
        let path = format!("categories[{ci}]");
        out.push(decode_category(raw, &path)?);
    }

    Ok(Menu { categories: out })
}

fn decode_category(raw: &Value, path: &str) -> Result<Category, ParseError> {
    let obj = as_object(raw, path)?;

    let original_name = required_str(obj, "original_name", path)?;
    let translated_name = required_str(obj, "translated_name", path)?;

    if translated_name.trim().is_empty() {
        return Err(ParseError::missing(
            format!("{path}.translated_name"),
            "category translated name is empty",
        ));
    }

    let items_path = format!("{path}.items");
    let items = match obj.get("items") {
        None | Some(Value::Null) => {
            return Err(ParseError::missing(items_path, "required field `items` is absent"));
        }
        Some(Value::Array(items)) => items,
        Some(other) => return Err(ParseError::mismatch(items_path, "array", kind_of(other))),
    };

    let mut menu_items: Vec<MenuItem> = Vec::with_capacity(items.len());

    for (ii, item) in items.iter().enumerate() {
        let item_path = format!("{items_path}[{ii}]");
        let item = as_object(item, &item_path)?;

        let item_original = required_str(item, "original_name", &item_path)?;
        let item_translated = required_str(item, "translated_name", &item_path)?;
        let price = optional_int(item, "price", &item_path)?;

        menu_items.push(MenuItem {
            id: MenuItem::derive_id(&original_name, &item_original),
            original_name: item_original,
            translated_name: item_translated,
            price,
            category: translated_name.clone(),
        });
    }

    Ok(Category {
        original_name,
        translated_name,
        items: menu_items,
    })
}

fn as_object<'a>(raw: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ParseError> {
    raw.as_object()
        .ok_or_else(|| ParseError::mismatch(path, "object", kind_of(raw)))
}

fn required_str(obj: &Map<String, Value>, key: &str, path: &str) -> Result<String, ParseError> {
    let field_path = format!("{path}.{key}");
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        None => Err(ParseError::missing(
            field_path,
            format!("required field `{key}` is absent"),
        )),
        Some(Value::Null) => Err(ParseError::missing(
            field_path,
            format!("required field `{key}` is null"),
        )),
        Some(other) => Err(ParseError::mismatch(field_path, "string", kind_of(other))),
    }
}

fn optional_int(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<i64>, ParseError> {
    let field_path = format!("{path}.{key}");
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_i64() {
                return Ok(Some(v));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(Some(f as i64))
                }
                _ => Err(ParseError::Decode {
                    kind: DecodeErrorKind::TypeMismatch,
                    path: field_path,
                    detail: format!("expected integer, found {n}"),
                }),
            }
        }
        Some(other) => Err(ParseError::mismatch(field_path, "integer", kind_of(other))),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
