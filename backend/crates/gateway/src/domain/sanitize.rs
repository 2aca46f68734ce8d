//! Input sanitization for JSON bodies
//!
//! Two rules, applied recursively:
//! - operator injection: a leading `$` and every `.` in object keys become `_`
//! - markup injection: `<` and `>` in string values are HTML-escaped

use serde_json::{Map, Value};

const REPLACEMENT: char = '_';

/// Sanitize a JSON value in place; returns whether anything changed
pub fn sanitize_json(value: &mut Value) -> bool {
    match value {
        Value::Object(map) => sanitize_object(map),
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |changed, item| sanitize_json(item) | changed),
        Value::String(text) => match escape_markup(text) {
            Some(escaped) => {
                *text = escaped;
                true
            }
            None => false,
        },
        _ => false,
    }
}

fn sanitize_object(map: &mut Map<String, Value>) -> bool {
    let mut changed = false;
    let entries = std::mem::take(map);

    for (key, mut value) in entries {
        changed |= sanitize_json(&mut value);
        let key = match sanitize_key(&key) {
            Some(clean) => {
                changed = true;
                clean
            }
            None => key,
        };
        map.insert(key, value);
    }

    changed
}

fn sanitize_key(key: &str) -> Option<String> {
    if !key.starts_with('$') && !key.contains('.') {
        return None;
    }

    let mut clean = String::with_capacity(key.len());
    for (i, c) in key.chars().enumerate() {
        if (i == 0 && c == '$') || c == '.' {
            clean.push(REPLACEMENT);
        } else {
            clean.push(c);
        }
    }
    Some(clean)
}

fn escape_markup(text: &str) -> Option<String> {
    if !text.contains(['<', '>']) {
        return None;
    }
    Some(text.replace('<', "&lt;").replace('>', "&gt;"))
}
