//! Notification template rendering.
//!
//! Templates are plain HTML with `#Placeholder#` markers. Placeholder values
//! come from a flattened view of the document's summary JSON plus the action
//! context; nested JSON fields flatten to dotted keys
//! (`#Submitter.Name#`, `#ApprovalIdentifier.DocumentNumber#`).

use std::collections::HashMap;

/// Replaces every `#Key#` marker with its value. Unknown markers are left
/// in place so a missing field is visible in test renders instead of
/// silently disappearing.
pub fn render_template(template: &str, values: &HashMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in values {
        rendered = rendered.replace(&format!("#{}#", key), value);
    }
    rendered
}

/// Flattens a JSON value into placeholder keys.
///
/// Objects nest with `.`; arrays are indexed (`Lines.0.Amount`); scalars
/// render without JSON quoting.
pub fn flatten_json(value: &serde_json::Value, out: &mut HashMap<String, String>) {
    flatten_into("", value, out);
}

fn flatten_into(prefix: &str, value: &serde_json::Value, out: &mut HashMap<String, String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let key = pascal_case(key);
                let nested = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(&nested, child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(&format!("{}.{}", prefix, index), child, out);
            }
        }
        serde_json::Value::Null => {}
        serde_json::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}

/// Template keys are PascalCase regardless of the JSON field casing.
fn pascal_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
