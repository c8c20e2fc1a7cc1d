//! Cache key derivation.
//!
//! A key is `bilet:<unique_name>:cache:<sha256-hex>` where the digest covers
//! a canonical JSON rendering of the key-material map. Object keys are
//! sorted recursively, so two maps with equal content always hash the same
//! regardless of insertion order.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Namespace prefix shared by every cache key and tag index key.
pub const KEY_NAMESPACE: &str = "bilet";

/// Derive the store key for one cached computation.
pub fn make_key(unique_name: &str, parameters: &Map<String, Value>) -> String {
    let mut canonical = String::new();
    write_canonical(&mut canonical, &Value::Object(parameters.clone()));

    let digest = Sha256::digest(canonical.as_bytes());
    format!(
        "{KEY_NAMESPACE}:{unique_name}:cache:{}",
        hex::encode(digest)
    )
}

/// Store key of a tag's member set.
pub fn tag_key(tag: &str) -> String {
    format!("{KEY_NAMESPACE}:tag:{tag}")
}

/// Serialize a JSON value with object keys sorted at every level.
fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut names: Vec<&String> = map.keys().collect();
            names.sort();
            out.push('{');
            for (index, name) in names.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*name).clone()).to_string());
                out.push(':');
                write_canonical(out, &map[name.as_str()]);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
