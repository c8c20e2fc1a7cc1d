//! Runtime argument binding.
//!
//! A wrapped operation describes its call-site arguments as a `Serialize`
//! struct; constructing that struct is the Rust equivalent of binding a
//! signature with defaults applied, since every parameter is necessarily
//! present. `bind` turns the struct into a name → value map that resolvers
//! and data templates read from. Model values become plain JSON here, so the
//! rest of the layer never sees framework-specific types.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::BindError;

/// Bind an argument struct to its name → value map.
///
/// Fails when the type does not serialize to a JSON object (a tuple, a bare
/// scalar, a list); that is a programmer error and propagates.
pub fn bind<A>(args: &A) -> Result<Map<String, Value>, BindError>
where
    A: Serialize + ?Sized,
{
    match serde_json::to_value(args)? {
        Value::Object(map) => Ok(map),
        other => Err(BindError::NotAnObject {
            kind: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize)]
    struct ListArgs<'a> {
        auth_token: &'a str,
        event_id: i64,
        page: u32,
    }

    #[test]
    fn binds_every_named_argument() {
        let map = bind(&ListArgs {
            auth_token: "abc",
            event_id: 3,
            page: 0,
        })
        .unwrap();
        assert_eq!(map.get("auth_token"), Some(&json!("abc")));
        assert_eq!(map.get("event_id"), Some(&json!(3)));
        assert_eq!(map.get("page"), Some(&json!(0)));
    }

    #[test]
    fn rejects_non_object_shapes() {
        let err = bind(&42_u32).unwrap_err();
        assert!(matches!(err, BindError::NotAnObject { kind: "a number" }));

        let err = bind(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, BindError::NotAnObject { kind: "an array" }));
    }

    #[test]
    fn nested_models_become_plain_json() {
        #[derive(Serialize)]
        struct Payload {
            title: String,
        }
        #[derive(Serialize)]
        struct Args {
            event: Payload,
        }
        let map = bind(&Args {
            event: Payload {
                title: "Rust Meetup".into(),
            },
        })
        .unwrap();
        assert_eq!(map["event"], json!({"title": "Rust Meetup"}));
    }
}
