//! Transport boundary
//!
//! The app core never performs I/O itself. Workflows call a [`Transport`]
//! injected into the store; production frontends provide an HTTP client,
//! tests provide the fakes in `bulletin-testkit`.
//!
//! Payloads are JSON objects wrapping the data under a named field
//! (`{"posts": [...]}`, `{"post": {...}}`).

use crate::errors::TransportError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Remote API used by workflows.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET path`, returning the decoded JSON body.
    async fn get(&self, path: &str) -> Result<Value, TransportError>;

    /// `POST path` with a JSON body, returning the decoded JSON response.
    async fn post(&self, path: &str, body: Value) -> Result<Value, TransportError>;
}

/// Decode `payload[field]` into `T`.
///
/// A payload that is not an object, lacks the field, or holds a value of the
/// wrong shape is a [`TransportError::Decode`].
pub fn extract_field<T: DeserializeOwned>(
    path: &str,
    payload: Value,
    field: &str,
) -> Result<T, TransportError> {
    let decode_error = |reason: String| TransportError::Decode {
        path: path.to_string(),
        reason,
    };
    let Value::Object(mut object) = payload else {
        return Err(decode_error("expected a JSON object".to_string()));
    };
    let value = object
        .remove(field)
        .ok_or_else(|| decode_error(format!("missing field '{field}'")))?;
    serde_json::from_value(value).map_err(|e| decode_error(format!("field '{field}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_field() {
        let names: Vec<String> =
            extract_field("/users", json!({ "users": ["a", "b"] }), "users").unwrap();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_extract_field_errors_are_decode_errors() {
        let missing = extract_field::<Vec<String>>("/users", json!({}), "users").unwrap_err();
        assert!(matches!(missing, TransportError::Decode { .. }));
        assert!(missing.to_string().contains("missing field 'users'"));

        let not_object = extract_field::<Vec<String>>("/users", json!([1]), "users").unwrap_err();
        assert!(matches!(not_object, TransportError::Decode { .. }));

        let wrong_shape =
            extract_field::<Vec<String>>("/users", json!({ "users": 3 }), "users").unwrap_err();
        assert_eq!(wrong_shape.path(), "/users");
    }
}
