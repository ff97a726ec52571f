//! Response envelope used by the monitoring backend
//!
//! Successful responses are wrapped in an object carrying `data`, optionally
//! next to `isSuccess`, `status_code` and `message`. The stock backend sends
//! only `{"data": ...}`. Some deployments sit behind a proxy that strips the
//! wrapper, so bare payloads are accepted too.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extract the payload from a response body, unwrapping the envelope if present
pub fn unwrap_payload(body: Value) -> Value {
    match body {
        Value::Object(mut map) if is_envelope(&map) => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

/// Decode the payload of a response body into `T`
pub fn decode_payload<T: DeserializeOwned>(body: Value) -> serde_json::Result<T> {
    serde_json::from_value(unwrap_payload(body))
}

/// `false` only when the envelope explicitly reports failure
pub fn envelope_success(body: &Value) -> bool {
    body.get("isSuccess").and_then(Value::as_bool).unwrap_or(true)
}

const ENVELOPE_KEYS: [&str; 3] = ["isSuccess", "status_code", "message"];

fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("data")
        && map
            .keys()
            .all(|key| key == "data" || ENVELOPE_KEYS.contains(&key.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_is_unwrapped() {
        let body = json!({
            "isSuccess": true,
            "status_code": 200,
            "message": "OK",
            "data": [{"aid": 1}]
        });
        assert_eq!(unwrap_payload(body), json!([{"aid": 1}]));
    }

    #[test]
    fn test_data_only_envelope_is_unwrapped() {
        assert_eq!(unwrap_payload(json!({"data": [{"aid": 1}]})), json!([{"aid": 1}]));
        assert_eq!(unwrap_payload(json!({"data": null})), Value::Null);
    }

    #[test]
    fn test_bare_payload_passes_through() {
        let body = json!({"auth_token": "t", "_user_data": {"userType": 1}});
        assert_eq!(unwrap_payload(body.clone()), body);
    }

    #[test]
    fn test_object_with_data_field_but_no_envelope_markers() {
        let body = json!({"data": 1, "other": 2});
        assert_eq!(unwrap_payload(body.clone()), body);
    }

    #[test]
    fn test_envelope_success_flag() {
        assert!(envelope_success(&json!({"status": "up"})));
        assert!(!envelope_success(&json!({"isSuccess": false, "data": null})));
    }
}
