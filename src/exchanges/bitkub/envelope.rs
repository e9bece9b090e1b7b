use crate::core::errors::ExchangeError;
use crate::exchanges::bitkub::error_codes::api_error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard reply: `{"error": 0, "result": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub error: i64,
    pub result: T,
}

/// Page cursor attached to history endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub last: u32,
    #[serde(default)]
    pub next: Option<u32>,
    #[serde(default)]
    pub prev: Option<u32>,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.next.is_some_and(|next| next > self.page)
    }
}

/// Envelope with a list result and a page cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub error: i64,
    pub result: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Reply that carries only the error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub error: i64,
}

/// Parse the body and fail on a non-zero `error` before touching `result`,
/// so error replies with a missing or odd `result` still map to the code.
fn checked_value(body: &str) -> Result<Value, ExchangeError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExchangeError::malformed(format!("Invalid JSON: {}", e), body))?;

    let code = value
        .get("error")
        .and_then(Value::as_i64)
        .ok_or_else(|| ExchangeError::malformed("Missing integer `error` field", body))?;

    if code != 0 {
        return Err(api_error(code));
    }
    Ok(value)
}

fn typed<T: DeserializeOwned>(value: Value, body: &str) -> Result<T, ExchangeError> {
    serde_json::from_value(value)
        .map_err(|e| ExchangeError::malformed(format!("Unexpected result shape: {}", e), body))
}

/// Decode `{error, result}` into the result.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ExchangeError> {
    let value = checked_value(body)?;
    typed::<Envelope<T>>(value, body).map(|envelope| envelope.result)
}

/// Decode `{error, result: [...], pagination}`.
pub fn decode_paginated<T: DeserializeOwned>(body: &str) -> Result<Paginated<T>, ExchangeError> {
    let value = checked_value(body)?;
    typed(value, body)
}

/// Decode an `{error}`-only reply.
pub fn decode_ack(body: &str) -> Result<Ack, ExchangeError> {
    let value = checked_value(body)?;
    typed(value, body)
}

/// Decode an endpoint that answers without an envelope (plain array or map).
pub fn decode_bare<T: DeserializeOwned>(body: &str) -> Result<T, ExchangeError> {
    serde_json::from_str(body)
        .map_err(|e| ExchangeError::malformed(format!("Invalid JSON: {}", e), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use crate::core::errors::ErrorCategory;
    use std::collections::HashMap;

    #[test]
    fn success_envelope_yields_result() {
        let result: HashMap<String, f64> =
            decode_envelope(r#"{"error":0,"result":{"THB":188379.27,"BTC":0.0}}"#).unwrap();
        assert_eq!(result["THB"], 188_379.27);
    }

    #[test]
    fn error_code_wins_over_result_shape() {
        let err = decode_envelope::<Vec<String>>(r#"{"error":18}"#).unwrap_err();
        match err {
            ExchangeError::ApiError {
                code,
                category,
                ref message,
            } => {
                assert_eq!(code, 18);
                assert_eq!(category, ErrorCategory::ResourceState);
                assert_eq!(message, "Insufficient balance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_with_mismatched_result_is_still_api_error() {
        let err = decode_envelope::<Vec<u32>>(r#"{"error":3,"result":"nope"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Application);
    }

    #[test]
    fn unknown_code_is_unrecognized() {
        let err = decode_ack(r#"{"error":9999}"#).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::ApiError {
                code: 9999,
                category: ErrorCategory::Unrecognized,
                ..
            }
        ));
    }

    #[test]
    fn malformed_json_is_not_an_api_error() {
        let err = decode_envelope::<Value>("<html>502</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.raw_body(), Some("<html>502</html>"));
    }

    #[test]
    fn missing_error_field_is_malformed() {
        let err = decode_envelope::<Value>(r#"{"result":[]}"#).unwrap_err();
        assert!(matches!(err, ExchangeError::DeserializationError { .. }));
    }

    #[test]
    fn wrong_result_shape_on_success_is_malformed() {
        let err = decode_envelope::<Vec<u32>>(r#"{"error":0,"result":{"a":1}}"#).unwrap_err();
        assert!(matches!(err, ExchangeError::DeserializationError { .. }));
    }

    #[test]
    fn paginated_reply_keeps_cursor() {
        let page: Paginated<Value> = decode_paginated(
            r#"{"error":0,"result":[{"txn_id":"a"}],"pagination":{"page":1,"last":3,"next":2}}"#,
        )
        .unwrap();
        assert_eq!(page.result.len(), 1);
        assert_eq!(page.pagination.last, 3);
        assert!(page.pagination.has_next());
        assert_eq!(page.pagination.prev, None);
    }

    #[test]
    fn ack_accepts_error_only_body() {
        assert_eq!(decode_ack(r#"{"error":0}"#).unwrap(), Ack { error: 0 });
    }

    #[test]
    fn bare_bodies_skip_the_envelope() {
        let statuses: Vec<HashMap<String, String>> =
            decode_bare(r#"[{"name":"Non-secure endpoints","status":"ok","message":""}]"#)
                .unwrap();
        assert_eq!(statuses[0]["status"], "ok");
    }

    #[test]
    fn serialized_envelopes_decode_to_the_same_result() {
        let envelope = Envelope {
            error: 0,
            result: vec!["THB_BTC".to_string(), "THB_ETH".to_string()],
        };
        let body = serde_json::to_string(&envelope).unwrap();
        assert_eq!(body, r#"{"error":0,"result":["THB_BTC","THB_ETH"]}"#);
        let decoded: Vec<String> = decode_envelope(&body).unwrap();
        assert_eq!(decoded, envelope.result);

        let page = Paginated {
            error: 0,
            result: vec![7_u64, 8],
            pagination: Pagination {
                page: 1,
                last: 2,
                next: Some(2),
                prev: None,
            },
        };
        let body = serde_json::to_string(&page).unwrap();
        assert_eq!(decode_paginated::<u64>(&body).unwrap(), page);
    }

    #[test]
    fn serialized_error_envelope_still_maps_the_code() {
        let body = serde_json::to_string(&Envelope {
            error: 11,
            result: Value::Null,
        })
        .unwrap();
        let err = decode_envelope::<Vec<String>>(&body).unwrap_err();
        assert!(matches!(err, ExchangeError::ApiError { code: 11, .. }));
    }
}
