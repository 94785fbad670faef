use dispatch_core::prelude::*;
use serde_json::Value;

const SUCCESS_CODES: [i64; 2] = [0, 200];

/// Unwraps the backend's `{ code, message, data }` envelope.
///
/// A success code yields `data` (missing `data` is `null`). Any other code
/// fails the call with a `TransportException` carrying the envelope's
/// message. The business code is not an `ApiError` code: it travels in
/// `body()` as the envelope without its `data`. Payloads that are not an
/// envelope pass through untouched.
pub fn unwrap_envelope() -> impl ResponseInterceptor {
    map_response(unwrap)
}

fn unwrap(_meta: &ResponseMeta, payload: Value) -> Result<Value, ApiError> {
    let Value::Object(mut obj) = payload else {
        return Ok(payload);
    };
    let code = match obj.get("code").and_then(Value::as_i64) {
        Some(code) if obj.contains_key("data") || obj.contains_key("message") => code,
        _ => return Ok(Value::Object(obj)),
    };
    if SUCCESS_CODES.contains(&code) {
        return Ok(obj.remove("data").unwrap_or(Value::Null));
    }

    let message = obj
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("request rejected with code {code}"));
    obj.remove("data");
    Err(ApiError::exception(message).with_body(Value::Object(obj).to_string()))
}
