use crate::codec::{self, Format};
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::HeaderMap;
use std::fmt;

pub(crate) const BODY_PREVIEW_BYTES: usize = 2 * 1024;

fn is_sensitive_header_name(name: &HeaderName) -> bool {
    // HeaderName::as_str() is normalized to lowercase.
    let n = name.as_str();
    matches!(n, "authorization" | "proxy-authorization" | "cookie" | "set-cookie")
        // Common vendor patterns
        || n.contains("token")
        || n.contains("secret")
        || n.contains("api-key")
        || n.contains("apikey")
        || n.ends_with("-key")
}

fn header_value_for_debug(name: &HeaderName, value: &HeaderValue) -> String {
    if is_sensitive_header_name(name) {
        "<redacted>".to_string()
    } else {
        value.to_str().unwrap_or("<non-utf8>").to_string()
    }
}

/// `Display` adapter for logging a header map with secrets redacted.
pub struct RedactedHeaders<'a>(pub &'a HeaderMap);

impl fmt::Display for RedactedHeaders<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", k, header_value_for_debug(k, v))?;
        }
        f.write_str("}")
    }
}

/// Truncated body preview, base64 for non-text content types.
///
/// `total_len` is the size of the full body when `body` is only its prefix.
pub(crate) fn body_preview(headers: &HeaderMap, body: &[u8], max_bytes: usize, total_len: usize) -> String {
    let ct = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|ct| !ct.is_empty());
    codec::preview_bytes(Format::from_content_type(ct), body, max_bytes, total_len)
}
