use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Format {
    Binary,
    Text,
}

impl Format {
    /// Preview format picked from a Content-Type header value.
    pub fn from_content_type(ct: Option<&str>) -> Self {
        match ct {
            None => Format::Text,
            Some(ct) if ct.starts_with("application/json") || ct.starts_with("text/") => {
                Format::Text
            }
            Some(_) => Format::Binary,
        }
    }
}

pub trait FormatType {
    const FORMAT_TYPE: Format;
}

/// Appended when a preview leaves part of the body out.
pub(crate) const TRUNCATED: &str = "...";
const BINARY_PREVIEW_BYTES: usize = 768;

/// Bounded, printable rendering of a body that may itself be a prefix.
///
/// `total_len` is the size of the full body. Text is cut at `max_bytes` on a
/// character boundary; binary is shown as base64 of its first bytes.
pub(crate) fn preview_bytes(format: Format, bytes: &[u8], max_bytes: usize, total_len: usize) -> String {
    let total_len = total_len.max(bytes.len());
    match format {
        Format::Text => {
            let (text, used) = utf8_prefix(&bytes[..bytes.len().min(max_bytes)]);
            if used < total_len {
                format!("{text}{TRUNCATED}")
            } else {
                text.into_owned()
            }
        }
        Format::Binary => {
            let slice = &bytes[..bytes.len().min(max_bytes.min(BINARY_PREVIEW_BYTES))];
            let more = if slice.len() < total_len { TRUNCATED } else { "" };
            format!(
                "<non-text; {total_len} bytes; base64:{}{more}>",
                STANDARD_NO_PAD.encode(slice)
            )
        }
    }
}

/// Decodes a slice that may end inside a multi-byte character.
/// Returns the text and how many input bytes it covers.
fn utf8_prefix(bytes: &[u8]) -> (Cow<'_, str>, usize) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (Cow::Borrowed(s), bytes.len()),
        Err(e) if e.error_len().is_none() => {
            let end = e.valid_up_to();
            (String::from_utf8_lossy(&bytes[..end]), end)
        }
        Err(_) => (String::from_utf8_lossy(bytes), bytes.len()),
    }
}

pub trait ContentType {
    /// "" => no relevant Content-Type.
    const CONTENT_TYPE: &'static str;
}

pub trait Decodes<T>: ContentType + FormatType {
    type Error: std::error::Error + Send + Sync + 'static;
    fn decode(bytes: &Bytes) -> Result<T, Self::Error>;
}

pub trait Encodes<T: ?Sized>: ContentType + FormatType {
    type Error: std::error::Error + Send + Sync + 'static;
    fn encode(output: &T) -> Result<Bytes, Self::Error>;
}

pub struct Json;

impl ContentType for Json {
    const CONTENT_TYPE: &'static str = "application/json";
}

impl FormatType for Json {
    const FORMAT_TYPE: Format = Format::Text;
}

impl<T> Encodes<T> for Json
where
    T: Serialize + ?Sized,
{
    type Error = serde_json::Error;
    fn encode(output: &T) -> Result<Bytes, Self::Error> {
        serde_json::to_vec(output).map(Bytes::from)
    }
}

impl<T> Decodes<T> for Json
where
    T: DeserializeOwned,
{
    type Error = serde_json::Error;
    /// An empty body decodes as JSON `null`.
    fn decode(bytes: &Bytes) -> Result<T, Self::Error> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_slice(b"null");
        }
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn empty_body_is_null() {
        let v: Value = <Json as Decodes<Value>>::decode(&Bytes::new()).unwrap();
        assert_eq!(v, Value::Null);
        let v: Option<u32> = <Json as Decodes<Option<u32>>>::decode(&Bytes::from_static(b" \n")).unwrap();
        assert_eq!(v, None);
    }

    #[test]
    fn json_round_trips_through_bytes() {
        let b = <Json as Encodes<Value>>::encode(&json!({ "ids": [1, 2] })).unwrap();
        assert_eq!(&b[..], b"{\"ids\":[1,2]}");
        assert!(<Json as Decodes<Value>>::decode(&Bytes::from_static(b"{oops")).is_err());
    }

    #[test]
    fn previews_mark_truncation() {
        assert_eq!(
            preview_bytes(Format::Binary, &[0, 1, 2], 1024, 3),
            "<non-text; 3 bytes; base64:AAEC>"
        );
        assert_eq!(preview_bytes(Format::Text, b"hello world", 5, 11), "hello...");
        assert_eq!(preview_bytes(Format::Text, b"hello", 1024, 40), "hello...");
        assert_eq!(preview_bytes(Format::Text, b"", 1024, 0), "");
        assert_eq!(Format::from_content_type(Some("image/png")), Format::Binary);
        assert_eq!(Format::from_content_type(Some("application/json; charset=utf-8")), Format::Text);
    }

    #[test]
    fn text_preview_cuts_on_char_boundary() {
        // "é" is two bytes, so a cut at 5 lands inside the third one
        let s = "ééé";
        assert_eq!(preview_bytes(Format::Text, s.as_bytes(), 5, s.len()), "éé...");

        let s = "€".repeat(3000);
        let out = preview_bytes(Format::Text, s.as_bytes(), 8 * 1024, s.len());
        assert!(out.ends_with(TRUNCATED));
        assert!(!out.contains('\u{fffd}'));
        assert_eq!(out.trim_end_matches(TRUNCATED).chars().count(), 8 * 1024 / 3);
    }
}
