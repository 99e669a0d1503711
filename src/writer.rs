//! JSON response encoding.

use serde::Serialize;

use crate::types::{Error, Result};

/// Content type set on every JSON response.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Outgoing response: header metadata plus a body.
pub trait ResponseSink {
    /// Set a header, replacing any previous value of the same name.
    fn set_header(&mut self, name: &str, value: &str);

    fn write_body(&mut self, bytes: &[u8]) -> std::io::Result<()>;
}

/// Serialize `data` and write it to `sink` with a JSON content type.
///
/// Serialization happens before anything reaches the sink, so a failure
/// leaves the sink untouched.
pub fn write<S, T>(sink: &mut S, data: &T) -> Result<()>
where
    S: ResponseSink + ?Sized,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(data).map_err(Error::Encode)?;

    sink.set_header("Content-Type", CONTENT_TYPE_JSON);
    sink.write_body(&body)?;
    Ok(())
}

/// In-memory [`ResponseSink`]. Header names are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct ResponseRecorder {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

impl ResponseSink for ResponseRecorder {
    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn write_body(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.body.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct TestType {
        foo: String,
    }

    #[test]
    fn test_write_sets_content_type_and_body() {
        let mut rec = ResponseRecorder::new();
        write(&mut rec, &TestType { foo: "bar".into() }).unwrap();

        assert_eq!(rec.header("content-type"), Some(CONTENT_TYPE_JSON));
        assert_eq!(rec.body(), br#"{"foo":"bar"}"#);
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut rec = ResponseRecorder::new();
        rec.set_header("content-type", "text/plain");
        write(&mut rec, &1).unwrap();
        assert_eq!(rec.header("Content-Type"), Some(CONTENT_TYPE_JSON));
        assert_eq!(rec.headers.len(), 1);
    }

    #[test]
    fn test_unserializable_data_is_encode_error() {
        let mut data = HashMap::new();
        data.insert((1, 2), "tuple keys are not strings");

        let mut rec = ResponseRecorder::new();
        let err = write(&mut rec, &data).unwrap_err();

        assert!(matches!(err, Error::Encode(_)));
        assert_eq!(rec.header("Content-Type"), None);
        assert!(rec.body().is_empty());
    }
}
