//! Cacheable snapshot of an HTTP response.

use crate::codec::{RESPONSE_TAG, TYPE_TAG_FIELD};
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use folio_core::{FolioError, FolioResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Largest body [`CachedResponse::from_response`] will buffer.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// An HTTP response reduced to the parts the cache stores.
///
/// Headers form a mapping: a repeated header name keeps its last value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Body as text.
    pub data: String,
    /// Header name to value.
    pub headers: BTreeMap<String, String>,
    /// Content type without parameters, e.g. `application/json`.
    pub mimetype: Option<String>,
    /// Whether the body should be streamed to the client untouched.
    pub direct_passthrough: bool,
}

impl CachedResponse {
    /// Creates a response with a status and body and nothing else.
    pub fn new(status_code: u16, data: impl Into<String>) -> Self {
        Self {
            status_code,
            data: data.into(),
            headers: BTreeMap::new(),
            mimetype: None,
            direct_passthrough: false,
        }
    }

    /// Creates an `application/json` response from a JSON document.
    #[must_use]
    pub fn json(status_code: u16, body: &Value) -> Self {
        Self::new(status_code, body.to_string()).with_mimetype("application/json")
    }

    /// Adds (or replaces) a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    /// Sets the pass-through flag.
    #[must_use]
    pub const fn with_direct_passthrough(mut self, direct_passthrough: bool) -> Self {
        self.direct_passthrough = direct_passthrough;
        self
    }

    /// Captures an axum response, buffering its body.
    ///
    /// Bodies that are not valid UTF-8 are converted lossily.
    pub async fn from_response(response: Response) -> FolioResult<Self> {
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| FolioError::Serialization(format!("Failed to read response body: {}", e)))?;

        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let mimetype = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_string());

        Ok(Self {
            status_code: parts.status.as_u16(),
            data: String::from_utf8_lossy(&bytes).into_owned(),
            headers,
            mimetype,
            direct_passthrough: false,
        })
    }

    /// Encodes this response as a tagged mapping.
    pub(crate) fn to_tagged(&self) -> Value {
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();

        let mut map = Map::new();
        map.insert(TYPE_TAG_FIELD.to_string(), Value::String(RESPONSE_TAG.to_string()));
        map.insert("status_code".to_string(), Value::from(self.status_code));
        map.insert("data".to_string(), Value::String(self.data.clone()));
        map.insert("headers".to_string(), Value::Object(headers));
        map.insert(
            "mimetype".to_string(),
            self.mimetype.clone().map_or(Value::Null, Value::String),
        );
        map.insert("direct_passthrough".to_string(), Value::Bool(self.direct_passthrough));
        Value::Object(map)
    }

    /// Rebuilds a response from a tagged mapping.
    ///
    /// Returns `None` unless every field is present with the right type.
    pub(crate) fn from_tagged(map: &Map<String, Value>) -> Option<Self> {
        let status_code = map
            .get("status_code")?
            .as_u64()
            .and_then(|code| u16::try_from(code).ok())?;
        let data = map.get("data")?.as_str()?.to_string();

        let headers = map
            .get("headers")?
            .as_object()?
            .iter()
            .map(|(name, value)| value.as_str().map(|v| (name.clone(), v.to_string())))
            .collect::<Option<BTreeMap<_, _>>>()?;

        let mimetype = match map.get("mimetype") {
            None | Some(Value::Null) => None,
            Some(Value::String(mimetype)) => Some(mimetype.clone()),
            Some(_) => return None,
        };
        let direct_passthrough = map.get("direct_passthrough")?.as_bool()?;

        Some(Self {
            status_code,
            data,
            headers,
            mimetype,
            direct_passthrough,
        })
    }
}

/// Replays the snapshot. `direct_passthrough` has no axum counterpart and
/// is ignored.
impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.data));
        *response.status_mut() =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => debug!("Dropping unrepresentable cached header '{}'", name),
            }
        }

        if !headers.contains_key(CONTENT_TYPE) {
            if let Some(value) = self
                .mimetype
                .as_deref()
                .and_then(|m| HeaderValue::from_str(m).ok())
            {
                headers.insert(CONTENT_TYPE, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_into_response() {
        let cached = CachedResponse::new(201, "created")
            .with_header("X-Book-Id", "12")
            .with_mimetype("text/plain");

        let response = cached.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-book-id"], "12");
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"created");
    }

    #[test]
    fn test_explicit_content_type_header_wins() {
        let response = CachedResponse::new(200, "{}")
            .with_header("content-type", "application/json; charset=utf-8")
            .with_mimetype("application/json")
            .into_response();
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
    }

    #[test]
    fn test_invalid_status_and_header_are_tolerated() {
        let response = CachedResponse::new(1000, "")
            .with_header("bad header", "x")
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().is_empty());
    }

    #[tokio::test]
    async fn test_from_response() {
        let response = (
            StatusCode::OK,
            [("x-total-count", "2")],
            axum::Json(json!([{"book_id": 1}, {"book_id": 2}])),
        )
            .into_response();

        let cached = CachedResponse::from_response(response).await.unwrap();
        assert_eq!(cached.status_code, 200);
        assert_eq!(cached.data, r#"[{"book_id":1},{"book_id":2}]"#);
        assert_eq!(cached.mimetype.as_deref(), Some("application/json"));
        assert_eq!(cached.headers.get("x-total-count").map(String::as_str), Some("2"));
        assert!(!cached.direct_passthrough);
    }

    #[tokio::test]
    async fn test_capture_and_replay() {
        let original = CachedResponse::json(200, &json!({"message": "ok"}))
            .with_header("x-cache", "miss");

        let replayed = CachedResponse::from_response(original.clone().into_response())
            .await
            .unwrap();
        assert_eq!(replayed.status_code, original.status_code);
        assert_eq!(replayed.data, original.data);
        assert_eq!(replayed.mimetype, original.mimetype);
        assert_eq!(replayed.headers.get("x-cache").map(String::as_str), Some("miss"));
    }

    #[test]
    fn test_from_tagged_requires_all_fields() {
        let mut map = CachedResponse::new(200, "x").to_tagged();
        let object = map.as_object_mut().unwrap();
        assert!(CachedResponse::from_tagged(object).is_some());

        object.remove("direct_passthrough");
        assert!(CachedResponse::from_tagged(object).is_none());
    }

    #[test]
    fn test_from_tagged_rejects_out_of_range_status() {
        let mut map = CachedResponse::new(200, "x").to_tagged();
        let object = map.as_object_mut().unwrap();
        object.insert("status_code".to_string(), json!(70000));
        assert!(CachedResponse::from_tagged(object).is_none());
    }
}
