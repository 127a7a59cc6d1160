//! Serialization codec.
//!
//! Converts a [`CacheValue`] into a JSON-safe tree for the key-value store
//! and reverses the transformation on read. Encoding is total: JSON-native
//! values pass through unchanged, responses get an explicit `_type` tag,
//! and anything opaque degrades to its textual representation.
//!
//! The opaque case is lossy. Decoding it yields the string, never the
//! original value.

use crate::response::CachedResponse;
use folio_core::FolioResult;
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Field carrying the type tag of a tagged mapping.
pub const TYPE_TAG_FIELD: &str = "_type";

/// Tag value marking an encoded [`CachedResponse`].
pub const RESPONSE_TAG: &str = "response";

/// Nesting depth past which a subtree is stored as its string fallback.
///
/// Kept below the recursion limit of `serde_json`'s parser (128) so that
/// every payload the encoder writes can be read back.
pub const MAX_DEPTH: usize = 96;

/// A value the cache can store.
///
/// JSON-native variants round-trip exactly. `Response` round-trips through
/// its tagged mapping. `Opaque` is stored as text and comes back as
/// [`CacheValue::String`].
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<CacheValue>),
    Object(BTreeMap<String, CacheValue>),
    Response(CachedResponse),
    Opaque(OpaqueValue),
}

impl CacheValue {
    /// Builds a number, or an opaque value for `NaN` and infinities.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(n) => Self::Number(n),
            None => Self::Opaque(OpaqueValue::new(value)),
        }
    }

    /// Converts any serializable value.
    ///
    /// Serialization failures (e.g. maps with non-string keys) fall back to
    /// the value's `Debug` text rather than failing.
    pub fn from_serialize<T: Serialize + fmt::Debug>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => Self::from(json),
            Err(e) => {
                tracing::debug!("Value not JSON-serializable, storing its text instead: {}", e);
                Self::Opaque(OpaqueValue::new(format!("{:?}", value)))
            }
        }
    }

    /// Returns the JSON-safe encoding of this value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        encode(self)
    }

    /// Returns the string slice if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the response if this is one.
    #[must_use]
    pub fn as_response(&self) -> Option<&CachedResponse> {
        match self {
            Self::Response(response) => Some(response),
            _ => None,
        }
    }

    /// Looks up a field of a mapping.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CacheValue> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Textual representation, used as the string fallback.
impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            other => fmt_nested(other, f),
        }
    }
}

// Like Display, but quotes strings so collections read unambiguously.
fn fmt_nested(value: &CacheValue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        CacheValue::Null => f.write_str("null"),
        CacheValue::Bool(b) => write!(f, "{}", b),
        CacheValue::Number(n) => write!(f, "{}", n),
        CacheValue::String(s) => write!(f, "{:?}", s),
        CacheValue::Opaque(opaque) => write!(f, "{}", opaque),
        CacheValue::Response(response) => write!(f, "<response [{}]>", response.status_code),
        CacheValue::Array(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                fmt_nested(item, f)?;
            }
            f.write_str("]")
        }
        CacheValue::Object(map) => {
            f.write_str("{")?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{:?}: ", key)?;
                fmt_nested(item, f)?;
            }
            f.write_str("}")
        }
    }
}

/// A value with no JSON form of its own.
///
/// Holds the value behind its `Display` implementation; the codec stores
/// whatever that renders. Equality compares the rendered text.
#[derive(Clone)]
pub struct OpaqueValue(Arc<dyn fmt::Display + Send + Sync>);

impl OpaqueValue {
    /// Wraps a value rendered through `Display`.
    pub fn new<T: fmt::Display + Send + Sync + 'static>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wraps a value rendered through `Debug`.
    pub fn from_debug<T: fmt::Debug + Send + Sync + 'static>(value: T) -> Self {
        Self(Arc::new(DebugRepr(value)))
    }

    /// The text this value is stored as.
    #[must_use]
    pub fn repr(&self) -> String {
        self.0.to_string()
    }
}

struct DebugRepr<T>(T);

impl<T: fmt::Debug> fmt::Display for DebugRepr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OpaqueValue").field(&self.repr()).finish()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        self.repr() == other.repr()
    }
}

/// Encodes a value into its JSON-safe tree.
#[must_use]
pub fn encode(value: &CacheValue) -> Value {
    encode_at(value, 0)
}

fn encode_at(value: &CacheValue, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::String(value.to_string());
    }

    match value {
        CacheValue::Null => Value::Null,
        CacheValue::Bool(b) => Value::Bool(*b),
        CacheValue::Number(n) => Value::Number(n.clone()),
        CacheValue::String(s) => Value::String(s.clone()),
        CacheValue::Array(items) => {
            Value::Array(items.iter().map(|item| encode_at(item, depth + 1)).collect())
        }
        CacheValue::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), encode_at(item, depth + 1)))
                .collect(),
        ),
        CacheValue::Response(response) => response.to_tagged(),
        CacheValue::Opaque(opaque) => Value::String(opaque.repr()),
    }
}

/// Decodes a JSON-safe tree produced by [`encode`].
///
/// A mapping tagged `"_type": "response"` with well-formed fields becomes a
/// [`CacheValue::Response`]; a tagged mapping with malformed fields stays a
/// plain mapping.
#[must_use]
pub fn decode(value: Value) -> CacheValue {
    match value {
        Value::Null => CacheValue::Null,
        Value::Bool(b) => CacheValue::Bool(b),
        Value::Number(n) => CacheValue::Number(n),
        Value::String(s) => CacheValue::String(s),
        Value::Array(items) => CacheValue::Array(items.into_iter().map(decode).collect()),
        Value::Object(map) => {
            if map.get(TYPE_TAG_FIELD).and_then(Value::as_str) == Some(RESPONSE_TAG) {
                if let Some(response) = CachedResponse::from_tagged(&map) {
                    return CacheValue::Response(response);
                }
            }
            CacheValue::Object(map.into_iter().map(|(key, item)| (key, decode(item))).collect())
        }
    }
}

/// Encodes a value and renders it as the store's wire text.
///
/// Infallible: [`encode`] is total and a `serde_json::Value` always prints.
#[must_use]
pub fn to_wire(value: &CacheValue) -> String {
    encode(value).to_string()
}

/// Parses wire text and decodes it.
pub fn from_wire(raw: &str) -> FolioResult<CacheValue> {
    let json: Value = serde_json::from_str(raw)?;
    Ok(decode(json))
}

// ============ Conversions ============

/// Structural conversion: no tag interpretation, see [`decode`] for that.
impl From<Value> for CacheValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for CacheValue {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<CacheValue>> From<Vec<T>> for CacheValue {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, CacheValue>> for CacheValue {
    fn from(map: BTreeMap<String, CacheValue>) -> Self {
        Self::Object(map)
    }
}

impl<T: Into<CacheValue>> From<Option<T>> for CacheValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<CachedResponse> for CacheValue {
    fn from(response: CachedResponse) -> Self {
        Self::Response(response)
    }
}

impl From<OpaqueValue> for CacheValue {
    fn from(opaque: OpaqueValue) -> Self {
        Self::Opaque(opaque)
    }
}
