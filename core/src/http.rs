//! Request and response values exchanged with a transport.
//!
//! # Design
//! The core never performs I/O. A generated operation assembles a
//! `RequestDescriptor` as plain data and hands it to whatever `Transport` the
//! surface was compiled with. `HttpResponse` is what the bundled blocking
//! transport hands back; other transports are free to return anything.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Caller-supplied request options, merged into every descriptor.
pub type RequestOptions = Map<String, Value>;

/// Keys the dispatcher always computes itself. Caller values are discarded.
pub const RESERVED_KEYS: [&str; 3] = ["method", "url", "data"];

/// HTTP verb of a generated operation.
///
/// Configuration documents may name any verb. Well-known ones get their own
/// variant; anything else is kept upper-cased in `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Custom(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Custom(verb) => verb,
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            other => HttpMethod::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let verb = String::deserialize(deserializer)?;
        Ok(HttpMethod::from(verb.as_str()))
    }
}

/// A concrete request produced by one call of a generated operation.
///
/// Serializes to a single flat object: `{method, url, data, ...options}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub data: Value,
    /// Every caller-supplied option except the reserved keys.
    #[serde(flatten)]
    pub options: RequestOptions,
}

impl RequestDescriptor {
    /// Assemble a descriptor, dropping any reserved keys from `overrides`.
    pub fn new(
        method: HttpMethod,
        url: String,
        data: Value,
        mut overrides: RequestOptions,
    ) -> Self {
        for key in RESERVED_KEYS {
            overrides.remove(key);
        }
        Self {
            method,
            url,
            data,
            options: overrides,
        }
    }

    /// The descriptor as one JSON object.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("method".to_string(), Value::String(self.method.to_string()));
        object.insert("url".to_string(), Value::String(self.url.clone()));
        object.insert("data".to_string(), self.data.clone());
        for (key, value) in &self.options {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}
