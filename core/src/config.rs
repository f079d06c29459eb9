//! Configuration documents and the store that holds the active one.
//!
//! # Design
//! A document arrives as raw JSON so that every shape a user can hand in,
//! including `null` and empty strings, can be validated. `ApiConfig` is the
//! checked, typed form the compiler walks. Endpoints and their methods are
//! kept as ordered sequences in document order; later entries override
//! earlier ones when operation names collide.

use std::path::Path;

use serde_json::{Map, Value};

use crate::compiler::{ApiCompiler, ApiSurface};
use crate::error::ConfigError;
use crate::http::HttpMethod;
use crate::template::{display_value, ABSENT};
use crate::transport::Transport;

pub const DEFAULT_PROTOCOL: &str = "http";

/// A validated configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub protocol: String,
    pub host: String,
    pub endpoints: Vec<Endpoint>,
}

/// One path template and the operations reachable at it.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub path: String,
    pub namespace: String,
    pub methods: Vec<(String, HttpMethod)>,
}

impl ApiConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            host: host.into(),
            endpoints: Vec::new(),
        }
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// `protocol://host`, the prefix of every generated URL.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.host)
    }

    /// Validate a raw document and convert it into an `ApiConfig`.
    ///
    /// Only presence is checked. Values of the wrong type are converted to
    /// strings rather than rejected, and an `endpoints` value that is not an
    /// object has no entries.
    pub fn from_document(doc: &Value) -> Result<Self, ConfigError> {
        let fields = match doc {
            _ if is_falsy(doc) => return Err(ConfigError::Empty),
            // An array whose joined text is empty compares loosely equal to "".
            Value::Array(_) if display_value(doc).is_empty() => return Err(ConfigError::Empty),
            Value::Object(fields) if fields.is_empty() => return Err(ConfigError::Malformed),
            Value::Bool(_) | Value::Number(_) => return Err(ConfigError::Malformed),
            Value::Object(fields) => fields,
            _ => return Err(ConfigError::MissingFields),
        };

        let (Some(host), Some(endpoints)) = (fields.get("host"), fields.get("endpoints")) else {
            return Err(ConfigError::MissingFields);
        };
        let protocol = match fields.get("protocol") {
            Some(protocol) if !is_falsy(protocol) => display_value(protocol),
            _ => DEFAULT_PROTOCOL.to_string(),
        };

        Ok(Self {
            protocol,
            host: display_value(host),
            endpoints: match endpoints {
                Value::Object(endpoints) => endpoints
                    .iter()
                    .map(|(path, entry)| Endpoint::from_entry(path, entry))
                    .collect(),
                _ => Vec::new(),
            },
        })
    }
}

impl Endpoint {
    pub fn new(path: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, name: impl Into<String>, method: HttpMethod) -> Self {
        self.methods.push((name.into(), method));
        self
    }

    fn from_entry(path: &str, entry: &Value) -> Self {
        let namespace = entry
            .get("namespace")
            .map_or_else(|| ABSENT.to_string(), display_value);
        let methods = match entry.get("methods") {
            Some(Value::Object(methods)) => methods
                .iter()
                .map(|(name, verb)| (name.clone(), HttpMethod::from(display_value(verb).as_str())))
                .collect(),
            _ => Vec::new(),
        };
        Self {
            path: path.to_string(),
            namespace,
            methods,
        }
    }
}

/// Holds the active configuration document.
///
/// Setting a document performs no validation. Surfaces already compiled from
/// an earlier document are unaffected by later sets.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    document: Value,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            document: Value::Object(Map::new()),
        }
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(document: Value) -> Self {
        Self { document }
    }

    pub fn set_config(&mut self, document: Value) {
        self.document = document;
    }

    pub fn config(&self) -> &Value {
        &self.document
    }

    /// Parse `json` and store it. The stored document is left untouched on error.
    pub fn load_json_str(&mut self, json: &str) -> Result<(), ConfigError> {
        self.document = serde_json::from_str(json)?;
        Ok(())
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        self.load_json_str(&raw)
    }

    /// Compile the current document. See [`ApiCompiler::compile`].
    pub fn compile<T: Transport>(&self, compiler: &ApiCompiler<T>) -> ApiSurface<T> {
        compiler.compile(&self.document)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
