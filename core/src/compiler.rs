//! Turns a configuration document into a table of callable operations.
//!
//! # Design
//! `ApiCompiler` owns the transport and walks an `ApiConfig` once, eagerly,
//! producing an `ApiSurface`: namespaces keyed by name, each holding named
//! `Operation`s, both in the order they first appear in the document. A
//! surface is immutable after construction; picking up a new document means
//! compiling again.
//!
//! Invalid documents never fail `compile`. They are logged and produce an
//! empty surface. `try_compile` runs the same checks and returns the
//! `ConfigError` instead.

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::ApiConfig;
use crate::error::ConfigError;
use crate::http::{HttpMethod, RequestDescriptor, RequestOptions};
use crate::template;
use crate::transport::Transport;

/// Builds `ApiSurface`s that dispatch through a shared transport.
pub struct ApiCompiler<T> {
    transport: Arc<T>,
}

impl<T> Clone for ApiCompiler<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> ApiCompiler<T> {
    pub fn new(transport: T) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    pub fn from_shared(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Compile `doc`, degrading to an empty surface if it is invalid.
    pub fn compile(&self, doc: &Value) -> ApiSurface<T> {
        self.try_compile(doc).unwrap_or_else(|err| {
            error!("{err}");
            ApiSurface::empty()
        })
    }

    /// Parse `json` and compile it. Parse failures also yield an empty surface.
    pub fn compile_str(&self, json: &str) -> ApiSurface<T> {
        match serde_json::from_str::<Value>(json) {
            Ok(doc) => self.compile(&doc),
            Err(err) => {
                error!("{}", ConfigError::from(err));
                ApiSurface::empty()
            }
        }
    }

    /// Compile `doc`, returning the validation failure instead of logging it.
    pub fn try_compile(&self, doc: &Value) -> Result<ApiSurface<T>, ConfigError> {
        let config = ApiConfig::from_document(doc)?;
        Ok(self.build(&config))
    }

    /// Compile an already validated configuration.
    pub fn build(&self, config: &ApiConfig) -> ApiSurface<T> {
        let base_url: Arc<str> = Arc::from(config.base_url());
        let mut surface = ApiSurface::empty();

        for endpoint in &config.endpoints {
            let namespace = surface
                .namespaces
                .entry(endpoint.namespace.clone())
                .or_insert_with(Namespace::empty);
            let path: Arc<str> = Arc::from(endpoint.path.as_str());

            for (name, method) in &endpoint.methods {
                let operation = Operation {
                    method: method.clone(),
                    path: Arc::clone(&path),
                    base_url: Arc::clone(&base_url),
                    transport: Arc::clone(&self.transport),
                };
                if let Some(previous) = namespace.operations.insert(name.clone(), operation) {
                    warn!(
                        namespace = %endpoint.namespace,
                        operation = %name,
                        replaced = %previous.path,
                        path = %endpoint.path,
                        "operation redefined, keeping the later definition"
                    );
                }
            }
        }

        debug!(
            base_url = %base_url,
            namespaces = surface.len(),
            "compiled API surface"
        );
        surface
    }
}

/// The generated API: namespaces of callable operations.
pub struct ApiSurface<T> {
    namespaces: IndexMap<String, Namespace<T>>,
}

impl<T> ApiSurface<T> {
    pub fn empty() -> Self {
        Self {
            namespaces: IndexMap::new(),
        }
    }

    pub fn get(&self, namespace: &str) -> Option<&Namespace<T>> {
        self.namespaces.get(namespace)
    }

    pub fn operation(&self, namespace: &str, operation: &str) -> Option<&Operation<T>> {
        self.get(namespace).and_then(|ns| ns.get(operation))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &Namespace<T>)> {
        self.namespaces.iter().map(|(name, ns)| (name.as_str(), ns))
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

/// Panics if the namespace was not generated.
impl<T> Index<&str> for ApiSurface<T> {
    type Output = Namespace<T>;

    fn index(&self, namespace: &str) -> &Namespace<T> {
        self.get(namespace)
            .unwrap_or_else(|| panic!("no namespace `{namespace}` in API surface"))
    }
}

impl<T> fmt::Debug for ApiSurface<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.namespaces.iter()).finish()
    }
}

/// Operations grouped under one namespace key.
pub struct Namespace<T> {
    operations: IndexMap<String, Operation<T>>,
}

impl<T> Namespace<T> {
    fn empty() -> Self {
        Self {
            operations: IndexMap::new(),
        }
    }

    pub fn get(&self, operation: &str) -> Option<&Operation<T>> {
        self.operations.get(operation)
    }

    pub fn operations(&self) -> impl Iterator<Item = (&str, &Operation<T>)> {
        self.operations.iter().map(|(name, op)| (name.as_str(), op))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Panics if the operation was not generated.
impl<T> Index<&str> for Namespace<T> {
    type Output = Operation<T>;

    fn index(&self, operation: &str) -> &Operation<T> {
        self.get(operation)
            .unwrap_or_else(|| panic!("no operation `{operation}` in namespace"))
    }
}

impl<T> fmt::Debug for Namespace<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.operations.iter()).finish()
    }
}

/// One generated operation, bound to a verb and a path template.
pub struct Operation<T> {
    method: HttpMethod,
    path: Arc<str>,
    base_url: Arc<str>,
    transport: Arc<T>,
}

impl<T> Clone for Operation<T> {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            path: Arc::clone(&self.path),
            base_url: Arc::clone(&self.base_url),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl<T: Transport> Operation<T> {
    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    pub fn path_template(&self) -> &str {
        &self.path
    }

    /// Assemble the request this operation would send for `data`.
    ///
    /// `method`, `url` and `data` are always computed here; the same keys in
    /// `options` are discarded and every other key is passed through.
    pub fn build(&self, data: Value, options: RequestOptions) -> RequestDescriptor {
        let url = format!("{}{}", self.base_url, template::render(&self.path, &data));
        RequestDescriptor::new(self.method.clone(), url, data, options)
    }

    /// Send `data` with no extra request options.
    pub fn call(&self, data: Value) -> T::Output {
        self.call_with(data, RequestOptions::new())
    }

    /// Build the request and forward it to the transport exactly once.
    pub fn call_with(&self, data: Value, options: RequestOptions) -> T::Output {
        let request = self.build(data, options);
        debug!(method = %request.method, url = %request.url, "dispatching operation");
        self.transport.send(request)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;

    type Sent = Rc<RefCell<Vec<RequestDescriptor>>>;

    /// A compiler whose transport records every request and returns its index.
    fn recording() -> (ApiCompiler<impl Fn(RequestDescriptor) -> usize>, Sent) {
        let sent: Sent = Rc::default();
        let log = Rc::clone(&sent);
        let compiler = ApiCompiler::new(move |request: RequestDescriptor| {
            let mut log = log.borrow_mut();
            log.push(request);
            log.len() - 1
        });
        (compiler, sent)
    }

    fn options(value: Value) -> RequestOptions {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn invalid_documents_compile_to_empty_surface() {
        let (compiler, _) = recording();
        for doc in [
            json!(null),
            json!(""),
            json!({}),
            json!({"endpoints": {}}),
            json!({"host": "h"}),
        ] {
            assert!(compiler.compile(&doc).is_empty(), "{doc}");
        }
    }

    #[test]
    fn try_compile_reports_the_failure() {
        let (compiler, _) = recording();
        let err = compiler.try_compile(&json!({"host": "h"})).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFields));
        assert_eq!(err.to_string(), "JSON is missing host and/or endpoints!");
    }

    #[test]
    fn unparsable_json_compiles_to_empty_surface() {
        let (compiler, _) = recording();
        assert!(compiler.compile_str("{\"host\": ").is_empty());
    }

    #[test]
    fn minimal_document_yields_callable_operation() {
        let (compiler, sent) = recording();
        let surface = compiler.compile(&json!({
            "host": "h",
            "endpoints": {"/a/{x}": {"namespace": "n", "methods": {"op": "GET"}}}
        }));

        let op = surface.operation("n", "op").expect("operation generated");
        assert_eq!(op.method(), &HttpMethod::Get);
        assert_eq!(op.path_template(), "/a/{x}");
        assert_eq!(op.call(json!({"x": 1})), 0);
        assert_eq!(sent.borrow()[0].url, "http://h/a/1");
    }

    #[test]
    fn dispatches_scenario_request() {
        let (compiler, sent) = recording();
        let surface = compiler.compile(&json!({
            "host": "h",
            "endpoints": {"/p/{id}": {"namespace": "ns", "methods": {"get": "GET"}}}
        }));

        surface["ns"]["get"].call(json!({"id": 5}));

        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].to_value(),
            json!({"method": "GET", "url": "http://h/p/5", "data": {"id": 5}})
        );
    }

    #[test]
    fn computed_fields_override_caller_options() {
        let (compiler, sent) = recording();
        let surface = compiler.compile(&json!({
            "protocol": "https",
            "host": "api.example.com",
            "endpoints": {"/users/{id}": {"namespace": "users", "methods": {"updateUser": "PUT"}}}
        }));

        surface["users"]["updateUser"].call_with(
            json!({"id": 3, "name": "ada"}),
            options(json!({
                "method": "DELETE",
                "url": "http://evil",
                "data": "ignored",
                "headers": {"x-trace": "abc"},
                "timeout": 500
            })),
        );

        let sent = sent.borrow();
        let req = &sent[0];
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "https://api.example.com/users/3");
        assert_eq!(req.data, json!({"id": 3, "name": "ada"}));
        assert_eq!(req.options["headers"], json!({"x-trace": "abc"}));
        assert_eq!(req.options["timeout"], 500);
        assert_eq!(req.options.len(), 2);
    }

    #[test]
    fn missing_placeholder_field_is_not_an_error() {
        let (compiler, sent) = recording();
        let surface = compiler.compile(&json!({
            "host": "h",
            "endpoints": {"/users/{id}": {"namespace": "users", "methods": {"get": "GET"}}}
        }));

        surface["users"]["get"].call(json!({}));
        assert_eq!(sent.borrow()[0].url, "http://h/users/undefined");
    }

    #[test]
    fn shared_namespace_merges_operations() {
        let (compiler, _) = recording();
        let surface = compiler.compile(&json!({
            "host": "h",
            "endpoints": {
                "/users": {"namespace": "users", "methods": {"list": "GET", "create": "POST"}},
                "/users/{id}": {"namespace": "users", "methods": {"get": "GET", "remove": "DELETE"}}
            }
        }));

        assert_eq!(surface.len(), 1);
        let names: Vec<&str> = surface["users"].operations().map(|(name, _)| name).collect();
        assert_eq!(names, ["list", "create", "get", "remove"]);
        assert_eq!(surface["users"]["remove"].path_template(), "/users/{id}");
    }

    #[test]
    fn namespaces_follow_document_order() {
        let (compiler, _) = recording();
        let doc: Value = serde_json::from_str(
            r#"{
                "host": "h",
                "endpoints": {
                    "/z": {"namespace": "zeta", "methods": {"b": "GET"}},
                    "/a": {"namespace": "alpha", "methods": {"a": "GET"}},
                    "/m": {"namespace": "mid", "methods": {}}
                }
            }"#,
        )
        .unwrap();
        let surface = compiler.compile(&doc);

        let names: Vec<&str> = surface.namespaces().map(|(name, _)| name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn later_definition_wins_on_collision() {
        let (compiler, sent) = recording();
        let surface = compiler.compile(&json!({
            "host": "h",
            "endpoints": {
                "/v1/items": {"namespace": "items", "methods": {"list": "GET"}},
                "/v2/items": {"namespace": "items", "methods": {"list": "POST"}}
            }
        }));

        let list = &surface["items"]["list"];
        assert_eq!(list.method(), &HttpMethod::Post);
        list.call(json!({}));
        assert_eq!(sent.borrow()[0].url, "http://h/v2/items");
    }

    #[test]
    fn empty_methods_yield_empty_namespace() {
        let (compiler, _) = recording();
        let surface = compiler.compile(&json!({
            "host": "h",
            "endpoints": {"/health": {"namespace": "ops", "methods": {}}}
        }));

        assert_eq!(surface.len(), 1);
        assert!(surface["ops"].is_empty());
    }

    #[test]
    fn every_call_reaches_the_transport_once() {
        let (compiler, sent) = recording();
        let surface = compiler.compile(&json!({
            "host": "h",
            "endpoints": {"/ping": {"namespace": "ops", "methods": {"ping": "GET"}}}
        }));

        let ping = &surface["ops"]["ping"];
        assert_eq!(ping.call(json!({})), 0);
        assert_eq!(ping.call(json!({})), 1);
        assert_eq!(ping.call(json!({})), 2);
        assert_eq!(sent.borrow().len(), 3);
    }

    #[test]
    fn build_does_not_touch_the_transport() {
        let (compiler, sent) = recording();
        let surface = compiler.compile(&json!({
            "host": "h",
            "endpoints": {"/p/{id}": {"namespace": "ns", "methods": {"get": "get"}}}
        }));

        let req = surface["ns"]["get"].build(json!({"id": "x"}), RequestOptions::new());
        assert_eq!(req.url, "http://h/p/x");
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn surfaces_are_independent_of_later_documents() {
        let (compiler, sent) = recording();
        let first = compiler.compile(&json!({
            "host": "one",
            "endpoints": {"/p": {"namespace": "ns", "methods": {"get": "GET"}}}
        }));
        let second = compiler.compile(&json!({
            "host": "two",
            "endpoints": {"/p": {"namespace": "ns", "methods": {"get": "GET"}}}
        }));

        first["ns"]["get"].call(json!({}));
        second["ns"]["get"].call(json!({}));
        let urls: Vec<String> = sent.borrow().iter().map(|r| r.url.clone()).collect();
        assert_eq!(urls, ["http://one/p", "http://two/p"]);
    }

    #[test]
    #[should_panic(expected = "no namespace `missing`")]
    fn indexing_unknown_namespace_panics() {
        let (compiler, _) = recording();
        let surface = compiler.compile(&json!(null));
        let _ = &surface["missing"];
    }

    #[test]
    fn lookup_of_unknown_operation_is_none() {
        let (compiler, _) = recording();
        let surface = compiler.compile(&json!({
            "host": "h",
            "endpoints": {"/p": {"namespace": "ns", "methods": {"get": "GET"}}}
        }));
        assert!(surface.operation("ns", "put").is_none());
        assert!(surface.operation("other", "get").is_none());
    }
}
