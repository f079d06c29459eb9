//! The boundary between generated operations and the network.
//!
//! # Design
//! The core only ever assembles `RequestDescriptor` values. Issuing the
//! request is delegated to a `Transport`, and whatever it returns (a response,
//! a future, a channel receipt) is handed back to the caller untouched. Any
//! `Fn(RequestDescriptor) -> R` is a transport, which keeps tests and custom
//! async clients trivial to plug in.

use crate::http::RequestDescriptor;

/// Issues the HTTP request described by a descriptor.
pub trait Transport {
    type Output;

    fn send(&self, request: RequestDescriptor) -> Self::Output;
}

impl<F, R> Transport for F
where
    F: Fn(RequestDescriptor) -> R,
{
    type Output = R;

    fn send(&self, request: RequestDescriptor) -> R {
        self(request)
    }
}

#[cfg(feature = "ureq")]
pub use blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use serde_json::Value;
    use tracing::debug;
    use ureq::http::{Request, Response};
    use ureq::typestate::{WithBody, WithoutBody};
    use ureq::{Agent, Body, RequestBuilder};
    use url::Url;

    use super::Transport;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpResponse, RequestDescriptor};
    use crate::template::display_value;

    /// Blocking transport backed by `ureq`.
    ///
    /// Non-2xx statuses come back as ordinary `HttpResponse` values. The
    /// `headers` and `params` options, when they are objects, become request
    /// headers and query parameters. `data` is sent as a JSON body for every
    /// verb except GET, HEAD and OPTIONS. Verbs outside the standard set go
    /// out as-is.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: Agent,
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            let agent = Agent::config_builder()
                .http_status_as_error(false)
                .allow_non_standard_methods(true)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl UreqTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_agent(agent: Agent) -> Self {
            Self { agent }
        }

        fn custom(&self, verb: &str, request: &RequestDescriptor) -> Result<Response<Body>, TransportError> {
            let mut url = Url::parse(&request.url).map_err(|e| TransportError::Network(e.to_string()))?;
            if let Some(Value::Object(params)) = request.options.get("params") {
                let mut pairs = url.query_pairs_mut();
                for (name, value) in params {
                    pairs.append_pair(name, &display_value(value));
                }
            }

            let mut builder = Request::builder()
                .method(verb)
                .uri(url.as_str())
                .header("content-type", "application/json");
            if let Some(Value::Object(headers)) = request.options.get("headers") {
                for (name, value) in headers {
                    builder = builder.header(name.as_str(), display_value(value));
                }
            }
            let body = json_body(request)?;
            let http_request = builder
                .body(&body[..])
                .map_err(|_| TransportError::UnsupportedMethod(verb.to_string()))?;
            self.agent
                .run(http_request)
                .map_err(|e| TransportError::Network(e.to_string()))
        }
    }

    impl Transport for UreqTransport {
        type Output = Result<HttpResponse, TransportError>;

        fn send(&self, request: RequestDescriptor) -> Self::Output {
            debug!(method = %request.method, url = %request.url, "sending request");

            let url = request.url.as_str();
            let mut response = match &request.method {
                HttpMethod::Get => without_body(self.agent.get(url), &request)?,
                HttpMethod::Head => without_body(self.agent.head(url), &request)?,
                HttpMethod::Options => without_body(self.agent.options(url), &request)?,
                HttpMethod::Delete => with_body(self.agent.delete(url).force_send_body(), &request)?,
                HttpMethod::Post => with_body(self.agent.post(url), &request)?,
                HttpMethod::Put => with_body(self.agent.put(url), &request)?,
                HttpMethod::Patch => with_body(self.agent.patch(url), &request)?,
                HttpMethod::Custom(verb) => self.custom(verb, &request)?,
            };

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| TransportError::Network(e.to_string()))?;
            debug!(status, "received response");

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }

    fn without_body(
        builder: RequestBuilder<WithoutBody>,
        request: &RequestDescriptor,
    ) -> Result<Response<Body>, TransportError> {
        decorate(builder, request)
            .call()
            .map_err(|e| TransportError::Network(e.to_string()))
    }

    fn with_body(
        builder: RequestBuilder<WithBody>,
        request: &RequestDescriptor,
    ) -> Result<Response<Body>, TransportError> {
        let body = json_body(request)?;
        decorate(builder, request)
            .content_type("application/json")
            .send(&body[..])
            .map_err(|e| TransportError::Network(e.to_string()))
    }

    fn json_body(request: &RequestDescriptor) -> Result<Vec<u8>, TransportError> {
        serde_json::to_vec(&request.data).map_err(|e| TransportError::Serialization(e.to_string()))
    }

    /// Apply the `headers` and `params` options to a request builder.
    fn decorate<B>(mut builder: RequestBuilder<B>, request: &RequestDescriptor) -> RequestBuilder<B> {
        if let Some(Value::Object(headers)) = request.options.get("headers") {
            for (name, value) in headers {
                builder = builder.header(name.as_str(), display_value(value));
            }
        }
        if let Some(Value::Object(params)) = request.options.get("params") {
            for (name, value) in params {
                builder = builder.query(name, display_value(value));
            }
        }
        builder
    }
}
