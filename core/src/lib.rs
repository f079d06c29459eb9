//! Declarative HTTP API client.
//!
//! # Overview
//! A JSON document names a host, a protocol and a set of path templates, each
//! grouped under a namespace with named operations. `ApiCompiler` turns that
//! document into an `ApiSurface` of callable operations, so
//! `surface["users"]["getUser"].call(json!({"id": 7}))` issues
//! `GET http://host/users/7` through the injected transport.
//!
//! # Design
//! - The core never performs I/O. Operations assemble a `RequestDescriptor`
//!   and pass it to a `Transport`, returning whatever the transport returns.
//! - Compilation is eager and fail-soft: an invalid document is logged and
//!   yields an empty surface. `try_compile` exposes the error instead.
//! - Document order is preserved, so namespace merging and the last-wins
//!   rule for repeated operation names are deterministic.
//! - `UreqTransport` (feature `ureq`, on by default) is a ready-made blocking
//!   transport.

pub mod compiler;
pub mod config;
pub mod error;
pub mod http;
pub mod template;
pub mod transport;

pub use compiler::{ApiCompiler, ApiSurface, Namespace, Operation};
pub use config::{ApiConfig, ConfigStore, Endpoint};
pub use error::{ConfigError, TransportError};
pub use http::{HttpMethod, HttpResponse, RequestDescriptor, RequestOptions};
pub use template::render;
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
