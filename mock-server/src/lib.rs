use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::any,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::debug;

/// What the server saw of a request, sent back as the response body.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    /// The request body parsed as JSON, `null` if empty or not JSON.
    pub body: Value,
}

pub type QueryParams = BTreeMap<String, String>;

pub fn app() -> Router {
    Router::new()
        .route("/status/{code}", any(status))
        .fallback(echo)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    method: Method,
    uri: Uri,
    Query(query): Query<QueryParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    Json(describe(method, &uri, query, &headers, &body))
}

async fn status(
    Path(code): Path<u16>,
    method: Method,
    uri: Uri,
    Query(query): Query<QueryParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Echo>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(describe(method, &uri, query, &headers, &body))))
}

fn describe(method: Method, uri: &Uri, query: QueryParams, headers: &HeaderMap, body: &[u8]) -> Echo {
    debug!(%method, path = uri.path(), "echoing request");
    Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query,
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        body: serde_json::from_slice(body).unwrap_or(Value::Null),
    }
}
