//! Plain HTTP front end for running an [`Api`] on a developer machine.
//!
//! Each request is turned into the [`ProxyEvent`] API Gateway would send,
//! dispatched, and the [`ProxyResponse`] is written back as HTTP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::api::Api;
use crate::event::{ProxyEvent, ProxyResponse};

/// Router sending every path and method through `api`.
pub fn router(api: Arc<Api>) -> Router {
    Router::new().fallback(handle).with_state(api)
}

/// Bind `addr` and serve `api` until the process is stopped.
pub async fn serve(api: Api, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(app = %api.app_name(), %addr, "local server listening");
    axum::serve(listener, router(Arc::new(api))).await
}

async fn handle(
    State(api): State<Arc<Api>>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = to_event(&method, &uri, query, &headers, &body);
    into_http(api.dispatch(event, None))
}

fn to_event(
    method: &Method,
    uri: &Uri,
    query: HashMap<String, String>,
    headers: &HeaderMap,
    body: &[u8],
) -> ProxyEvent {
    let headers = headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_owned())))
        .collect();

    let (body, is_base64_encoded) = if body.is_empty() {
        (None, false)
    } else {
        match std::str::from_utf8(body) {
            Ok(s) => (Some(s.to_owned()), false),
            Err(_) => (Some(STANDARD.encode(body)), true),
        }
    };

    ProxyEvent {
        path: Some(uri.path().to_owned()),
        http_method: Some(method.as_str().to_owned()),
        headers,
        query_string_parameters: query,
        body,
        is_base64_encoded,
        resource: Some(uri.path().to_owned()),
        ..Default::default()
    }
}

fn into_http(response: ProxyResponse) -> Response {
    let body = match response.body_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "view produced invalid base64 body");
            return (StatusCode::BAD_GATEWAY, "invalid base64 body").into_response();
        }
    };

    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut http = Response::new(Body::from(body));
    *http.status_mut() = status;

    for (name, value) in &response.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                http.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = %name, "dropping invalid response header"),
        }
    }
    http
}
