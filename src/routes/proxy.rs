//! `/api/*` passthrough to the processing backend.
//!
//! DESIGN
//! ======
//! Requests are forwarded with method, path, query, headers and a streamed
//! body; responses come back the same way. Hop-by-hop headers are dropped in
//! both directions. Nothing is buffered, so multi-hundred-megabyte uploads
//! flow straight through.
//!
//! ERROR HANDLING
//! ==============
//! Upstream timeouts map to `504 Gateway Timeout`, every other upstream
//! failure to `502 Bad Gateway`, each with a small JSON error body.

use axum::Json;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("backend did not respond in time")]
    Timeout,
    #[error("backend request failed: {0}")]
    Upstream(#[source] reqwest::Error),
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() { Self::Timeout } else { Self::Upstream(e) }
    }
}

impl ProxyError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(error = %self, %status, "proxy request failed");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Headers that describe a single hop and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Backend URL for a request path (including any query string).
pub fn upstream_url(backend_url: &str, path_and_query: &str) -> String {
    let base = backend_url.trim_end_matches('/');
    if path_and_query.starts_with('/') {
        format!("{base}{path_and_query}")
    } else {
        format!("{base}/{path_and_query}")
    }
}

/// Copy end-to-end headers. `Host` is dropped so the client sets the
/// backend's own.
pub fn forwarded_headers(source: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if name == header::HOST || HOP_BY_HOP.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

pub async fn proxy_api(State(state): State<AppState>, req: Request) -> Result<Response, ProxyError> {
    let (parts, body) = req.into_parts();
    let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = upstream_url(&state.config.backend_url, path_and_query);

    tracing::debug!(method = %parts.method, %url, "proxying");

    let upstream = state
        .http
        .request(parts.method.clone(), &url)
        .headers(forwarded_headers(&parts.headers))
        .body(reqwest::Body::wrap_stream(body.into_data_stream()))
        .send()
        .await?;

    let status = upstream.status();
    let headers = forwarded_headers(upstream.headers());
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
#[path = "proxy_test.rs"]
mod tests;
