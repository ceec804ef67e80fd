use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response};
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::error::ErrorResponse;
use crate::Environment;

/// Rewrites plain-text or empty 4xx/5xx responses into [`ErrorResponse`]
/// JSON. Responses that already carry JSON pass through untouched.
#[derive(Clone, Copy)]
pub struct JsonErrorLayer {
    environment: Environment,
}

impl JsonErrorLayer {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }
}

impl<S> Layer<S> for JsonErrorLayer {
    type Service = JsonErrorService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        JsonErrorService {
            inner,
            environment: self.environment,
        }
    }
}

#[derive(Clone)]
pub struct JsonErrorService<S> {
    inner: S,
    environment: Environment,
}

fn is_json<B>(response: &Response<B>) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

impl<S, B> Service<Request<Body>> for JsonErrorService<S>
where
    S: Service<Request<Body>, Response = Response<B>> + Clone + Send + 'static,
    S::Future: Send,
    B: axum::body::HttpBody<Data = axum::body::Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let hide_text = self.environment.is_production();

        Box::pin(async move {
            let response = inner.call(req).await?;
            let status = response.status();

            if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
                return Ok(response.map(Body::new));
            }

            let (parts, body) = response.into_parts();
            let bytes = body
                .collect()
                .await
                .map(|b| b.to_bytes())
                .unwrap_or_default();
            let text = String::from_utf8_lossy(&bytes);
            let reason = status.canonical_reason().unwrap_or("Error");
            let message = if text.trim().is_empty() || hide_text {
                reason
            } else {
                text.trim()
            };

            let mut rewritten =
                (status, axum::Json(ErrorResponse::from_status(status, message))).into_response();
            let content_type = HeaderValue::from_static("application/json");
            *rewritten.headers_mut() = parts.headers;
            rewritten.headers_mut().remove(header::CONTENT_LENGTH);
            rewritten
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);

            Ok(rewritten)
        })
    }
}
