//! Resource Client: HTTP/JSON requests with explicit success/failure classification.
//!
//! # Responsibilities
//! - Build request URLs from the configured base and endpoint paths
//! - Classify every outcome: transport failure, non-2xx, undecodable body, success
//! - Notify the Connection Monitor of every outcome before returning it
//!
//! # Design Decisions
//! - A non-2xx body is never parsed, whatever it contains
//! - No retries here; retry policy is the poll interval
//! - 204 and empty 2xx bodies are only valid where the caller asks for `Option<T>`

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::client::error::{FailureCause, NetworkError, NetworkResult};
use crate::config::ServerConfig;
use crate::health::ConnectionMonitor;
use crate::observability::metrics;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Error building a client from configuration.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

enum Body<'a, B: Serialize + ?Sized> {
    Empty,
    Json(&'a B),
    Text(String),
}

/// Thin JSON client bound to one server and one Connection Monitor.
#[derive(Clone)]
pub struct ResourceClient {
    http: reqwest::Client,
    base: Url,
    monitor: Arc<ConnectionMonitor>,
}

impl ResourceClient {
    pub fn new(config: &ServerConfig, monitor: Arc<ConnectionMonitor>) -> Result<Self, ClientBuildError> {
        let base = Url::parse(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("diag-console/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base, monitor })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn monitor(&self) -> &Arc<ConnectionMonitor> {
        &self.monitor
    }

    /// `GET` a JSON document.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> NetworkResult<T> {
        let outcome = self
            .execute::<()>(Method::GET, path, Body::Empty)
            .await
            .and_then(|response| response.json());
        self.monitor.observe(&outcome);
        outcome
    }

    /// Send a JSON body and decode a JSON response.
    pub async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> NetworkResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let outcome = self
            .execute(method, path, Body::Json(body))
            .await
            .and_then(|response| response.json());
        self.monitor.observe(&outcome);
        outcome
    }

    /// Send an optional JSON body; `204 No Content` or an empty body yields `None`.
    pub async fn send_optional<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> NetworkResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body.map_or(Body::Empty, Body::Json);
        let outcome = self
            .execute(method, path, body)
            .await
            .and_then(|response| response.optional_json());
        self.monitor.observe(&outcome);
        outcome
    }

    /// Send a plain-text body and decode a JSON response.
    pub async fn send_text<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        text: impl Into<String>,
    ) -> NetworkResult<T> {
        let outcome = self
            .execute::<()>(method, path, Body::Text(text.into()))
            .await
            .and_then(|response| response.json());
        self.monitor.observe(&outcome);
        outcome
    }

    /// Send a bodiless request whose response body is irrelevant.
    pub async fn send_empty(&self, method: Method, path: &str) -> NetworkResult<()> {
        let outcome = self
            .execute::<()>(method, path, Body::Empty)
            .await
            .map(RawResponse::discard);
        self.monitor.observe(&outcome);
        outcome
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Body<'_, B>,
    ) -> NetworkResult<RawResponse> {
        let url = self.url(path);
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!("request", method = %method, url = %url, request_id = %request_id);

        async {
            let failure = |cause: FailureCause| {
                metrics::record_failure(cause.label());
                NetworkError::new(method.as_str(), url.clone(), request_id, cause)
            };

            let mut request = self
                .http
                .request(method.clone(), &url)
                .header(REQUEST_ID_HEADER, request_id.to_string());
            request = match body {
                Body::Empty => request,
                Body::Json(body) => request.json(body),
                Body::Text(text) => request
                    .header(reqwest::header::CONTENT_TYPE, "text/plain")
                    .body(text),
            };

            let started = Instant::now();
            let result = request.send().await;
            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    metrics::record_request(method.as_str(), false, started.elapsed());
                    tracing::debug!(error = %e, "Request failed: transport");
                    return Err(failure(FailureCause::Transport(e.to_string())));
                }
            };

            let status = response.status();
            if !status.is_success() {
                metrics::record_request(method.as_str(), false, started.elapsed());
                tracing::debug!(status = %status, "Request failed: non-success status");
                return Err(failure(FailureCause::Server {
                    status: status.as_u16(),
                }));
            }

            let bytes = match response.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    metrics::record_request(method.as_str(), false, started.elapsed());
                    tracing::debug!(error = %e, "Request failed: body read");
                    return Err(failure(FailureCause::Transport(e.to_string())));
                }
            };
            tracing::trace!(status = %status, bytes = bytes.len(), "Response received");

            Ok(RawResponse {
                status,
                body: bytes.to_vec(),
                elapsed: started.elapsed(),
                error: NetworkError::new(
                    method.as_str(),
                    url.clone(),
                    request_id,
                    FailureCause::Decode(String::new()),
                ),
            })
        }
        .instrument(span)
        .await
    }
}

/// A 2xx response awaiting decode. Carries a prepared error for decode failures.
///
/// The request is only counted once the body has been accepted or rejected.
struct RawResponse {
    status: StatusCode,
    body: Vec<u8>,
    elapsed: Duration,
    error: NetworkError,
}

impl RawResponse {
    fn is_empty(&self) -> bool {
        self.status == StatusCode::NO_CONTENT || self.body.iter().all(u8::is_ascii_whitespace)
    }

    fn json<T: DeserializeOwned>(self) -> NetworkResult<T> {
        match serde_json::from_slice(&self.body) {
            Ok(value) => {
                self.record(true);
                Ok(value)
            }
            Err(e) => Err(self.decode_error(e.to_string())),
        }
    }

    fn optional_json<T: DeserializeOwned>(self) -> NetworkResult<Option<T>> {
        if self.is_empty() {
            self.record(true);
            return Ok(None);
        }
        self.json().map(Some)
    }

    fn discard(self) {
        self.record(true);
    }

    fn record(&self, success: bool) {
        metrics::record_request(&self.error.method, success, self.elapsed);
    }

    fn decode_error(self, detail: String) -> NetworkError {
        self.record(false);
        metrics::record_failure("decode");
        tracing::debug!(url = %self.error.url, error = %detail, "Request failed: undecodable body");
        NetworkError {
            cause: FailureCause::Decode(detail),
            ..self.error
        }
    }
}
