//! Executes `HttpRequest` values.
//!
//! # Design
//! `Transport` is the seam between the deterministic core and the network.
//! Implementations are async and must stop their I/O when the returned
//! future is dropped; that is how cancelling a controller job reaches the
//! socket. `ReqwestTransport` owns one `reqwest::Client`, so a single
//! instance shared behind an `Arc` is the process-wide connection pool.
//! Hosts with their own network stack implement the trait instead (any
//! `Fn(HttpRequest) -> impl Future<Output = Result<HttpResponse, TransportError>>`
//! qualifies).

use std::error::Error as _;
use std::future::Future;
use std::io::ErrorKind;

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<F, Fut> Transport for F
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse, TransportError>> + Send + 'static,
{
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request).await
    }
}

/// Transport backed by a pooled `reqwest` client.
///
/// Non-2xx statuses are returned as data, not errors, so the client decides
/// what an unsuccessful response means.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.connect_timeout + config.write_timeout + config.read_timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .use_rustls_tls()
            .build()
            .map_err(transport_error)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.get(&request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(transport_error)?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    if err.is_connect() {
        return if is_dns_failure(&err) {
            TransportError::HostUnresolved
        } else {
            TransportError::ConnectionRefused
        };
    }
    if let Some(status) = err.status() {
        return TransportError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: None,
        };
    }
    if err.is_body() || err.is_decode() {
        return TransportError::Io(err.to_string());
    }
    match io_kind(&err) {
        Some(ErrorKind::ConnectionRefused) => TransportError::ConnectionRefused,
        Some(ErrorKind::TimedOut) => TransportError::Timeout,
        Some(_) => TransportError::Io(err.to_string()),
        None => TransportError::Other(err.to_string()),
    }
}

fn is_dns_failure(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return true;
        }
        source = cause.source();
    }
    false
}

fn io_kind(err: &reqwest::Error) -> Option<ErrorKind> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        source = cause.source();
    }
    None
}
