//! HTTP client with tracing and a host allowlist.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - Host allowlist so a token is only ever sent to configured endpoints
//! - Fully-read responses, so callers can inspect a body before parsing it

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use crate::error::FetchError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for meterfocus.
const USER_AGENT: &str = concat!("meterfocus/", env!("CARGO_PKG_VERSION"));

const APPLICATION_JSON: &str = "application/json";

// ============================================================================
// Request / Response
// ============================================================================

/// A fully-described request for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCall {
    /// HTTP method.
    pub method: Method,
    /// Target URL, query string included.
    pub url: Url,
    /// JSON body for POST requests.
    pub body: Option<serde_json::Value>,
}

impl PageCall {
    /// Creates a GET call.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            body: None,
        }
    }

    /// Creates a POST call with a JSON body.
    pub fn post(url: Url, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            url,
            body: Some(body),
        }
    }

    /// Path part of the URL, used as the endpoint label in logs and errors.
    pub fn endpoint(&self) -> &str {
        self.url.path()
    }
}

/// A response whose body has already been read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body text.
    pub body: String,
}

impl HttpResponse {
    /// Returns a header value as a string, if present and valid ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and host allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_hosts: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS), false)
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// `accept_invalid_certs` disables certificate verification, for
    /// on-premise endpoints that serve self-signed certificates.
    pub fn with_timeout(timeout: Duration, accept_invalid_certs: bool) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| FetchError::InvalidRequest(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            inner: client,
            allowed_hosts: None,
        })
    }

    /// Restricts requests to the given hosts (and their subdomains).
    #[must_use]
    pub fn allow_hosts(mut self, hosts: Vec<String>) -> Self {
        self.allowed_hosts = Some(hosts);
        self
    }

    /// Checks if a URL's host is allowed.
    fn is_host_allowed(&self, url: &Url) -> Result<(), FetchError> {
        let Some(ref allowed) = self.allowed_hosts else {
            return Ok(());
        };

        let host = url
            .host_str()
            .ok_or_else(|| FetchError::InvalidRequest(format!("No host in URL {url}")))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(FetchError::InvalidRequest(format!(
                "Host not allowed: {host}"
            )))
        }
    }

    /// Sends a page call with the session token attached.
    #[instrument(skip(self, call, token), fields(method = %call.method, url = %call.url))]
    pub async fn send(
        &self,
        call: &PageCall,
        token_header: &str,
        token: &str,
    ) -> Result<HttpResponse, FetchError> {
        self.is_host_allowed(&call.url)?;
        debug!("Sending request");

        let mut headers = json_headers();
        let name = HeaderName::from_bytes(token_header.as_bytes())
            .map_err(|e| FetchError::InvalidRequest(format!("Invalid token header name: {e}")))?;
        let mut value = HeaderValue::from_str(token)
            .map_err(|_| FetchError::auth("Token contains characters not allowed in a header"))?;
        value.set_sensitive(true);
        headers.insert(name, value);

        let mut request = self
            .inner
            .request(call.method.clone(), call.url.clone())
            .headers(headers);
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        self.execute(call.endpoint(), request).await
    }

    /// Performs a POST request with a JSON body and no session token.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &T,
    ) -> Result<HttpResponse, FetchError> {
        self.is_host_allowed(url)?;
        debug!("POST request with JSON");

        let request = self
            .inner
            .post(url.clone())
            .headers(json_headers())
            .json(body);
        self.execute(url.path(), request).await
    }

    async fn execute(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<HttpResponse, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(endpoint, &e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(endpoint, &e))?;

        debug!(status = %status, bytes = body.len(), "Response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    headers.insert(header::ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
    headers
}

// ============================================================================
// Tests
// ============================================================================
