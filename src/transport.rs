// HTTP transport: the one place that talks to the network. `BinClient`
// builds an `ApiRequest`, the transport executes it and hands back the
// status code and the complete response body.

use std::time::Duration;

pub use reqwest::Method;
use reqwest::blocking::Client;
use tracing::debug;

use crate::error::TransportError;

const USER_AGENT: &str = concat!("jsonbin-cli/", env!("CARGO_PKG_VERSION"));

/// A single request to the bin service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        ApiRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status code plus the fully read body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes requests. Implementations must read the whole response body
/// before returning, whatever the status.
pub trait Transport {
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Blocking reqwest transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// `timeout` of `None` disables reqwest's default 30 second limit.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self.client.request(request.method, request.url.as_str());
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let res = builder.send()?;
        let status = res.status().as_u16();
        // Reading to the end releases the connection back to the pool.
        let body = res.bytes()?.to_vec();

        debug!(status, bytes = body.len(), "response received");
        Ok(ApiResponse { status, body })
    }
}
