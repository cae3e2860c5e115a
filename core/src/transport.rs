//! Blocking `Transport` backed by ureq.
//!
//! The agent is built with `http_status_as_error(false)` so 4xx/5xx
//! responses come back as data and the client does the status
//! interpretation. Each request carries its own global timeout.

use std::io::ErrorKind;

use tracing::trace;
use ureq::{Agent, RequestBuilder};

use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

/// Synchronous transport over a shared ureq `Agent` (connection pooling is
/// the agent's).
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let result = match &request.method {
            HttpMethod::Get => prepare(self.agent.get(url), request).call(),
            HttpMethod::Delete => prepare(self.agent.delete(url), request).call(),
            HttpMethod::Head => prepare(self.agent.head(url), request).call(),
            HttpMethod::Options => prepare(self.agent.options(url), request).call(),
            HttpMethod::Patch => send(prepare(self.agent.patch(url), request), request),
            HttpMethod::Post => send(prepare(self.agent.post(url), request), request),
            HttpMethod::Put => send(prepare(self.agent.put(url), request), request),
            HttpMethod::Other(verb) => {
                return Err(TransportError::Other(format!("method {verb} is not supported")))
            }
        };

        let mut response = result.map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string().map_err(map_error)?;
        trace!(status, bytes = body.len(), "response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn prepare<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    builder
        .config()
        .timeout_global(Some(request.timeout))
        .build()
}

fn send(
    builder: RequestBuilder<ureq::typestate::WithBody>,
    request: &HttpRequest,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match &request.body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn map_error(err: ureq::Error) -> TransportError {
    match &err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::Io(io) if io.kind() == ErrorKind::TimedOut => TransportError::Timeout,
        ureq::Error::ConnectionFailed | ureq::Error::HostNotFound | ureq::Error::Io(_) => {
            TransportError::Connection(err.to_string())
        }
        _ => TransportError::Other(err.to_string()),
    }
}
