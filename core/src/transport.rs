//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! The client owns an `Arc<dyn Transport>` rather than being an HTTP client
//! itself. `UreqTransport` is the production implementation; tests swap in
//! recording transports that never touch a socket.
//!
//! Transports report every HTTP status as data. Deciding that a 4xx/5xx is an
//! error belongs to the client, which must see the response first.

use std::fmt;
use std::time::Duration;

use ureq::typestate::WithBody;
use ureq::{Agent, RequestBuilder};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one blocking HTTP round-trip.
pub trait Transport: Send + Sync + fmt::Debug {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Agent with ureq's default timeouts, which impose no overall deadline.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Agent that fails any call taking longer than `timeout` end to end.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Overall deadline per call, if one was configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.agent.config().timeouts().global
    }

    /// Wrap an agent configured by the caller.
    ///
    /// The agent must have `http_status_as_error(false)`, otherwise non-2xx
    /// responses surface as `ApiError::Transport` without their body.
    pub fn from_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let mut response = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), request).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), request).call(),
            HttpMethod::Post => send(with_headers(self.agent.post(url), request), request),
            HttpMethod::Put => send(with_headers(self.agent.put(url), request), request),
        }?;

        let status = response.status().as_u16();
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
        // Large list pages must come back whole, not as a read-limit error.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_string()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    request
        .headers
        .iter()
        .fold(builder, |builder, (name, value)| {
            builder.header(name.as_str(), value.as_str())
        })
}

fn send(
    builder: RequestBuilder<WithBody>,
    request: &HttpRequest,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match &request.body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_agent_has_no_overall_deadline() {
        assert_eq!(UreqTransport::new().timeout(), None);
        assert_eq!(UreqTransport::default().timeout(), None);
    }

    #[test]
    fn explicit_timeout_is_applied() {
        let transport = UreqTransport::with_timeout(Duration::from_secs(5));
        assert_eq!(transport.timeout(), Some(Duration::from_secs(5)));
    }
}
