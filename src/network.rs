//! Pass-through network access
//!
//! The worker never talks to the network directly; it goes through a
//! `Network` so tests can count and script calls.

use crate::error::{PrecacheError, PrecacheResult};
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

/// Abstract network fetch
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request and return the response unmodified.
    ///
    /// Non-2xx statuses are responses, not errors. Only transport
    /// failures are returned as `Err`.
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response>;
}

/// Network backed by a blocking `ureq` agent driven on the blocking pool
#[derive(Clone)]
pub struct UreqNetwork {
    agent: Agent,
}

impl UreqNetwork {
    /// Create a network client with a whole-request timeout
    pub fn new(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: Agent::new_with_config(config),
        }
    }

    fn fetch_blocking(agent: &Agent, request: &Request) -> PrecacheResult<Response> {
        let url = request.url.as_str();

        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let result = if request.body.is_empty() {
            let req = builder
                .body(())
                .map_err(|e| PrecacheError::network(url, e))?;
            agent.run(req)
        } else {
            let req = builder
                .body(request.body.clone())
                .map_err(|e| PrecacheError::network(url, e))?;
            agent.run(req)
        };

        let mut response = result.map_err(|e| PrecacheError::network(url, e))?;

        let status = response.status();
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
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| PrecacheError::network(url, e))?;

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}

impl Default for UreqNetwork {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Network for UreqNetwork {
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response> {
        debug!("{} {}", request.method, request.url);

        let agent = self.agent.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &request))
            .await
            .map_err(|e| PrecacheError::Internal(format!("network task failed: {}", e)))?
    }
}
