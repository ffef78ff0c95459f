//! HTTP handler: one request per invocation, with retries and optional
//! process-wide serialization.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use cadence_config as config;
use cadence_types::{Context, HandlerResult, PipeError, Result};

use crate::handler::Handler;
use cadence_expr::substitute;

/// Wire shape of an upstream response. A missing `results` key reads as an
/// empty list, terminating the branch without error.
#[derive(Debug, Deserialize)]
struct HandlerResponseBody {
    #[serde(default)]
    results: Vec<HandlerResult>,
}

#[derive(Debug)]
pub struct HttpHandler {
    name: String,
    cfg: config::HttpHandler,
    method: reqwest::Method,
    client: reqwest::Client,

    // Serializes requests across the whole process when `parallel_run` is
    // false. Never shared between handlers.
    busy: tokio::sync::Mutex<()>,
}

impl HttpHandler {
    pub fn new(name: &str, cfg: &config::HttpHandler) -> Result<Self> {
        let method: reqwest::Method = cfg
            .method
            .parse()
            .map_err(|_| PipeError::Config(format!("invalid HTTP method '{}'", cfg.method)))?;

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| PipeError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name: name.to_string(),
            cfg: cfg.clone(),
            method,
            client,
            busy: tokio::sync::Mutex::new(()),
        })
    }

    async fn execute_request(
        &self,
        cancel: &CancellationToken,
        data: &Context,
    ) -> Result<Vec<HandlerResult>> {
        let _serial = if !self.cfg.parallel_run {
            Some(self.busy.lock().await)
        } else {
            None
        };

        let url = substitute(&self.cfg.url, data).ok_or_else(|| {
            PipeError::UnresolvedPlaceholders {
                field: "URL".into(),
            }
        })?;
        let body = substitute(&self.cfg.body, data).ok_or_else(|| {
            PipeError::UnresolvedPlaceholders {
                field: "body".into(),
            }
        })?;

        let mut request = self.client.request(self.method.clone(), url.as_str()).body(body);
        for (key, value) in &self.cfg.headers {
            request = request.header(key, value);
        }
        if !self.cfg.query_params.is_empty() {
            request = request.query(&self.cfg.query_params);
        }

        tracing::debug!(handler = %self.name, %url, "sending HTTP request");

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(PipeError::Cancelled),
            result = request.send() => {
                result.map_err(|e| PipeError::Http(e.to_string()))?
            }
        };

        let status = response.status().as_u16();
        if status != self.cfg.expected_response_code {
            return Err(PipeError::UnexpectedStatus {
                got: status,
                expected: self.cfg.expected_response_code,
            });
        }

        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(PipeError::Cancelled),
            result = response.bytes() => {
                result.map_err(|e| PipeError::Http(e.to_string()))?
            }
        };

        let parsed: HandlerResponseBody =
            serde_json::from_slice(&bytes).map_err(|e| PipeError::Decode(e.to_string()))?;
        Ok(parsed.results)
    }
}

#[async_trait]
impl Handler for HttpHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(
        &self,
        cancel: &CancellationToken,
        data: &Context,
    ) -> Result<Vec<HandlerResult>> {
        let attempts = self.cfg.retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            match self.execute_request(cancel, data).await {
                Ok(results) => return Ok(results),
                // Cancellation is surfaced at once; placeholder failures are
                // deterministic for this context, a retry cannot succeed.
                Err(e @ (PipeError::Cancelled | PipeError::UnresolvedPlaceholders { .. })) => {
                    return Err(e)
                }
                Err(e) => {
                    tracing::warn!(
                        handler = %self.name,
                        attempt = attempt + 1,
                        error = %e,
                        "HTTP request attempt failed"
                    );
                    last_error = Some(e);
                }
            }

            if attempt + 1 < attempts {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(PipeError::Cancelled),
                    _ = tokio::time::sleep(self.cfg.retry_interval) => {}
                }
            }
        }

        Err(PipeError::RetriesExhausted {
            attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".into()),
        })
    }
}
