use super::{ReplayStore, Transport};
use crate::error::MarketError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// HTTP statuses worth retrying: rate limiting plus transient server errors.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Live network transport with bounded exponential-backoff retry.
///
/// When a recorder is attached, every successful body is written through to
/// the replay store so a later offline run can serve it.
pub struct LiveTransport {
    http: Client,
    retry_attempts: u32,
    retry_base_delay: Duration,
    recorder: Option<ReplayStore>,
}

impl LiveTransport {
    pub fn new(
        retry_attempts: u32,
        retry_base_delay: Duration,
        recorder: Option<ReplayStore>,
    ) -> Self {
        Self {
            http: Client::new(),
            retry_attempts,
            retry_base_delay,
            recorder,
        }
    }
}

#[async_trait]
impl Transport for LiveTransport {
    async fn get(&self, url: &str) -> Result<Value, MarketError> {
        let max_attempts = self.retry_attempts.max(1);
        let mut delay = self.retry_base_delay.max(Duration::from_millis(1));
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let resp = match self.http.get(url).send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!(attempt, url, error = %e, "network error");
                    if attempt >= max_attempts {
                        return Err(MarketError::Net(e));
                    }
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    continue;
                }
            };

            let status = resp.status();
            let body = match resp.text().await {
                Ok(b) => b,
                Err(e) => {
                    warn!(attempt, url, error = %e, "body read error");
                    if attempt >= max_attempts {
                        return Err(MarketError::Net(e));
                    }
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    continue;
                }
            };

            if !status.is_success() {
                let status_u16 = status.as_u16();
                if RETRYABLE_STATUSES.contains(&status_u16) && attempt < max_attempts {
                    warn!(status = status_u16, attempt, url, "retryable upstream status");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    continue;
                }
                return Err(MarketError::Upstream {
                    status: status_u16,
                    body,
                });
            }

            let value: Value = serde_json::from_str(&body)?;

            if let Some(store) = &self.recorder {
                // Recording is best-effort; a full disk must not fail the call.
                if let Err(err) = store.record(url, &body) {
                    warn!(url, error = %err, "failed to record response for replay");
                }
            }

            return Ok(value);
        }
    }
}
