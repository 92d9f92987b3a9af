// Upstream HTTP transport: a small trait so the aggregation pipeline can run
// against the live services, recorded responses, or a scripted fake in tests.

mod live;
mod replay;

pub use live::LiveTransport;
pub use replay::{ReplayStore, ReplayTransport};

use crate::error::MarketError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return the parsed JSON body.
    async fn get(&self, url: &str) -> Result<Value, MarketError>;
}

/// Aggregate timing for one logical upstream call name.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CallStats {
    pub calls: usize,
    pub avg_time: f64,
    pub total_time: f64,
}

/// Read-only snapshot of one build's upstream call timings.
pub type TimingReport = HashMap<String, CallStats>;

/// Wraps a transport with per-call timing and request logging.
///
/// One client is constructed per catalog build, so concurrent requests never
/// share timing state.
pub struct UpstreamClient {
    transport: Arc<dyn Transport>,
    timings: Mutex<HashMap<String, Vec<Duration>>>,
}

impl UpstreamClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            timings: Mutex::new(HashMap::new()),
        }
    }

    /// GET `url`, recording the call duration under the logical `name`.
    pub async fn fetch(&self, name: &str, url: &str) -> Result<Value, MarketError> {
        let start = Instant::now();
        let result = self.transport.get(url).await;
        let elapsed = start.elapsed();

        self.timings
            .lock()
            .expect("timing sheet poisoned")
            .entry(name.to_string())
            .or_default()
            .push(elapsed);

        match &result {
            Ok(_) => tracing::info!(
                name,
                url,
                elapsed_ms = elapsed.as_millis() as u64,
                "upstream call"
            ),
            Err(err) => tracing::warn!(
                name,
                url,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %err,
                "upstream call failed"
            ),
        }
        result
    }

    /// Snapshot of every call made through this client so far.
    pub fn report(&self) -> TimingReport {
        let timings = self.timings.lock().expect("timing sheet poisoned");
        timings
            .iter()
            .map(|(name, durations)| {
                let total: f64 = durations.iter().map(Duration::as_secs_f64).sum();
                let calls = durations.len();
                let avg = if calls > 0 { total / calls as f64 } else { 0.0 };
                (
                    name.clone(),
                    CallStats {
                        calls,
                        avg_time: avg,
                        total_time: total,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Substring-routed fake transport for pipeline tests.
    pub struct ScriptedTransport {
        routes: Vec<(String, Value)>,
        fail_on: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self {
                routes: Vec::new(),
                fail_on: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Serve `response` for any URL containing `needle`. Routes are
        /// matched in registration order.
        pub fn with_route(mut self, needle: &str, response: Value) -> Self {
            self.routes.push((needle.to_string(), response));
            self
        }

        /// Fail with a 500 for any URL containing `needle`, before routing.
        pub fn failing_on(mut self, needle: &str) -> Self {
            self.fail_on = Some(needle.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<Value, MarketError> {
            self.calls.lock().unwrap().push(url.to_string());
            if let Some(needle) = &self.fail_on {
                if url.contains(needle) {
                    return Err(MarketError::Upstream {
                        status: 500,
                        body: "scripted failure".into(),
                    });
                }
            }
            for (needle, response) in &self.routes {
                if url.contains(needle) {
                    return Ok(response.clone());
                }
            }
            Err(MarketError::Upstream {
                status: 404,
                body: format!("no scripted response for {url}"),
            })
        }
    }

    #[tokio::test]
    async fn client_times_calls_per_logical_name() {
        let transport = Arc::new(
            ScriptedTransport::new().with_route("/ping", serde_json::json!({"ok": true})),
        );
        let client = UpstreamClient::new(transport);

        client.fetch("Ping", "http://example.test/ping").await.unwrap();
        client.fetch("Ping", "http://example.test/ping").await.unwrap();

        let report = client.report();
        let stats = report.get("Ping").expect("Ping stats");
        assert_eq!(stats.calls, 2);
        assert!(stats.total_time >= stats.avg_time);
    }

    #[tokio::test]
    async fn failed_calls_are_still_timed() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = UpstreamClient::new(transport);

        let err = client
            .fetch("Nowhere", "http://example.test/none")
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Upstream { status: 404, .. }));
        assert_eq!(client.report().get("Nowhere").map(|s| s.calls), Some(1));
    }
}
