use thiserror::Error;

/// Failure taxonomy for upstream fetches and aggregation.
///
/// Price-aggregation callers swallow these and degrade to partial data;
/// stat-enumeration and scrip-resolution callers treat them as fatal for the
/// whole request.
#[derive(Error, Debug)]
pub enum MarketError {
    /// Non-2xx upstream response, or a retryable status after retries
    /// exhausted.
    #[error("upstream http {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// Offline replay was asked for a URL that was never recorded.
    #[error("no recorded response for {url}")]
    CacheMiss { url: String },
    /// A quantity-weighted average was attempted over a zero total quantity.
    #[error("aggregation inconsistency: {0}")]
    JoinInconsistency(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
