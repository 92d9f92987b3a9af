use super::Transport;
use crate::error::MarketError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    url: String,
    filename: String,
}

/// Durable url -> response-body store backing offline replay.
///
/// Bodies live in uuid-named files next to an `index.json` mapping each URL
/// to its file. Re-recording a known URL overwrites its file in place and
/// leaves the index unchanged.
pub struct ReplayStore {
    dir: PathBuf,
    index: Mutex<Vec<IndexEntry>>,
}

impl ReplayStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, MarketError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let index_path = dir.join("index.json");
        let index = if index_path.exists() {
            serde_json::from_str(&fs::read_to_string(&index_path)?)?
        } else {
            Vec::new()
        };
        Ok(Self {
            dir,
            index: Mutex::new(index),
        })
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join("index.json")
    }

    /// Record a response body for `url`.
    pub fn record(&self, url: &str, body: &str) -> Result<(), MarketError> {
        let mut index = self.index.lock().expect("replay index poisoned");
        let filename = match index.iter().find(|e| e.url == url) {
            Some(entry) => entry.filename.clone(),
            None => {
                let filename = format!("{}.json", Uuid::new_v4());
                index.push(IndexEntry {
                    url: url.to_string(),
                    filename: filename.clone(),
                });
                fs::write(self.index_path(), serde_json::to_string_pretty(&*index)?)?;
                filename
            }
        };
        fs::write(self.dir.join(filename), body)?;
        Ok(())
    }

    /// Fetch the recorded body for `url`, parsed as JSON.
    pub fn lookup(&self, url: &str) -> Result<Value, MarketError> {
        let filename = self
            .index
            .lock()
            .expect("replay index poisoned")
            .iter()
            .find(|e| e.url == url)
            .map(|e| e.filename.clone())
            .ok_or_else(|| MarketError::CacheMiss {
                url: url.to_string(),
            })?;
        let body = fs::read_to_string(self.dir.join(filename))?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Serves previously recorded responses instead of hitting the network.
pub struct ReplayTransport {
    store: ReplayStore,
}

impl ReplayTransport {
    pub fn new(store: ReplayStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn get(&self, url: &str) -> Result<Value, MarketError> {
        self.store.lookup(url)
    }
}
