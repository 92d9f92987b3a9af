// API server implementation using actix-web

use crate::api::{handlers::AppState, middleware, routes};
use crate::market::MarketConfig;
use crate::transport::{LiveTransport, ReplayStore, ReplayTransport, Transport};
use crate::util::env::{env_flag, env_opt, env_parse};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    pub config: MarketConfig,
    pub offline: bool,
    pub replay_dir: String,
    pub retry_attempts: u32,
    pub retry_base_ms: u64,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        crate::util::env::init_env();

        let host = env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env_opt("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .context("Invalid API_PORT")?;

        let allowed_origins = env_opt("ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string());

        let config = MarketConfig::from_env();
        url::Url::parse(&config.universalis_url).context("Invalid UNIVERSALIS_URL")?;
        url::Url::parse(&config.xivapi_url).context("Invalid XIVAPI_URL")?;

        Ok(Self {
            host,
            port,
            allowed_origins,
            config,
            offline: env_flag("OFFLINE", false),
            replay_dir: env_opt("REPLAY_DIR").unwrap_or_else(|| "cached".to_string()),
            retry_attempts: env_parse("UPSTREAM_RETRY_ATTEMPTS", 4),
            retry_base_ms: env_parse("UPSTREAM_RETRY_BASE_MS", 500),
        })
    }

    /// Pick the upstream transport: recorded replay when OFFLINE is set,
    /// otherwise live HTTP that records every response for later replay.
    fn build_transport(&self) -> Result<Arc<dyn Transport>> {
        let store = ReplayStore::open(&self.replay_dir)
            .with_context(|| format!("Failed to open replay store at {}", self.replay_dir))?;

        if self.offline {
            tracing::info!(dir = %self.replay_dir, "offline mode: serving recorded responses");
            return Ok(Arc::new(ReplayTransport::new(store)));
        }

        Ok(Arc::new(LiveTransport::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_ms),
            Some(store),
        )))
    }

    /// Start the HTTP server
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            offline = self.offline,
            "Starting materia-market API server"
        );

        let transport = self.build_transport()?;
        let state = web::Data::new(AppState::new(transport, self.config.clone()));
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(state.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
