// HTTP request handlers for API endpoints

use crate::api::models::*;
use crate::market::catalog::CatalogBuilder;
use crate::market::MarketConfig;
use crate::transport::{TimingReport, Transport};
use actix_web::{web, HttpResponse, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Shared state handed to every worker.
pub struct AppState {
    pub transport: Arc<dyn Transport>,
    pub config: MarketConfig,
    pub started: Instant,
    /// Timing sheet of the most recent build, successful or not.
    pub last_timings: RwLock<TimingReport>,
}

impl AppState {
    pub fn new(transport: Arc<dyn Transport>, config: MarketConfig) -> Self {
        Self {
            transport,
            config,
            started: Instant::now(),
            last_timings: RwLock::new(TimingReport::new()),
        }
    }
}

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// Build and serve the full materia view for the requested world
pub async fn get_materia(
    query: web::Query<MateriaQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    tracing::info!(world = %query.world, "materia view requested");

    let builder = CatalogBuilder::new(state.transport.clone(), state.config.clone());
    let result = builder.build(&query.world).await;

    // Keep the timing sheet around even when the build fails.
    *state.last_timings.write().await = builder.timing_report();

    match result {
        Ok(records) => Ok(HttpResponse::Ok().json(records)),
        Err(err) => {
            tracing::error!(world = %query.world, error = %err, "materia build failed");
            Ok(HttpResponse::BadGateway().json(ErrorResponse {
                error: err.to_string(),
            }))
        }
    }
}

/// Per-upstream call statistics from the most recent build
pub async fn get_timings(state: web::Data<AppState>) -> Result<HttpResponse> {
    let report = state.last_timings.read().await;
    Ok(HttpResponse::Ok().json(&*report))
}
