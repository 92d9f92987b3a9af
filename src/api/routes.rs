// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        .route("/materia", web::get().to(handlers::get_materia))
        .route("/debug/timing", web::get().to(handlers::get_timings));
}
