pub mod deliveries;
pub mod driver;
pub mod session;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::engine::selectors;
use crate::state::DeliveryStore;

pub fn router(store: Arc<DeliveryStore>) -> Router {
    Router::new()
        .merge(deliveries::router())
        .merge(driver::router())
        .merge(session::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(store)
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    deliveries: usize,
    active: usize,
    driver: bool,
}

async fn health(State(store): State<Arc<DeliveryStore>>) -> Json<HealthResponse> {
    let state = store.snapshot();

    Json(HealthResponse {
        status: "ok",
        deliveries: state.deliveries.len(),
        active: selectors::active(&state).len(),
        driver: state.driver.is_some(),
    })
}

async fn metrics(State(store): State<Arc<DeliveryStore>>) -> impl IntoResponse {
    match store.metrics().encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
