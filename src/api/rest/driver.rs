use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use tracing::info;

use crate::engine::selectors;
use crate::error::AppError;
use crate::models::driver::{Driver, MetricsWindow};
use crate::state::DeliveryStore;

pub fn router() -> Router<Arc<DeliveryStore>> {
    Router::new()
        .route("/driver", get(get_driver).put(set_driver))
        .route("/driver/metrics/today", get(today_metrics))
}

async fn get_driver(State(store): State<Arc<DeliveryStore>>) -> Result<Json<Driver>, AppError> {
    store
        .snapshot()
        .driver
        .clone()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no driver profile set".to_string()))
}

async fn set_driver(
    State(store): State<Arc<DeliveryStore>>,
    Json(payload): Json<Driver>,
) -> Json<Driver> {
    info!(driver_id = %payload.id, online = payload.is_online, "driver profile replaced");
    store.set_driver(payload.clone());
    Json(payload)
}

async fn today_metrics(State(store): State<Arc<DeliveryStore>>) -> Json<MetricsWindow> {
    Json(selectors::today_metrics(&store.snapshot()))
}
