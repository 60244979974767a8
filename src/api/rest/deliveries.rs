use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;

use crate::engine::selectors::{self, StatusCounts};
use crate::error::AppError;
use crate::models::delivery::{Delivery, DeliveryLocation, DeliveryStatus, LegType};
use crate::state::DeliveryStore;

pub fn router() -> Router<Arc<DeliveryStore>> {
    Router::new()
        .route(
            "/deliveries",
            get(list_deliveries)
                .put(replace_deliveries)
                .post(add_delivery),
        )
        .route("/deliveries/pending", get(pending_deliveries))
        .route("/deliveries/active", get(active_deliveries))
        .route("/deliveries/counts", get(delivery_counts))
        .route("/deliveries/:id", get(get_delivery).delete(remove_delivery))
        .route("/deliveries/:id/status", patch(update_delivery_status))
        .route("/deliveries/:id/advance", post(advance_delivery))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<DeliveryStatus>,
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DeliveryStatus,
}

async fn list_deliveries(
    State(store): State<Arc<DeliveryStore>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Delivery>> {
    let state = store.snapshot();
    let base = match query.status {
        Some(status) => selectors::by_status(&state, status),
        None => state.deliveries.iter().collect(),
    };

    let hits = selectors::search(base, query.q.as_deref().unwrap_or_default());
    Json(hits.into_iter().cloned().collect())
}

async fn pending_deliveries(State(store): State<Arc<DeliveryStore>>) -> Json<Vec<Delivery>> {
    let state = store.snapshot();
    Json(selectors::pending(&state).into_iter().cloned().collect())
}

async fn active_deliveries(State(store): State<Arc<DeliveryStore>>) -> Json<Vec<Delivery>> {
    let state = store.snapshot();
    Json(selectors::active(&state).into_iter().cloned().collect())
}

async fn delivery_counts(State(store): State<Arc<DeliveryStore>>) -> Json<StatusCounts> {
    Json(selectors::status_counts(&store.snapshot()))
}

async fn replace_deliveries(
    State(store): State<Arc<DeliveryStore>>,
    Json(payload): Json<Vec<Delivery>>,
) -> Result<Json<Vec<Delivery>>, AppError> {
    for delivery in &payload {
        check_legs(delivery)?;
    }

    info!(deliveries = payload.len(), "replacing deliveries");
    store.replace_all(payload);
    Ok(Json(store.snapshot().deliveries.clone()))
}

async fn add_delivery(
    State(store): State<Arc<DeliveryStore>>,
    Json(payload): Json<Delivery>,
) -> Result<(StatusCode, Json<Delivery>), AppError> {
    check_legs(&payload)?;

    info!(delivery_id = %payload.id, "delivery added");
    store.add(payload.clone());
    Ok((StatusCode::CREATED, Json(payload)))
}

async fn get_delivery(
    State(store): State<Arc<DeliveryStore>>,
    Path(id): Path<String>,
) -> Result<Json<Delivery>, AppError> {
    find(&store, &id).map(Json)
}

async fn remove_delivery(
    State(store): State<Arc<DeliveryStore>>,
    Path(id): Path<String>,
) -> StatusCode {
    store.remove(&id);
    StatusCode::NO_CONTENT
}

async fn update_delivery_status(
    State(store): State<Arc<DeliveryStore>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Delivery>, AppError> {
    store.update_status(&id, payload.status);
    let delivery = find(&store, &id)?;

    info!(delivery_id = %id, status = %delivery.status, "delivery status updated");
    Ok(Json(delivery))
}

async fn advance_delivery(
    State(store): State<Arc<DeliveryStore>>,
    Path(id): Path<String>,
) -> Result<Json<Delivery>, AppError> {
    store.advance(&id);
    find(&store, &id).map(Json)
}

fn find(store: &DeliveryStore, id: &str) -> Result<Delivery, AppError> {
    selectors::find(&store.snapshot(), id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("delivery {id} not found")))
}

/// Each leg's tag has to match the slot it sits in.
fn check_legs(delivery: &Delivery) -> Result<(), AppError> {
    check_leg(&delivery.id, &delivery.pickup, LegType::Pickup)?;
    check_leg(&delivery.id, &delivery.delivery, LegType::Delivery)
}

fn check_leg(id: &str, leg: &DeliveryLocation, expected: LegType) -> Result<(), AppError> {
    if leg.leg != expected {
        return Err(AppError::BadRequest(format!(
            "delivery {id}: {expected:?} leg is tagged {:?}",
            leg.leg
        )));
    }

    Ok(())
}
