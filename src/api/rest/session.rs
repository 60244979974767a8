//! Ephemeral view state: the focused delivery and the loading flag.
//! Neither is written to the snapshot slot.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::models::delivery::Delivery;
use crate::state::DeliveryStore;

pub fn router() -> Router<Arc<DeliveryStore>> {
    Router::new()
        .route("/selection", get(get_selection).put(set_selection))
        .route("/loading", get(get_loading).put(set_loading))
}

#[derive(Serialize, Deserialize)]
pub struct Selection {
    pub delivery: Option<Delivery>,
}

#[derive(Serialize, Deserialize)]
pub struct Loading {
    pub loading: bool,
}

async fn get_selection(State(store): State<Arc<DeliveryStore>>) -> Json<Selection> {
    Json(Selection {
        delivery: store.snapshot().selected_delivery.clone(),
    })
}

async fn set_selection(
    State(store): State<Arc<DeliveryStore>>,
    Json(payload): Json<Selection>,
) -> Json<Selection> {
    store.select(payload.delivery.clone());
    Json(payload)
}

async fn get_loading(State(store): State<Arc<DeliveryStore>>) -> Json<Loading> {
    Json(Loading {
        loading: store.snapshot().is_loading,
    })
}

async fn set_loading(
    State(store): State<Arc<DeliveryStore>>,
    Json(payload): Json<Loading>,
) -> Json<Loading> {
    store.set_loading(payload.loading);
    Json(payload)
}
