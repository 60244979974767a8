//! Read-only queries over a [`StoreState`] snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::lifecycle::is_active;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::driver::MetricsWindow;
use crate::state::StoreState;

pub fn by_status(state: &StoreState, status: DeliveryStatus) -> Vec<&Delivery> {
    state
        .deliveries
        .iter()
        .filter(|delivery| delivery.status == status)
        .collect()
}

pub fn pending(state: &StoreState) -> Vec<&Delivery> {
    by_status(state, DeliveryStatus::Pending)
}

pub fn active(state: &StoreState) -> Vec<&Delivery> {
    state
        .deliveries
        .iter()
        .filter(|delivery| is_active(delivery.status))
        .collect()
}

/// Zeroed when no driver is set.
pub fn today_metrics(state: &StoreState) -> MetricsWindow {
    state
        .driver
        .as_ref()
        .map(|driver| driver.metrics.today)
        .unwrap_or_default()
}

pub fn find<'a>(state: &'a StoreState, id: &str) -> Option<&'a Delivery> {
    state.deliveries.iter().find(|delivery| delivery.id == id)
}

/// Case-insensitive match on pet name, customer names and neighborhoods of
/// both legs. An empty query matches everything.
pub fn search<'a, I>(deliveries: I, query: &str) -> Vec<&'a Delivery>
where
    I: IntoIterator<Item = &'a Delivery>,
{
    if query.is_empty() {
        return deliveries.into_iter().collect();
    }

    let needle = query.to_lowercase();
    deliveries
        .into_iter()
        .filter(|delivery| {
            [
                &delivery.pet.name,
                &delivery.pickup.customer.name,
                &delivery.delivery.customer.name,
                &delivery.pickup.address.neighborhood,
                &delivery.delivery.address.neighborhood,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub all: usize,
    pub by_status: BTreeMap<&'static str, usize>,
}

pub fn status_counts(state: &StoreState) -> StatusCounts {
    let mut by_status: BTreeMap<&'static str, usize> = DeliveryStatus::ALL
        .iter()
        .map(|status| (status.as_str(), 0))
        .collect();

    for delivery in &state.deliveries {
        *by_status.entry(delivery.status.as_str()).or_insert(0) += 1;
    }

    StatusCounts {
        all: state.deliveries.len(),
        by_status,
    }
}
