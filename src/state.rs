use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockWriteGuard};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::engine::lifecycle::{next_status, with_status};
use crate::engine::selectors::status_counts;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::driver::Driver;
use crate::observability::metrics::Metrics;
use crate::persistence::{self, SnapshotSlot};
use crate::seed;

/// Everything the store holds. Only `deliveries` and `driver` are persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub deliveries: Vec<Delivery>,
    pub driver: Option<Driver>,
    pub is_loading: bool,
    pub selected_delivery: Option<Delivery>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreOp {
    ReplaceAll,
    SetDriver,
    UpdateStatus,
    Select,
    Add,
    Remove,
    SetLoading,
}

impl StoreOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOp::ReplaceAll => "replace_all",
            StoreOp::SetDriver => "set_driver",
            StoreOp::UpdateStatus => "update_status",
            StoreOp::Select => "select",
            StoreOp::Add => "add",
            StoreOp::Remove => "remove",
            StoreOp::SetLoading => "set_loading",
        }
    }

    fn persisted(&self) -> bool {
        !matches!(self, StoreOp::Select | StoreOp::SetLoading)
    }
}

/// Change notification sent to subscribers after a write is applied.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreEvent {
    pub operation: StoreOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<String>,
    pub at: DateTime<Utc>,
}

/// Holds the deliveries and driver profile.
///
/// Every write builds a new [`StoreState`] and swaps it in, so a snapshot
/// obtained through [`DeliveryStore::snapshot`] is never observed half-updated.
/// Writes that change nothing (unknown id, no forward step) leave the state,
/// the snapshot slot and subscribers untouched.
pub struct DeliveryStore {
    state: RwLock<Arc<StoreState>>,
    slot: Box<dyn SnapshotSlot>,
    events_tx: broadcast::Sender<StoreEvent>,
    metrics: Metrics,
}

impl DeliveryStore {
    pub fn new(
        initial: StoreState,
        slot: Box<dyn SnapshotSlot>,
        event_buffer_size: usize,
    ) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));
        let metrics = Metrics::new();
        metrics.record_status_counts(&status_counts(&initial));

        Self {
            state: RwLock::new(Arc::new(initial)),
            slot,
            events_tx,
            metrics,
        }
    }

    /// Restores the last snapshot from `slot`, falling back to the seed data
    /// when the slot is empty or its payload cannot be read.
    pub fn open(slot: Box<dyn SnapshotSlot>, event_buffer_size: usize) -> Self {
        let initial = match slot.load() {
            Ok(Some(payload)) => match persistence::decode(&payload) {
                Ok(snapshot) => {
                    info!(
                        deliveries = snapshot.deliveries.len(),
                        "restored store snapshot"
                    );
                    StoreState::from(snapshot)
                }
                Err(err) => {
                    warn!(error = %err, "discarding unreadable store snapshot; using seed data");
                    seed::initial_state()
                }
            },
            Ok(None) => {
                info!("no store snapshot found; using seed data");
                seed::initial_state()
            }
            Err(err) => {
                warn!(error = %err, "failed to load store snapshot; using seed data");
                seed::initial_state()
            }
        };

        Self::new(initial, slot, event_buffer_size)
    }

    pub fn snapshot(&self) -> Arc<StoreState> {
        self.state.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events_tx.subscribe()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn replace_all(&self, deliveries: Vec<Delivery>) {
        self.apply(StoreOp::ReplaceAll, None, |state| {
            Some(StoreState {
                deliveries,
                ..state.clone()
            })
        });
    }

    pub fn set_driver(&self, driver: Driver) {
        self.apply(StoreOp::SetDriver, None, |state| {
            Some(StoreState {
                driver: Some(driver),
                ..state.clone()
            })
        });
    }

    /// Sets `status` on the delivery with `delivery_id`, keeping its position.
    /// Unknown ids are ignored.
    pub fn update_status(&self, delivery_id: &str, status: DeliveryStatus) {
        self.apply(StoreOp::UpdateStatus, Some(delivery_id), |state| {
            replace_status(state, delivery_id, |_| Some(status))
        });
    }

    /// Moves the delivery one step along the forward path. Ignored for
    /// unknown ids and for statuses without a forward step.
    pub fn advance(&self, delivery_id: &str) {
        self.apply(StoreOp::UpdateStatus, Some(delivery_id), |state| {
            replace_status(state, delivery_id, next_status)
        });
    }

    pub fn select(&self, delivery: Option<Delivery>) {
        let delivery_id = delivery.as_ref().map(|d| d.id.clone());
        self.apply(StoreOp::Select, delivery_id.as_deref(), |state| {
            Some(StoreState {
                selected_delivery: delivery,
                ..state.clone()
            })
        });
    }

    /// Inserts at the front; the newest delivery is listed first.
    pub fn add(&self, delivery: Delivery) {
        let delivery_id = delivery.id.clone();
        self.apply(StoreOp::Add, Some(delivery_id.as_str()), |state| {
            let mut deliveries = Vec::with_capacity(state.deliveries.len() + 1);
            deliveries.push(delivery);
            deliveries.extend(state.deliveries.iter().cloned());

            Some(StoreState {
                deliveries,
                ..state.clone()
            })
        });
    }

    pub fn remove(&self, delivery_id: &str) {
        self.apply(StoreOp::Remove, Some(delivery_id), |state| {
            if !state.deliveries.iter().any(|d| d.id == delivery_id) {
                return None;
            }

            Some(StoreState {
                deliveries: state
                    .deliveries
                    .iter()
                    .filter(|d| d.id != delivery_id)
                    .cloned()
                    .collect(),
                ..state.clone()
            })
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.apply(StoreOp::SetLoading, None, |state| {
            Some(StoreState {
                is_loading: loading,
                ..state.clone()
            })
        });
    }

    fn apply<F>(&self, op: StoreOp, delivery_id: Option<&str>, update: F)
    where
        F: FnOnce(&StoreState) -> Option<StoreState>,
    {
        let mut guard = self.state.write();
        let Some(next) = update(&guard) else {
            debug!(operation = op.as_str(), delivery_id, "store write had no effect");
            return;
        };

        *guard = Arc::new(next);
        self.metrics
            .store_writes_total
            .with_label_values(&[op.as_str()])
            .inc();
        self.metrics.record_status_counts(&status_counts(&guard));

        // Keep other writers out until the slot holds this state, so snapshots
        // land in write order, but let readers in.
        let current = RwLockWriteGuard::downgrade(guard);
        if op.persisted() {
            self.persist(&current);
        }
        drop(current);

        let _ = self.events_tx.send(StoreEvent {
            operation: op,
            delivery_id: delivery_id.map(str::to_string),
            at: Utc::now(),
        });
    }

    fn persist(&self, state: &StoreState) {
        let outcome = persistence::encode(state).and_then(|payload| self.slot.store(&payload));

        match outcome {
            Ok(()) => {
                self.metrics
                    .snapshot_writes_total
                    .with_label_values(&["success"])
                    .inc();
            }
            Err(err) => {
                self.metrics
                    .snapshot_writes_total
                    .with_label_values(&["error"])
                    .inc();
                warn!(error = %err, "failed to persist store snapshot");
            }
        }
    }
}

fn replace_status<F>(state: &StoreState, delivery_id: &str, status_for: F) -> Option<StoreState>
where
    F: Fn(DeliveryStatus) -> Option<DeliveryStatus>,
{
    let now = Utc::now();
    let mut changed = false;

    let deliveries: Vec<Delivery> = state
        .deliveries
        .iter()
        .map(|delivery| {
            if delivery.id != delivery_id {
                return delivery.clone();
            }

            match status_for(delivery.status) {
                Some(status) => {
                    changed = true;
                    with_status(delivery, status, now)
                }
                None => delivery.clone(),
            }
        })
        .collect();

    changed.then(|| StoreState {
        deliveries,
        ..state.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::{DeliveryStore, StoreOp, StoreState};
    use crate::error::AppError;
    use crate::models::delivery::{Delivery, DeliveryStatus};
    use crate::persistence::{self, MemorySlot, SnapshotSlot};
    use crate::seed;

    struct FullDisk;

    impl SnapshotSlot for FullDisk {
        fn load(&self) -> Result<Option<String>, AppError> {
            Ok(None)
        }

        fn store(&self, _payload: &str) -> Result<(), AppError> {
            Err(AppError::Internal("disk full".to_string()))
        }
    }

    fn delivery(id: &str, status: DeliveryStatus) -> Delivery {
        let mut delivery = seed::deliveries()[0].clone();
        delivery.id = id.to_string();
        delivery.status = status;
        delivery
    }

    fn store_with(deliveries: Vec<Delivery>) -> DeliveryStore {
        let state = StoreState {
            deliveries,
            driver: Some(seed::driver()),
            ..StoreState::default()
        };
        DeliveryStore::new(state, Box::new(MemorySlot::new()), 16)
    }

    #[test]
    fn update_status_touches_only_the_target() {
        let store = store_with(seed::deliveries());
        let before = store.snapshot();

        store.update_status("2", DeliveryStatus::Delivered);
        let after = store.snapshot();

        assert_eq!(after.deliveries.len(), before.deliveries.len());
        assert_eq!(after.deliveries[0], before.deliveries[0]);
        assert_eq!(after.deliveries[2], before.deliveries[2]);

        let old = &before.deliveries[1];
        let new = &after.deliveries[1];
        assert_eq!(new.status, DeliveryStatus::Delivered);
        assert!(new.updated_at >= old.updated_at);

        let mut expected = old.clone();
        expected.status = new.status;
        expected.updated_at = new.updated_at;
        assert_eq!(*new, expected);
    }

    #[test]
    fn update_status_unknown_id_is_a_no_op() {
        let store = store_with(seed::deliveries());
        let before = store.snapshot();
        let mut events = store.subscribe();

        store.update_status("missing", DeliveryStatus::Cancelled);

        assert_eq!(*store.snapshot(), *before);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn advance_follows_forward_path() {
        let store = store_with(vec![delivery("a", DeliveryStatus::Pending)]);

        store.advance("a");
        assert_eq!(store.snapshot().deliveries[0].status, DeliveryStatus::Collected);
        store.advance("a");
        store.advance("a");
        assert_eq!(store.snapshot().deliveries[0].status, DeliveryStatus::Delivered);

        let before = store.snapshot();
        store.advance("a");
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn add_prepends() {
        let store = store_with(Vec::new());

        store.add(delivery("d1", DeliveryStatus::Pending));
        store.add(delivery("d2", DeliveryStatus::Pending));

        let ids: Vec<String> = store.snapshot().deliveries.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, vec!["d2", "d1"]);
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let store = store_with(vec![
            delivery("a", DeliveryStatus::Pending),
            delivery("b", DeliveryStatus::Pending),
            delivery("c", DeliveryStatus::Pending),
        ]);

        store.remove("b");
        let ids: Vec<String> = store.snapshot().deliveries.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let before = store.snapshot();
        store.remove("b");
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn readers_keep_their_snapshot_across_writes() {
        let store = store_with(seed::deliveries());
        let held = store.snapshot();

        store.replace_all(Vec::new());

        assert_eq!(held.deliveries.len(), 3);
        assert!(store.snapshot().deliveries.is_empty());
    }

    #[test]
    fn writes_persist_but_ui_state_does_not() {
        let slot = std::sync::Arc::new(MemorySlot::new());
        let store = DeliveryStore::new(
            seed::initial_state(),
            Box::new(slot.clone()),
            16,
        );

        store.set_loading(true);
        store.select(seed::deliveries().into_iter().next());
        assert!(slot.payload().is_none());
        assert!(store.snapshot().is_loading);
        assert!(store.snapshot().selected_delivery.is_some());

        store.update_status("1", DeliveryStatus::Collected);
        let snapshot = persistence::decode(&slot.payload().unwrap()).unwrap();
        assert_eq!(snapshot.deliveries[0].status, DeliveryStatus::Collected);
        assert_eq!(snapshot.driver, store.snapshot().driver);
    }

    #[test]
    fn failed_snapshot_write_still_applies_the_change() {
        let store = DeliveryStore::new(seed::initial_state(), Box::new(FullDisk), 16);
        let mut events = store.subscribe();

        store.update_status("1", DeliveryStatus::Collected);

        assert_eq!(store.snapshot().deliveries[0].status, DeliveryStatus::Collected);
        assert_eq!(events.try_recv().unwrap().operation, StoreOp::UpdateStatus);

        let snapshot_writes = &store.metrics().snapshot_writes_total;
        assert_eq!(snapshot_writes.with_label_values(&["error"]).get(), 1);
        assert_eq!(snapshot_writes.with_label_values(&["success"]).get(), 0);
    }

    #[test]
    fn status_rewind_keeps_legs_and_duration() {
        let store = store_with(seed::deliveries());
        let before = store.snapshot().deliveries[2].clone();
        assert_eq!(before.status, DeliveryStatus::Delivered);

        store.update_status("3", DeliveryStatus::Pending);
        store.advance("3");

        let after = &store.snapshot().deliveries[2];
        assert_eq!(after.status, DeliveryStatus::Collected);
        assert_eq!(after.actual_duration, Some(85));
        assert_eq!(after.pickup.completed_time, before.pickup.completed_time);
        assert_eq!(after.delivery.completed_time, before.delivery.completed_time);
    }

    #[test]
    fn open_restores_snapshot() {
        let mut state = seed::initial_state();
        state.deliveries.truncate(1);
        state.driver = None;
        let payload = persistence::encode(&state).unwrap();

        let store = DeliveryStore::open(Box::new(MemorySlot::with_payload(payload)), 16);
        let restored = store.snapshot();
        assert_eq!(restored.deliveries, state.deliveries);
        assert!(restored.driver.is_none());
    }

    #[test]
    fn open_falls_back_to_seed_on_corrupt_snapshot() {
        let store = DeliveryStore::open(Box::new(MemorySlot::with_payload("{\"state\":")), 16);
        assert_eq!(*store.snapshot(), seed::initial_state());
    }

    #[test]
    fn open_uses_seed_when_slot_is_empty() {
        let store = DeliveryStore::open(Box::new(MemorySlot::new()), 16);
        assert_eq!(store.snapshot().deliveries.len(), 3);
    }

    #[test]
    fn writes_are_announced() {
        let store = store_with(seed::deliveries());
        let mut events = store.subscribe();

        store.remove("3");
        let event = events.try_recv().unwrap();
        assert_eq!(event.operation, StoreOp::Remove);
        assert_eq!(event.delivery_id.as_deref(), Some("3"));
    }
}
