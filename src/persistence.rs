//! Snapshot slot: the persisted `{deliveries, driver}` subset of store state.
//!
//! Payload layout:
//! `{"state": {"deliveries": [...], "driver": {...} | null}, "version": 0}`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::delivery::Delivery;
use crate::models::driver::Driver;
use crate::state::StoreState;

pub const SNAPSHOT_VERSION: u32 = 0;

/// A single named location that holds the latest snapshot payload.
pub trait SnapshotSlot: Send + Sync {
    /// `Ok(None)` when nothing has been written yet.
    fn load(&self) -> Result<Option<String>, AppError>;

    fn store(&self, payload: &str) -> Result<(), AppError>;
}

impl<T: SnapshotSlot + ?Sized> SnapshotSlot for Arc<T> {
    fn load(&self) -> Result<Option<String>, AppError> {
        (**self).load()
    }

    fn store(&self, payload: &str) -> Result<(), AppError> {
        (**self).store(payload)
    }
}

/// Stores key `k` as `<dir>/k.json`.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>, key: &str) -> Self {
        Self {
            path: dir.into().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSlot for FileSlot {
    fn load(&self) -> Result<Option<String>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&self, payload: &str) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Readers never see a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySlot {
    payload: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Mutex::new(Some(payload.into())),
        }
    }

    pub fn payload(&self) -> Option<String> {
        self.payload.lock().clone()
    }
}

impl SnapshotSlot for MemorySlot {
    fn load(&self) -> Result<Option<String>, AppError> {
        Ok(self.payload())
    }

    fn store(&self, payload: &str) -> Result<(), AppError> {
        *self.payload.lock() = Some(payload.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub deliveries: Vec<Delivery>,
    pub driver: Option<Driver>,
}

impl From<Snapshot> for StoreState {
    fn from(snapshot: Snapshot) -> Self {
        StoreState {
            deliveries: snapshot.deliveries,
            driver: snapshot.driver,
            is_loading: false,
            selected_delivery: None,
        }
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    deliveries: &'a [Delivery],
    driver: Option<&'a Driver>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: SnapshotRef<'a>,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    state: Snapshot,
    version: u32,
}

/// Serializes the persisted subset; loading flag and selection are left out.
pub fn encode(state: &StoreState) -> Result<String, AppError> {
    let envelope = EnvelopeRef {
        state: SnapshotRef {
            deliveries: &state.deliveries,
            driver: state.driver.as_ref(),
        },
        version: SNAPSHOT_VERSION,
    };

    Ok(serde_json::to_string(&envelope)?)
}

pub fn decode(payload: &str) -> Result<Snapshot, AppError> {
    let envelope: Envelope = serde_json::from_str(payload)?;
    if envelope.version != SNAPSHOT_VERSION {
        return Err(AppError::Internal(format!(
            "unsupported snapshot version {}",
            envelope.version
        )));
    }

    Ok(envelope.state)
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, FileSlot, MemorySlot, SnapshotSlot};
    use crate::models::delivery::DeliveryStatus;
    use crate::seed;

    #[test]
    fn snapshot_round_trip_drops_ephemeral_fields() {
        let mut state = seed::initial_state();
        state.is_loading = true;
        state.selected_delivery = state.deliveries.first().cloned();

        let payload = encode(&state).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["version"], 0);
        assert!(value["state"].get("isLoading").is_none());
        assert!(value["state"].get("selectedDelivery").is_none());

        let snapshot = decode(&payload).unwrap();
        assert_eq!(snapshot.deliveries, state.deliveries);
        assert_eq!(snapshot.driver, state.driver);
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let state = seed::initial_state();
        let payload = encode(&state).unwrap().replace("\"version\":0", "\"version\":7");
        assert!(decode(&payload).is_err());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode("{not json").is_err());
        assert!(decode("{\"state\": {\"deliveries\": 3}, \"version\": 0}").is_err());
    }

    #[test]
    fn decode_accepts_null_driver() {
        let snapshot = decode("{\"state\": {\"deliveries\": [], \"driver\": null}, \"version\": 0}")
            .unwrap();
        assert!(snapshot.deliveries.is_empty());
        assert!(snapshot.driver.is_none());
    }

    #[test]
    fn file_slot_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path(), "delivery-store");
        assert!(slot.load().unwrap().is_none());
    }

    #[test]
    fn file_slot_persists_under_key() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("nested"), "delivery-store");

        let mut state = seed::initial_state();
        state.deliveries[0].status = DeliveryStatus::Delayed;
        slot.store(&encode(&state).unwrap()).unwrap();

        assert!(slot.path().ends_with("nested/delivery-store.json"));
        let restored = decode(&slot.load().unwrap().unwrap()).unwrap();
        assert_eq!(restored.deliveries[0].status, DeliveryStatus::Delayed);
    }

    #[test]
    fn memory_slot_keeps_last_payload() {
        let slot = MemorySlot::new();
        assert!(slot.load().unwrap().is_none());

        slot.store("first").unwrap();
        slot.store("second").unwrap();
        assert_eq!(slot.payload().as_deref(), Some("second"));
    }
}
