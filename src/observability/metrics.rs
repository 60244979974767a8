use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::engine::selectors::StatusCounts;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub store_writes_total: IntCounterVec,
    pub snapshot_writes_total: IntCounterVec,
    pub deliveries: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let store_writes_total = IntCounterVec::new(
            Opts::new("store_writes_total", "Applied store writes by operation"),
            &["operation"],
        )
        .expect("valid store_writes_total metric");

        let snapshot_writes_total = IntCounterVec::new(
            Opts::new("snapshot_writes_total", "Snapshot slot writes by outcome"),
            &["outcome"],
        )
        .expect("valid snapshot_writes_total metric");

        let deliveries = IntGaugeVec::new(
            Opts::new("deliveries", "Deliveries currently held, by status"),
            &["status"],
        )
        .expect("valid deliveries metric");

        registry
            .register(Box::new(store_writes_total.clone()))
            .expect("register store_writes_total");
        registry
            .register(Box::new(snapshot_writes_total.clone()))
            .expect("register snapshot_writes_total");
        registry
            .register(Box::new(deliveries.clone()))
            .expect("register deliveries");

        Self {
            registry,
            store_writes_total,
            snapshot_writes_total,
            deliveries,
        }
    }

    pub fn record_status_counts(&self, counts: &StatusCounts) {
        for (status, count) in &counts.by_status {
            self.deliveries
                .with_label_values(&[*status])
                .set(i64::try_from(*count).unwrap_or(i64::MAX));
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
