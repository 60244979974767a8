use chrono::{DateTime, Utc};

use crate::models::delivery::{Delivery, DeliveryStatus};

/// Forward step offered to the driver: pending -> collected -> in_transit -> delivered.
/// Delivered, cancelled and delayed have no forward step.
pub fn next_status(status: DeliveryStatus) -> Option<DeliveryStatus> {
    match status {
        DeliveryStatus::Pending => Some(DeliveryStatus::Collected),
        DeliveryStatus::Collected => Some(DeliveryStatus::InTransit),
        DeliveryStatus::InTransit => Some(DeliveryStatus::Delivered),
        DeliveryStatus::Delivered | DeliveryStatus::Cancelled | DeliveryStatus::Delayed => None,
    }
}

/// Delayed is not counted as active.
pub fn is_active(status: DeliveryStatus) -> bool {
    matches!(
        status,
        DeliveryStatus::Pending | DeliveryStatus::Collected | DeliveryStatus::InTransit
    )
}

/// Copy of `delivery` carrying `status`. Any status is accepted; the
/// transition is not checked against the forward path. `updated_at` never
/// moves backwards, even if the wall clock does.
///
/// Only `status` and `updated_at` change. `actual_duration` is left as the
/// creator supplied it, so moving a delivered record back to pending keeps
/// its duration rather than clearing it.
pub fn with_status(delivery: &Delivery, status: DeliveryStatus, now: DateTime<Utc>) -> Delivery {
    let mut updated = delivery.clone();
    updated.status = status;
    updated.updated_at = now.max(delivery.updated_at);
    updated
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{is_active, next_status, with_status};
    use crate::models::delivery::DeliveryStatus;
    use crate::seed;

    #[test]
    fn forward_path_ends_at_delivered() {
        let mut status = DeliveryStatus::Pending;
        let mut path = vec![status];
        while let Some(next) = next_status(status) {
            status = next;
            path.push(next);
        }

        assert_eq!(
            path,
            vec![
                DeliveryStatus::Pending,
                DeliveryStatus::Collected,
                DeliveryStatus::InTransit,
                DeliveryStatus::Delivered,
            ]
        );
    }

    #[test]
    fn cancelled_and_delayed_have_no_forward_step() {
        assert_eq!(next_status(DeliveryStatus::Cancelled), None);
        assert_eq!(next_status(DeliveryStatus::Delayed), None);
    }

    #[test]
    fn delayed_is_not_active() {
        assert!(!is_active(DeliveryStatus::Delayed));
        assert!(!is_active(DeliveryStatus::Cancelled));
        assert!(is_active(DeliveryStatus::InTransit));
    }

    #[test]
    fn skipping_states_is_accepted() {
        let pending = &seed::deliveries()[0];
        let updated = with_status(pending, DeliveryStatus::Delivered, Utc::now());

        assert_eq!(updated.status, DeliveryStatus::Delivered);
        assert_eq!(updated.pickup, pending.pickup);
        assert_eq!(updated.created_at, pending.created_at);
    }

    #[test]
    fn updated_at_does_not_go_backwards() {
        let delivery = &seed::deliveries()[1];
        let earlier = delivery.updated_at - Duration::days(1);

        let updated = with_status(delivery, DeliveryStatus::InTransit, earlier);
        assert_eq!(updated.updated_at, delivery.updated_at);
    }
}
