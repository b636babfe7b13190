//! Booking lock registry.
//!
//! The booking flow must evaluate its checks and the appointment insert
//! as one atomic unit, otherwise two concurrent requests can both observe
//! the same state and both write. The CSV store has no transactions, so
//! the services serialize through the locks handed out here, on two
//! dimensions: per (barber, date) for the slot-overlap check, and per
//! client for the subscription gate. Lock order is always client first,
//! then barber-day.
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct DayLockRegistry {
    locks: Arc<Mutex<HashMap<(String, NaiveDate), Arc<Mutex<()>>>>>,
    client_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl DayLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock guarding all writes to one barber's schedule on one date.
    /// Callers hold the returned mutex across re-read, overlap check, and
    /// write.
    pub fn lock_for(&self, barber_id: &str, date: NaiveDate) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry((barber_id.to_string(), date))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Lock serializing one registered client's booking-gate evaluation
    /// and insert, so the open-appointment and quota checks cannot race
    /// against a second booking by the same client. Acquired before any
    /// barber-day lock, never after.
    pub fn client_lock_for(&self, client_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.client_locks.lock().unwrap();
        locks
            .entry(client_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_barber_day_shares_a_lock() {
        let registry = DayLockRegistry::new();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let a = registry.lock_for("barber-1", date);
        let b = registry.lock_for("barber-1", date);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_days_do_not_contend() {
        let registry = DayLockRegistry::new();
        let a = registry.lock_for("barber-1", NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        let b = registry.lock_for("barber-1", NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn same_client_shares_a_lock() {
        let registry = DayLockRegistry::new();
        let a = registry.client_lock_for("client-1");
        let b = registry.client_lock_for("client-1");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &registry.client_lock_for("client-2")));
    }
}
