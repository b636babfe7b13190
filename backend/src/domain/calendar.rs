//! Calendar grid generation and minute arithmetic.
//!
//! The grid is the canonical ordered set of slot labels for a business
//! day. Generation is pure and deterministic: recomputed per call from the
//! booking policy, never cached across days. All interval comparisons in
//! the scheduling model run on minutes since midnight produced here.
use crate::domain::policy::BookingPolicy;
use chrono::{NaiveTime, Timelike};

/// Ordered slot labels from opening (inclusive) to closing (exclusive).
pub fn slot_grid(policy: &BookingPolicy) -> Vec<NaiveTime> {
    let step = policy.slot_minutes.max(1);
    let mut slots = Vec::new();
    let mut cursor = minutes_of(policy.opening);
    let closing = minutes_of(policy.closing);
    while cursor < closing {
        slots.push(time_from_minutes(cursor));
        cursor += step;
    }
    slots
}

/// Minutes since midnight.
pub fn minutes_of(time: NaiveTime) -> i64 {
    time.hour() as i64 * 60 + time.minute() as i64
}

pub fn time_from_minutes(minutes: i64) -> NaiveTime {
    let clamped = minutes.clamp(0, 24 * 60 - 1);
    NaiveTime::from_hms_opt((clamped / 60) as u32, (clamped % 60) as u32, 0).unwrap()
}

/// Half-open interval test: `start <= t < end`.
pub fn within(t: i64, start: i64, end: i64) -> bool {
    start <= t && t < end
}

/// Half-open interval overlap: `[a_start, a_end)` intersects `[b_start, b_end)`.
pub fn overlaps(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    a_start < b_end && b_start < a_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_business_day_at_fixed_step() {
        let policy = BookingPolicy::default();
        let grid = slot_grid(&policy);

        // 09:00..20:00 at 15 minutes = 44 slots
        assert_eq!(grid.len(), 44);
        assert_eq!(grid[0], NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(grid[1], NaiveTime::from_hms_opt(9, 15, 0).unwrap());
        assert_eq!(*grid.last().unwrap(), NaiveTime::from_hms_opt(19, 45, 0).unwrap());
    }

    #[test]
    fn grid_excludes_closing_time() {
        let policy = BookingPolicy::default();
        let grid = slot_grid(&policy);
        assert!(!grid.contains(&policy.closing));
    }

    #[test]
    fn grid_is_deterministic() {
        let policy = BookingPolicy::default();
        assert_eq!(slot_grid(&policy), slot_grid(&policy));
    }

    #[test]
    fn minute_conversion_round_trips() {
        let t = NaiveTime::from_hms_opt(13, 45, 0).unwrap();
        assert_eq!(minutes_of(t), 13 * 60 + 45);
        assert_eq!(time_from_minutes(minutes_of(t)), t);
    }

    #[test]
    fn overlap_is_half_open() {
        // Touching intervals do not overlap
        assert!(!overlaps(60, 90, 90, 120));
        assert!(overlaps(60, 91, 90, 120));
        assert!(overlaps(60, 120, 90, 100));
    }
}
