//! Booking policy configuration.
//!
//! All tunables the scheduling model depends on live in one explicitly
//! loaded value that is passed into the services at construction time,
//! never read from ambient global state.
use anyhow::{Context, Result};
use chrono::NaiveTime;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingPolicy {
    /// First slot of the business day
    pub opening: NaiveTime,
    /// End of the business day (exclusive; no slot starts at or after it)
    pub closing: NaiveTime,
    /// Grid granularity
    pub slot_minutes: i64,
    /// Cancelling closer to the start than this schedules a booking
    /// restriction for the client
    pub cancellation_tolerance_minutes: i64,
    /// How long the restriction lasts
    pub penalty_minutes: i64,
    /// Used when a month has no revenue pool record yet
    pub default_distribution_percentage: f64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            opening: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closing: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            slot_minutes: 15,
            cancellation_tolerance_minutes: 120,
            penalty_minutes: 48 * 60,
            default_distribution_percentage: 70.0,
        }
    }
}

impl BookingPolicy {
    /// Load the policy from a JSON file, falling back to defaults when the
    /// file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(
                "No booking policy file at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read booking policy from {}", path.display()))?;
        let policy: BookingPolicy = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid booking policy in {}", path.display()))?;
        info!("Loaded booking policy from {}", path.display());
        Ok(policy)
    }
}
