//! Domain models for the monthly points and commission calculation:
//! the billing month key, derived per-barber point totals, the revenue
//! pool, and manual commission adjustments.
use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar month key used by the points ledger, the revenue pool, and
/// manual entries. Rendered as "YYYY-MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingMonth {
    pub year: i32,
    pub month: u32,
}

impl BillingMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(anyhow!("Month out of range: {}", month));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn parse(value: &str) -> Result<Self> {
        let (year, month) = value
            .split_once('-')
            .ok_or_else(|| anyhow!("Invalid month key: {}", value))?;
        Self::new(year.parse()?, month.parse()?)
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Derived monthly snapshot for one barber. Always a view over the set of
/// completed appointments, recomputed on demand, never mutated directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarberPoints {
    pub barber_id: String,
    pub month: BillingMonth,
    pub total_points: i64,
    pub completed_count: u32,
    /// Equals points while every service keeps the default
    /// one-point-per-minute weight; diverges under custom weights.
    pub total_minutes: i64,
}

/// Monthly revenue amount and the share of it actually paid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePool {
    pub month: BillingMonth,
    pub total_revenue: f64,
    /// 0–100; the remainder is reserved (withheld).
    pub distribution_percentage: f64,
}

impl RevenuePool {
    pub fn validate(&self) -> Result<()> {
        use crate::domain::errors::BookingError;
        if !(0.0..=100.0).contains(&self.distribution_percentage) {
            return Err(anyhow!(BookingError::DistributionInputInvalid {
                detail: format!(
                    "distribution percentage {} outside [0, 100]",
                    self.distribution_percentage
                ),
            }));
        }
        if self.total_revenue < 0.0 {
            return Err(anyhow!(BookingError::DistributionInputInvalid {
                detail: format!("negative total revenue {}", self.total_revenue),
            }));
        }
        Ok(())
    }

    /// Amount actually distributed across barbers.
    pub fn distributable(&self) -> f64 {
        self.total_revenue * (self.distribution_percentage / 100.0)
    }

    /// Withheld remainder.
    pub fn reserved(&self) -> f64 {
        self.total_revenue - self.distributable()
    }
}

/// Out-of-band commission adjustment. Adds to a barber's payout and
/// displayed minutes but never to the points-distribution ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualCommissionEntry {
    pub id: String,
    pub barber_id: String,
    pub date: NaiveDate,
    pub minutes: i64,
    pub description: String,
    pub amount: f64,
}

impl ManualCommissionEntry {
    pub fn generate_id() -> String {
        format!("manual::{}", uuid::Uuid::new_v4())
    }
}
