//! Domain models for client subscriptions and booking restrictions.
use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "active" => Ok(SubscriptionStatus::Active),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            other => Err(anyhow!("Unknown subscription status: {}", other)),
        }
    }
}

/// A client's subscription with its current billing period.
///
/// `cuts_used` resets to 0 when the period rolls over and the booking gate
/// keeps it from exceeding `cuts_per_period`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSubscription {
    pub id: String,
    pub client_id: String,
    pub plan_name: String,
    pub cuts_per_period: u32,
    pub preferred_barber_id: Option<String>,
    pub status: SubscriptionStatus,
    pub period_start: NaiveDate,
    /// Inclusive
    pub period_end: NaiveDate,
    pub cuts_used: u32,
}

impl ClientSubscription {
    pub fn generate_id() -> String {
        format!("sub::{}", uuid::Uuid::new_v4())
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

/// Time-boxed booking ban scheduled by a late cancellation. Not an error
/// at cancellation time; surfaces later as a `SubscriptionLimitExceeded`
/// when the client tries to book again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRestriction {
    pub id: String,
    pub client_id: String,
    pub restricted_until: NaiveDateTime,
    pub reason: String,
}

impl BookingRestriction {
    pub fn generate_id() -> String {
        format!("restriction::{}", uuid::Uuid::new_v4())
    }

    pub fn in_force(&self, now: NaiveDateTime) -> bool {
        now < self.restricted_until
    }
}
