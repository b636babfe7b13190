//! Domain model for an appointment and its service line items.
//!
//! Appointment status is a closed enum with an explicit transition table;
//! all status checks go through [`Appointment::can_transition`] rather than
//! string comparisons at call sites.
use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Open appointments hold their slot and count against the
    /// single-active-booking rule for subscribers.
    pub fn is_open(self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(anyhow!("Unknown appointment status: {}", other)),
        }
    }
}

/// Owning client: a registered account or an anonymous walk-in guest,
/// never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientRef {
    Registered { client_id: String },
    Guest { name: String, phone: String },
}

impl ClientRef {
    pub fn client_id(&self) -> Option<&str> {
        match self {
            ClientRef::Registered { client_id } => Some(client_id),
            ClientRef::Guest { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub client: ClientRef,
    pub barber_id: String,
    /// Primary service chosen at booking time; its line item is the one
    /// marked original.
    pub service_id: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    /// Derived: start + sum of attached line durations. Only the line-item
    /// composer writes this field.
    pub end: NaiveTime,
    pub status: AppointmentStatus,
    pub via_subscription: bool,
    pub walk_in: bool,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn generate_id() -> String {
        format!("appt::{}", uuid::Uuid::new_v4())
    }

    /// The lifecycle transition table.
    ///
    /// Pending -> Confirmed -> Completed, with cancellation possible from
    /// either open state. A pending walk-in may be completed directly
    /// (admin-created walk-ins skip confirmation); everything else must be
    /// confirmed first. Completed and Cancelled are terminal.
    pub fn can_transition(&self, to: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        match (self.status, to) {
            (Pending, Confirmed) => true,
            (Pending, Cancelled) => true,
            (Confirmed, Completed) => true,
            (Confirmed, Cancelled) => true,
            (Pending, Completed) => self.walk_in,
            _ => false,
        }
    }
}

/// One billable line on an appointment. The line created at booking is
/// marked original and can never be removed; extras added later can.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentLine {
    pub id: String,
    pub appointment_id: String,
    pub service_id: String,
    /// Price captured when the line was attached, stable against later
    /// catalog price changes.
    pub price_at_time: f64,
    /// Duration captured when the line was attached.
    pub duration_minutes: i64,
    /// Point weight captured when the line was attached. Equals the
    /// duration unless the catalog entry carries a custom weight.
    pub points: i64,
    pub original: bool,
}

impl AppointmentLine {
    pub fn generate_id() -> String {
        format!("line::{}", uuid::Uuid::new_v4())
    }
}
