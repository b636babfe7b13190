use serde::{Deserialize, Serialize};

/// Status of a single calendar slot for rendering purposes.
///
/// Mirrors the domain classification; the backend maps its internal slot
/// states onto these before they cross the API boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotStatus {
    /// Barber is not working at this time (day off in schedule, or outside shift)
    NonWorking,
    /// Slot falls inside an active time-off window (day off, vacation, block)
    Blocked,
    /// Slot falls inside a recurring break window
    Break,
    /// Slot is the exact start of a booked appointment
    Appointment,
    /// Slot falls strictly inside another appointment's interval
    Occupied,
    /// Slot can be booked
    Available,
}

/// One slot on a barber's day sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDto {
    /// Time label, "HH:MM"
    pub time: String,
    pub status: SlotStatus,
    /// Present when `status` is `Appointment`
    pub appointment_id: Option<String>,
    /// Break label, present when `status` is `Break`
    pub label: Option<String>,
}

/// A barber's full classified day, one entry per grid slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySheetResponse {
    pub barber_id: String,
    /// "YYYY-MM-DD"
    pub date: String,
    pub slots: Vec<SlotDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentDto {
    pub id: String,
    pub barber_id: String,
    pub service_id: String,
    /// Registered client id, mutually exclusive with the guest fields
    pub client_id: Option<String>,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    /// "YYYY-MM-DD"
    pub date: String,
    /// "HH:MM"
    pub start: String,
    /// "HH:MM" — always derived from the attached service lines
    pub end: String,
    /// "pending" | "confirmed" | "completed" | "cancelled"
    pub status: String,
    pub via_subscription: bool,
    pub walk_in: bool,
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentLineDto {
    pub id: String,
    pub service_id: String,
    pub price_at_time: f64,
    pub duration_minutes: i64,
    pub points: i64,
    pub original: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarberDto {
    pub id: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDto {
    pub id: String,
    pub name: String,
    pub duration_minutes: i64,
    pub price: f64,
    pub active: bool,
}

/// Request to book an appointment (client self-service or admin walk-in).
///
/// Exactly one of `client_id` or the guest fields must be provided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub barber_id: String,
    pub service_id: String,
    pub client_id: Option<String>,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    /// "YYYY-MM-DD"
    pub date: String,
    /// "HH:MM"
    pub start: String,
    /// Book against the client's active subscription
    #[serde(default)]
    pub via_subscription: bool,
    /// Admin-created walk-in (may later be completed without confirmation)
    #[serde(default)]
    pub walk_in: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    /// Client-requested cancellations are subject to the penalty window
    #[serde(default)]
    pub cancelled_by_client: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddLineRequest {
    pub service_id: String,
}

/// Monthly commission report for all barbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionReportDto {
    /// "YYYY-MM"
    pub month: String,
    pub total_revenue: f64,
    pub distributable: f64,
    pub reserved: f64,
    pub total_points: i64,
    /// Ordered by points descending (stable ties)
    pub rows: Vec<CommissionRowDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRowDto {
    pub barber_id: String,
    pub barber_name: String,
    pub points: i64,
    pub completed_count: u32,
    /// Completed-appointment minutes plus manual-entry minutes
    pub total_minutes: i64,
    pub automatic_amount: f64,
    pub manual_amount: f64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRevenuePoolRequest {
    pub total_revenue: f64,
    /// 0–100; the remainder of the pool is reserved
    pub distribution_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualEntryRequest {
    pub barber_id: String,
    /// "YYYY-MM-DD"
    pub date: String,
    pub minutes: i64,
    pub description: String,
    pub amount: f64,
}

/// Payment-processor notification. The engine only reacts to two events:
/// "activated" and "cancelled" (the latter also covers payment failure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionWebhookRequest {
    pub event: String,
    pub client_id: String,
    pub plan_name: Option<String>,
    pub cuts_per_period: Option<u32>,
    pub preferred_barber_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayScheduleDto {
    pub working: bool,
    /// "HH:MM"
    pub start: String,
    /// "HH:MM"
    pub end: String,
}

/// Full weekly schedule, Monday first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub days: Vec<DayScheduleDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakRequest {
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u8,
    pub start: String,
    pub end: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOffRequest {
    /// "YYYY-MM-DD"
    pub starts_on: String,
    /// "YYYY-MM-DD", inclusive
    pub ends_on: String,
    /// "day_off" | "vacation" | "block"
    pub kind: String,
}

/// Structured error payload returned for all recoverable domain errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error kind, e.g. "slot_unavailable"
    pub error: String,
    /// Human-readable context (conflicting appointment id, current status, ...)
    pub detail: Option<String>,
}
