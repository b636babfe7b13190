//! Domain-level command and query types.
//! These structs are consumed by the services inside the domain layer and
//! are **not** exposed over the public API. The REST layer is responsible
//! for mapping the public DTOs defined in the `shared` crate to these
//! internal types.

pub mod scheduling {
    use chrono::NaiveDate;

    /// Query for one barber's classified day sheet.
    #[derive(Debug, Clone)]
    pub struct DaySheetQuery {
        pub barber_id: String,
        pub date: NaiveDate,
    }
}

pub mod appointments {
    use crate::domain::models::appointment::ClientRef;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    /// Input for creating an appointment, both client self-service
    /// bookings and admin walk-ins.
    #[derive(Debug, Clone)]
    pub struct BookAppointmentCommand {
        pub client: ClientRef,
        pub barber_id: String,
        pub service_id: String,
        pub date: NaiveDate,
        pub start: NaiveTime,
        pub via_subscription: bool,
        pub walk_in: bool,
        /// Booking instant; defaults to the current local time. Injected
        /// so restriction checks are testable.
        pub now: Option<NaiveDateTime>,
    }

    #[derive(Debug, Clone)]
    pub struct ConfirmAppointmentCommand {
        pub appointment_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct CancelAppointmentCommand {
        pub appointment_id: String,
        /// Client-requested cancellations are subject to the penalty window
        pub cancelled_by_client: bool,
        /// Cancellation instant; defaults to the current local time
        pub now: Option<NaiveDateTime>,
    }

    #[derive(Debug, Clone)]
    pub struct CompleteAppointmentCommand {
        pub appointment_id: String,
    }
}

pub mod line_items {
    /// Input for attaching an extra service to an open appointment.
    #[derive(Debug, Clone)]
    pub struct AddLineCommand {
        pub appointment_id: String,
        pub service_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct RemoveLineCommand {
        pub appointment_id: String,
        pub line_id: String,
    }
}

pub mod commissions {
    use crate::domain::models::commission::BillingMonth;
    use chrono::NaiveDate;

    #[derive(Debug, Clone)]
    pub struct CommissionReportQuery {
        pub month: BillingMonth,
    }

    /// Upsert of a month's revenue pool; last writer wins.
    #[derive(Debug, Clone)]
    pub struct UpsertRevenuePoolCommand {
        pub month: BillingMonth,
        pub total_revenue: f64,
        pub distribution_percentage: f64,
    }

    #[derive(Debug, Clone)]
    pub struct AddManualEntryCommand {
        pub barber_id: String,
        pub date: NaiveDate,
        pub minutes: i64,
        pub description: String,
        pub amount: f64,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateManualEntryCommand {
        pub entry_id: String,
        pub date: NaiveDate,
        pub minutes: i64,
        pub description: String,
        pub amount: f64,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteManualEntryCommand {
        pub entry_id: String,
    }
}

pub mod subscriptions {
    /// Reaction to the processor's "subscription activated" notification.
    #[derive(Debug, Clone)]
    pub struct ActivateSubscriptionCommand {
        pub client_id: String,
        pub plan_name: String,
        pub cuts_per_period: u32,
        pub preferred_barber_id: Option<String>,
    }

    /// Reaction to "subscription cancelled" / "payment failed".
    #[derive(Debug, Clone)]
    pub struct DeactivateSubscriptionCommand {
        pub client_id: String,
    }
}

pub mod barbers {
    use crate::domain::models::barber::{BreakWindow, TimeOffKind, WeeklySchedule};
    use chrono::NaiveDate;

    #[derive(Debug, Clone)]
    pub struct UpdateScheduleCommand {
        pub barber_id: String,
        pub schedule: WeeklySchedule,
    }

    #[derive(Debug, Clone)]
    pub struct AddBreakCommand {
        pub barber_id: String,
        pub break_window: BreakWindow,
    }

    #[derive(Debug, Clone)]
    pub struct AddTimeOffCommand {
        pub barber_id: String,
        pub starts_on: NaiveDate,
        pub ends_on: NaiveDate,
        pub kind: TimeOffKind,
    }
}
