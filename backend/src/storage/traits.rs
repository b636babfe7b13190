//! # Storage Traits
//!
//! Storage abstraction traits that let the domain layer work against
//! different backends (CSV files today, a SQL database tomorrow) without
//! modification. All operations are synchronous; the REST layer calls the
//! services directly.
use anyhow::Result;
use chrono::NaiveDate;

use crate::domain::models::appointment::{Appointment, AppointmentLine};
use crate::domain::models::barber::Barber;
use crate::domain::models::commission::{BillingMonth, ManualCommissionEntry, RevenuePool};
use crate::domain::models::service::Service;
use crate::domain::models::subscription::{BookingRestriction, ClientSubscription};

/// Interface for barber storage, including the nested schedule, break and
/// time-off records the barber owns.
pub trait BarberStorage: Send + Sync {
    /// Store a new barber
    fn store_barber(&self, barber: &Barber) -> Result<()>;

    /// Retrieve a specific barber by ID
    fn get_barber(&self, barber_id: &str) -> Result<Option<Barber>>;

    /// List all barbers in insertion order
    fn list_barbers(&self) -> Result<Vec<Barber>>;

    /// Update an existing barber (schedule, breaks, time-off, flags)
    fn update_barber(&self, barber: &Barber) -> Result<()>;
}

/// Interface for the service catalog.
pub trait ServiceStorage: Send + Sync {
    fn store_service(&self, service: &Service) -> Result<()>;

    fn get_service(&self, service_id: &str) -> Result<Option<Service>>;

    /// List all services in insertion order
    fn list_services(&self) -> Result<Vec<Service>>;

    fn update_service(&self, service: &Service) -> Result<()>;
}

/// Interface for appointment storage.
pub trait AppointmentStorage: Send + Sync {
    fn store_appointment(&self, appointment: &Appointment) -> Result<()>;

    fn get_appointment(&self, appointment_id: &str) -> Result<Option<Appointment>>;

    /// Update an existing appointment (status, derived end time)
    fn update_appointment(&self, appointment: &Appointment) -> Result<()>;

    /// All appointments for one barber on one date, cancelled included;
    /// the domain layer decides which statuses matter
    fn list_for_barber_on(&self, barber_id: &str, date: NaiveDate) -> Result<Vec<Appointment>>;

    /// Completed appointments whose date falls in the given month
    fn list_completed_in_month(&self, month: BillingMonth) -> Result<Vec<Appointment>>;

    /// Open (pending/confirmed) appointments owned by a registered client
    fn list_open_for_client(&self, client_id: &str) -> Result<Vec<Appointment>>;
}

/// Interface for appointment service line items.
pub trait AppointmentLineStorage: Send + Sync {
    fn store_line(&self, line: &AppointmentLine) -> Result<()>;

    /// Lines for one appointment, original first, then attachment order
    fn list_lines(&self, appointment_id: &str) -> Result<Vec<AppointmentLine>>;

    /// Delete a line. Returns true if it was found and deleted.
    fn delete_line(&self, appointment_id: &str, line_id: &str) -> Result<bool>;
}

/// Interface for client subscriptions and booking restrictions.
pub trait SubscriptionStorage: Send + Sync {
    fn store_subscription(&self, subscription: &ClientSubscription) -> Result<()>;

    /// A client's subscription record, if any (one per client)
    fn get_for_client(&self, client_id: &str) -> Result<Option<ClientSubscription>>;

    fn update_subscription(&self, subscription: &ClientSubscription) -> Result<()>;

    fn store_restriction(&self, restriction: &BookingRestriction) -> Result<()>;

    /// Most recently issued restriction for a client, if any
    fn latest_restriction_for_client(&self, client_id: &str) -> Result<Option<BookingRestriction>>;
}

/// Interface for revenue pools and manual commission entries.
pub trait CommissionStorage: Send + Sync {
    /// Insert or replace the pool for a month (last writer wins)
    fn upsert_pool(&self, pool: &RevenuePool) -> Result<()>;

    fn get_pool(&self, month: BillingMonth) -> Result<Option<RevenuePool>>;

    fn store_manual_entry(&self, entry: &ManualCommissionEntry) -> Result<()>;

    fn get_manual_entry(&self, entry_id: &str) -> Result<Option<ManualCommissionEntry>>;

    fn update_manual_entry(&self, entry: &ManualCommissionEntry) -> Result<()>;

    /// Delete an entry. Returns true if it was found and deleted.
    fn delete_manual_entry(&self, entry_id: &str) -> Result<bool>;

    /// Manual entries whose date falls in the given month, insertion order
    fn list_manual_entries_for_month(&self, month: BillingMonth)
        -> Result<Vec<ManualCommissionEntry>>;
}
