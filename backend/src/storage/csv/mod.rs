//! # CSV Storage Module
//!
//! File-based storage backend for the scheduling engine. One CSV file per
//! entity family under a single data directory, with atomic full-file
//! rewrites (temp file + rename). The domain layer only sees the traits in
//! `storage::traits`, so this backend is swappable for a SQL one without
//! touching the services.
pub mod appointment_repository;
pub mod barber_repository;
pub mod commission_repository;
pub mod connection;
pub mod line_repository;
pub mod service_repository;
pub mod subscription_repository;

#[cfg(test)]
pub mod test_utils;

pub use appointment_repository::AppointmentRepository;
pub use barber_repository::BarberRepository;
pub use commission_repository::CommissionRepository;
pub use connection::CsvConnection;
pub use line_repository::AppointmentLineRepository;
pub use service_repository::ServiceRepository;
pub use subscription_repository::SubscriptionRepository;
