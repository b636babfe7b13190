//! Appointment scheduling and commission allocation engine for a
//! barbershop: slot-grid availability, appointment lifecycle, service
//! line items, monthly points, proportional commission distribution, and
//! subscription usage tracking.
pub mod domain;
pub mod rest;
pub mod storage;
