//! # Domain Layer
//!
//! Business logic for scheduling and commission allocation, organized as
//! services over the storage traits. The REST layer maps public DTOs to
//! the command types in [`commands`] and calls the services; nothing in
//! here knows about HTTP.
pub mod appointment_service;
pub mod availability_service;
pub mod barber_service;
pub mod calendar;
pub mod commands;
pub mod commission_service;
pub mod errors;
pub mod line_item_service;
pub mod locks;
pub mod models;
pub mod points_service;
pub mod policy;
pub mod subscription_service;

pub use appointment_service::AppointmentService;
pub use availability_service::AvailabilityService;
pub use barber_service::BarberService;
pub use commission_service::CommissionService;
pub use errors::BookingError;
pub use line_item_service::LineItemService;
pub use locks::DayLockRegistry;
pub use points_service::PointsService;
pub use policy::BookingPolicy;
pub use subscription_service::SubscriptionService;
