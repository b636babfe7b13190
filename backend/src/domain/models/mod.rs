pub mod appointment;
pub mod barber;
pub mod commission;
pub mod service;
pub mod subscription;
