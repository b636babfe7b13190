//! Service line items attached to appointments.
//!
//! Every appointment is created with one original line capturing the
//! booked service's price and duration at booking time. Extra lines can
//! be attached while the appointment is open; the appointment's end time
//! is derived from the line durations, and each extension re-checks the
//! barber's availability for the grown range.
use anyhow::{anyhow, Result};
use log::info;
use std::sync::Arc;

use crate::domain::availability_service::AvailabilityService;
use crate::domain::calendar::{minutes_of, time_from_minutes};
use crate::domain::commands::line_items::{AddLineCommand, RemoveLineCommand};
use crate::domain::errors::BookingError;
use crate::domain::locks::DayLockRegistry;
use crate::domain::models::appointment::{Appointment, AppointmentLine};
use crate::storage::csv::{
    AppointmentLineRepository, AppointmentRepository, BarberRepository, CsvConnection,
    ServiceRepository,
};
use crate::storage::traits::{
    AppointmentLineStorage, AppointmentStorage, BarberStorage, ServiceStorage,
};

#[derive(Clone)]
pub struct LineItemService {
    appointment_repository: AppointmentRepository,
    line_repository: AppointmentLineRepository,
    barber_repository: BarberRepository,
    service_repository: ServiceRepository,
    locks: DayLockRegistry,
}

impl LineItemService {
    pub fn new(connection: Arc<CsvConnection>, locks: DayLockRegistry) -> Self {
        Self {
            appointment_repository: AppointmentRepository::new((*connection).clone()),
            line_repository: AppointmentLineRepository::new((*connection).clone()),
            barber_repository: BarberRepository::new((*connection).clone()),
            service_repository: ServiceRepository::new((*connection).clone()),
            locks,
        }
    }

    /// Attach an extra service to an open appointment, extending its end
    /// time. Fails if the grown range no longer fits the barber's day.
    pub fn add_line(&self, command: AddLineCommand) -> Result<AppointmentLine> {
        let mut appointment = self.load_open(&command.appointment_id)?;
        let service = self
            .service_repository
            .get_service(&command.service_id)?
            .ok_or_else(|| anyhow!("Service {} not found", command.service_id))?;
        if !service.active {
            return Err(anyhow!("Service {} is not bookable", service.name));
        }
        if service.duration_minutes <= 0 {
            return Err(anyhow!(BookingError::InvalidRange));
        }
        let barber = self
            .barber_repository
            .get_barber(&appointment.barber_id)?
            .ok_or_else(|| anyhow!("Barber {} not found", appointment.barber_id))?;

        let lock = self.locks.lock_for(&appointment.barber_id, appointment.date);
        let _guard = lock.lock().unwrap();

        let existing = self
            .appointment_repository
            .list_for_barber_on(&appointment.barber_id, appointment.date)?;
        let start = minutes_of(appointment.start);
        let grown_end = minutes_of(appointment.end) + service.duration_minutes;
        AvailabilityService::check_range(
            &barber,
            appointment.date,
            start,
            grown_end,
            &existing,
            Some(&appointment.id),
        )?;

        let line = AppointmentLine {
            id: AppointmentLine::generate_id(),
            appointment_id: appointment.id.clone(),
            service_id: service.id,
            price_at_time: service.price,
            duration_minutes: service.duration_minutes,
            points: service.points,
            original: false,
        };
        self.line_repository.store_line(&line)?;

        appointment.end = time_from_minutes(grown_end);
        self.appointment_repository.update_appointment(&appointment)?;

        info!(
            "Added line {} ({}) to appointment {}, new end {}",
            line.id, service.name, appointment.id, appointment.end
        );
        Ok(line)
    }

    /// Detach an added line and shrink the appointment back. The original
    /// line is immutable.
    pub fn remove_line(&self, command: RemoveLineCommand) -> Result<()> {
        let mut appointment = self.load_open(&command.appointment_id)?;
        let lines = self.line_repository.list_lines(&appointment.id)?;
        let line = lines
            .iter()
            .find(|l| l.id == command.line_id)
            .ok_or_else(|| {
                anyhow!("Line {} not found on appointment {}", command.line_id, appointment.id)
            })?;
        if line.original {
            return Err(anyhow!(BookingError::OriginalLineItemImmutable));
        }

        let lock = self.locks.lock_for(&appointment.barber_id, appointment.date);
        let _guard = lock.lock().unwrap();

        self.line_repository
            .delete_line(&appointment.id, &command.line_id)?;

        let remaining: i64 = lines
            .iter()
            .filter(|l| l.id != command.line_id)
            .map(|l| l.duration_minutes)
            .sum();
        appointment.end = time_from_minutes(minutes_of(appointment.start) + remaining);
        self.appointment_repository.update_appointment(&appointment)?;

        info!(
            "Removed line {} from appointment {}, new end {}",
            command.line_id, appointment.id, appointment.end
        );
        Ok(())
    }

    pub fn lines(&self, appointment_id: &str) -> Result<Vec<AppointmentLine>> {
        self.line_repository.list_lines(appointment_id)
    }

    /// Total owed for an appointment: the sum of its captured line prices.
    /// Catalog price changes after booking never affect this figure.
    pub fn total_price(&self, appointment_id: &str) -> Result<f64> {
        let lines = self.line_repository.list_lines(appointment_id)?;
        Ok(lines.iter().map(|l| l.price_at_time).sum())
    }

    fn load_open(&self, appointment_id: &str) -> Result<Appointment> {
        let appointment = self
            .appointment_repository
            .get_appointment(appointment_id)?
            .ok_or_else(|| anyhow!("Appointment {} not found", appointment_id))?;
        if !appointment.status.is_open() {
            return Err(anyhow!(
                "Appointment {} is {} and can no longer be modified",
                appointment.id,
                appointment.status.as_str()
            ));
        }
        Ok(appointment)
    }
}
