//! Admin management of barbers: catalog listing, weekly schedules,
//! recurring breaks and one-off time-off blocks.
//!
//! Schedule edits only shape future availability. Appointments already on
//! the books stay untouched; the day sheet simply shows them alongside
//! the new blocked windows.
use anyhow::{anyhow, Result};
use log::info;
use std::sync::Arc;

use crate::domain::commands::barbers::{AddBreakCommand, AddTimeOffCommand, UpdateScheduleCommand};
use crate::domain::errors::BookingError;
use crate::domain::models::barber::{Barber, TimeOff};
use crate::storage::csv::{BarberRepository, CsvConnection};
use crate::storage::traits::BarberStorage;

#[derive(Clone)]
pub struct BarberService {
    barber_repository: BarberRepository,
}

impl BarberService {
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self {
            barber_repository: BarberRepository::new((*connection).clone()),
        }
    }

    pub fn list_barbers(&self) -> Result<Vec<Barber>> {
        self.barber_repository.list_barbers()
    }

    pub fn get_barber(&self, barber_id: &str) -> Result<Option<Barber>> {
        self.barber_repository.get_barber(barber_id)
    }

    /// Replace a barber's weekly schedule.
    pub fn update_schedule(&self, command: UpdateScheduleCommand) -> Result<Barber> {
        if command.schedule.days.len() != 7 {
            return Err(anyhow!(BookingError::InvalidRange));
        }
        for day in &command.schedule.days {
            if day.working && day.end <= day.start {
                return Err(anyhow!(BookingError::InvalidRange));
            }
        }
        let mut barber = self.load(&command.barber_id)?;
        barber.schedule = command.schedule;
        self.barber_repository.update_barber(&barber)?;
        info!("Updated weekly schedule for barber {}", barber.id);
        Ok(barber)
    }

    /// Add a recurring break window. Overlapping breaks are permitted;
    /// the resolver honors their union.
    pub fn add_break(&self, command: AddBreakCommand) -> Result<Barber> {
        command.break_window.validate()?;
        let mut barber = self.load(&command.barber_id)?;
        barber.breaks.push(command.break_window);
        self.barber_repository.update_barber(&barber)?;
        Ok(barber)
    }

    /// Block out a date range (day off, vacation, ad-hoc block).
    pub fn add_time_off(&self, command: AddTimeOffCommand) -> Result<TimeOff> {
        let time_off = TimeOff {
            id: TimeOff::generate_id(),
            starts_on: command.starts_on,
            ends_on: command.ends_on,
            kind: command.kind,
            active: true,
        };
        time_off.validate()?;
        let mut barber = self.load(&command.barber_id)?;
        barber.time_off.push(time_off.clone());
        self.barber_repository.update_barber(&barber)?;
        info!(
            "Added {} for barber {} from {} to {}",
            time_off.kind.as_str(),
            barber.id,
            time_off.starts_on,
            time_off.ends_on
        );
        Ok(time_off)
    }

    /// Deactivate a time-off block without losing the record.
    pub fn cancel_time_off(&self, barber_id: &str, time_off_id: &str) -> Result<()> {
        let mut barber = self.load(barber_id)?;
        let entry = barber
            .time_off
            .iter_mut()
            .find(|t| t.id == time_off_id)
            .ok_or_else(|| anyhow!("Time off {} not found on barber {}", time_off_id, barber_id))?;
        entry.active = false;
        self.barber_repository.update_barber(&barber)?;
        Ok(())
    }

    fn load(&self, barber_id: &str) -> Result<Barber> {
        self.barber_repository
            .get_barber(barber_id)?
            .ok_or_else(|| anyhow!("Barber {} not found", barber_id))
    }
}
