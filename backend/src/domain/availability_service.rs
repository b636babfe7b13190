//! Availability resolution for a barber's day.
//!
//! Classifies every slot of the calendar grid against the barber's weekly
//! schedule, recurring breaks, active time-off blocks, and existing
//! appointments. All comparisons run on minutes since midnight with
//! half-open `[start, end)` intervals: a slot equal to an appointment's
//! end time is free again.
use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate, NaiveTime};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::calendar::{self, minutes_of, overlaps, within};
use crate::domain::commands::scheduling::DaySheetQuery;
use crate::domain::errors::BookingError;
use crate::domain::models::appointment::Appointment;
use crate::domain::models::barber::Barber;
use crate::domain::policy::BookingPolicy;
use crate::storage::csv::{AppointmentRepository, BarberRepository, CsvConnection};
use crate::storage::traits::{AppointmentStorage, BarberStorage};

/// Classification of one grid slot.
///
/// Precedence when several could apply: non-working > blocked > the start
/// slot of a booked appointment > break > occupied > available. A day off
/// overrides a break, and a booked appointment's start slot wins over a
/// break scheduled across it (the booking already implies a deliberate
/// override); slots merely inside the appointment defer to the break
/// label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotState {
    NonWorking,
    Blocked,
    Break { label: String },
    AppointmentStart { appointment_id: String },
    Occupied,
    Available,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub time: NaiveTime,
    pub state: SlotState,
}

/// One barber's fully classified day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySheet {
    pub barber_id: String,
    pub date: NaiveDate,
    pub slots: Vec<SlotEntry>,
}

#[derive(Clone)]
pub struct AvailabilityService {
    barber_repository: BarberRepository,
    appointment_repository: AppointmentRepository,
    policy: BookingPolicy,
}

impl AvailabilityService {
    pub fn new(connection: Arc<CsvConnection>, policy: BookingPolicy) -> Self {
        Self {
            barber_repository: BarberRepository::new((*connection).clone()),
            appointment_repository: AppointmentRepository::new((*connection).clone()),
            policy,
        }
    }

    /// Load the barber and their appointments and classify the whole day.
    pub fn day_sheet(&self, query: DaySheetQuery) -> Result<DaySheet> {
        let barber = self
            .barber_repository
            .get_barber(&query.barber_id)?
            .ok_or_else(|| anyhow!("Barber {} not found", query.barber_id))?;
        let appointments = self
            .appointment_repository
            .list_for_barber_on(&query.barber_id, query.date)?;
        debug!(
            "Resolving availability for barber {} on {} against {} appointments",
            query.barber_id,
            query.date,
            appointments.len()
        );
        Ok(Self::classify_day(
            &self.policy,
            &barber,
            query.date,
            &appointments,
        ))
    }

    /// Pure classification of every grid slot. Cancelled appointments are
    /// treated as absent.
    pub fn classify_day(
        policy: &BookingPolicy,
        barber: &Barber,
        date: NaiveDate,
        appointments: &[Appointment],
    ) -> DaySheet {
        let weekday = date.weekday();
        let day = barber.schedule.day(weekday);
        let day_start = minutes_of(day.start);
        let day_end = minutes_of(day.end);
        let time_off = barber.time_off.iter().any(|t| t.covers(date));
        let booked: Vec<&Appointment> = appointments
            .iter()
            .filter(|a| !matches!(a.status, crate::domain::models::appointment::AppointmentStatus::Cancelled))
            .collect();

        let slots = calendar::slot_grid(policy)
            .into_iter()
            .map(|time| {
                let m = minutes_of(time);

                let state = if !day.working || !within(m, day_start, day_end) {
                    SlotState::NonWorking
                } else if time_off {
                    SlotState::Blocked
                } else if let Some(appointment) =
                    booked.iter().find(|a| minutes_of(a.start) == m)
                {
                    SlotState::AppointmentStart {
                        appointment_id: appointment.id.clone(),
                    }
                } else if let Some(window) = barber
                    .breaks
                    .iter()
                    .find(|b| b.weekday == weekday && within(m, minutes_of(b.start), minutes_of(b.end)))
                {
                    SlotState::Break {
                        label: window.label.clone(),
                    }
                } else if booked
                    .iter()
                    .any(|a| within(m, minutes_of(a.start), minutes_of(a.end)))
                {
                    SlotState::Occupied
                } else {
                    SlotState::Available
                };

                SlotEntry { time, state }
            })
            .collect();

        DaySheet {
            barber_id: barber.id.clone(),
            date,
            slots,
        }
    }

    /// Check that the whole range `[start, end)` (minutes since midnight)
    /// can be booked for this barber on this date. `exclude` skips one
    /// appointment in the overlap check, used when extending an existing
    /// appointment with additional lines.
    pub fn check_range(
        barber: &Barber,
        date: NaiveDate,
        start: i64,
        end: i64,
        appointments: &[Appointment],
        exclude: Option<&str>,
    ) -> Result<()> {
        if end <= start {
            return Err(anyhow!(BookingError::InvalidRange));
        }

        let weekday = date.weekday();
        let day = barber.schedule.day(weekday);
        if !day.working {
            return Err(anyhow!(BookingError::SlotUnavailable {
                reason: format!("barber is not working on {}", weekday),
                conflict: None,
            }));
        }
        if start < minutes_of(day.start) || end > minutes_of(day.end) {
            return Err(anyhow!(BookingError::SlotUnavailable {
                reason: "requested range falls outside the barber's shift".to_string(),
                conflict: None,
            }));
        }
        if let Some(block) = barber.time_off.iter().find(|t| t.covers(date)) {
            return Err(anyhow!(BookingError::SlotUnavailable {
                reason: format!("barber has {} scheduled", block.kind.as_str()),
                conflict: None,
            }));
        }
        if let Some(window) = barber.breaks.iter().find(|b| {
            b.weekday == weekday && overlaps(start, end, minutes_of(b.start), minutes_of(b.end))
        }) {
            return Err(anyhow!(BookingError::SlotUnavailable {
                reason: format!("requested range overlaps the {} break", window.label),
                conflict: None,
            }));
        }
        if let Some(conflicting) = appointments.iter().find(|a| {
            !matches!(
                a.status,
                crate::domain::models::appointment::AppointmentStatus::Cancelled
            ) && Some(a.id.as_str()) != exclude
                && overlaps(start, end, minutes_of(a.start), minutes_of(a.end))
        }) {
            return Err(anyhow!(BookingError::SlotUnavailable {
                reason: "requested range overlaps an existing appointment".to_string(),
                conflict: Some(conflicting.id.clone()),
            }));
        }
        Ok(())
    }
}
