//! Appointment lifecycle: booking (client self-service and admin
//! walk-ins) and the pending → confirmed → completed / cancelled state
//! machine with its side effects.
//!
//! Booking evaluates the availability check and the insert as one atomic
//! unit: both run under the per-(barber, date) lock, so two concurrent
//! claims on overlapping slots have at most one winner.
use anyhow::{anyhow, Result};
use chrono::Duration;
use log::info;
use std::sync::Arc;

use crate::domain::availability_service::AvailabilityService;
use crate::domain::calendar::minutes_of;
use crate::domain::commands::appointments::{
    BookAppointmentCommand, CancelAppointmentCommand, CompleteAppointmentCommand,
    ConfirmAppointmentCommand,
};
use crate::domain::errors::BookingError;
use crate::domain::locks::DayLockRegistry;
use crate::domain::models::appointment::{
    Appointment, AppointmentLine, AppointmentStatus, ClientRef,
};
use crate::domain::policy::BookingPolicy;
use crate::domain::subscription_service::SubscriptionService;
use crate::storage::csv::{
    AppointmentLineRepository, AppointmentRepository, BarberRepository, CsvConnection,
    ServiceRepository,
};
use crate::storage::traits::{
    AppointmentLineStorage, AppointmentStorage, BarberStorage, ServiceStorage,
};

#[derive(Clone)]
pub struct AppointmentService {
    appointment_repository: AppointmentRepository,
    line_repository: AppointmentLineRepository,
    barber_repository: BarberRepository,
    service_repository: ServiceRepository,
    subscription_service: SubscriptionService,
    locks: DayLockRegistry,
    policy: BookingPolicy,
}

impl AppointmentService {
    pub fn new(
        connection: Arc<CsvConnection>,
        subscription_service: SubscriptionService,
        locks: DayLockRegistry,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            appointment_repository: AppointmentRepository::new((*connection).clone()),
            line_repository: AppointmentLineRepository::new((*connection).clone()),
            barber_repository: BarberRepository::new((*connection).clone()),
            service_repository: ServiceRepository::new((*connection).clone()),
            subscription_service,
            locks,
            policy,
        }
    }

    /// Create an appointment. The slot range must be entirely free; for
    /// registered clients the subscription gate runs first.
    pub fn book(&self, command: BookAppointmentCommand) -> Result<Appointment> {
        let now = command
            .now
            .unwrap_or_else(|| chrono::Local::now().naive_local());

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
            .get_barber(&command.barber_id)?
            .ok_or_else(|| anyhow!("Barber {} not found", command.barber_id))?;
        if !barber.active {
            return Err(anyhow!("Barber {} is not active", barber.name));
        }

        if command.via_subscription
            && !matches!(&command.client, ClientRef::Registered { client_id }
                if self.subscription_service.has_active_subscription(client_id)?)
        {
            return Err(anyhow!(
                "Subscription bookings require a registered client with an active subscription"
            ));
        }
        // Registered clients keep their client lock from the gate check
        // through the insert, so two concurrent bookings by the same
        // client cannot both observe "no open appointment". Client lock
        // before barber-day lock, always in that order.
        let client_lock = command
            .client
            .client_id()
            .map(|client_id| self.locks.client_lock_for(client_id));
        let _client_guard = client_lock.as_ref().map(|lock| lock.lock().unwrap());
        if let Some(client_id) = command.client.client_id() {
            self.subscription_service.check_booking_allowed(client_id, now)?;
        }

        // Atomic check-then-insert: hold the barber-day lock across the
        // re-read, the availability check, and both writes.
        let lock = self.locks.lock_for(&command.barber_id, command.date);
        let _guard = lock.lock().unwrap();

        let existing = self
            .appointment_repository
            .list_for_barber_on(&command.barber_id, command.date)?;
        let start = minutes_of(command.start);
        let end = start + service.duration_minutes;
        AvailabilityService::check_range(&barber, command.date, start, end, &existing, None)?;

        let appointment = Appointment {
            id: Appointment::generate_id(),
            client: command.client,
            barber_id: command.barber_id,
            service_id: service.id.clone(),
            date: command.date,
            start: command.start,
            end: crate::domain::calendar::time_from_minutes(end),
            status: AppointmentStatus::Pending,
            via_subscription: command.via_subscription,
            walk_in: command.walk_in,
            created_at: chrono::Utc::now(),
        };
        self.appointment_repository.store_appointment(&appointment)?;

        let line = AppointmentLine {
            id: AppointmentLine::generate_id(),
            appointment_id: appointment.id.clone(),
            service_id: service.id,
            price_at_time: service.price,
            duration_minutes: service.duration_minutes,
            points: service.points,
            original: true,
        };
        self.line_repository.store_line(&line)?;

        info!(
            "Booked appointment {} for barber {} on {} {}-{}",
            appointment.id, appointment.barber_id, appointment.date, appointment.start,
            appointment.end
        );
        Ok(appointment)
    }

    pub fn confirm(&self, command: ConfirmAppointmentCommand) -> Result<Appointment> {
        let mut appointment = self.load(&command.appointment_id)?;
        self.transition(&mut appointment, AppointmentStatus::Confirmed)?;
        Ok(appointment)
    }

    /// Cancel an open appointment. The slot is released immediately (the
    /// resolver ignores cancelled appointments). A client cancelling
    /// inside the tolerance window is not rejected but earns a time-boxed
    /// booking restriction.
    pub fn cancel(&self, command: CancelAppointmentCommand) -> Result<Appointment> {
        let now = command
            .now
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        let mut appointment = self.load(&command.appointment_id)?;
        self.transition(&mut appointment, AppointmentStatus::Cancelled)?;

        if command.cancelled_by_client {
            if let Some(client_id) = appointment.client.client_id() {
                let starts_at = appointment.date.and_time(appointment.start);
                let window = Duration::minutes(self.policy.cancellation_tolerance_minutes);
                if now >= starts_at - window {
                    self.subscription_service.record_late_cancellation(
                        client_id,
                        now,
                        &appointment.id,
                    )?;
                }
            }
        }
        Ok(appointment)
    }

    /// Complete an appointment, making it visible to the points ledger
    /// and consuming a subscription cut when applicable.
    pub fn complete(&self, command: CompleteAppointmentCommand) -> Result<Appointment> {
        let mut appointment = self.load(&command.appointment_id)?;
        self.transition(&mut appointment, AppointmentStatus::Completed)?;

        if appointment.via_subscription {
            if let Some(client_id) = appointment.client.client_id() {
                self.subscription_service.record_completed_cut(client_id)?;
            }
        }
        Ok(appointment)
    }

    pub fn get(&self, appointment_id: &str) -> Result<Option<Appointment>> {
        self.appointment_repository.get_appointment(appointment_id)
    }

    fn load(&self, appointment_id: &str) -> Result<Appointment> {
        self.appointment_repository
            .get_appointment(appointment_id)?
            .ok_or_else(|| anyhow!("Appointment {} not found", appointment_id))
    }

    fn transition(&self, appointment: &mut Appointment, to: AppointmentStatus) -> Result<()> {
        if !appointment.can_transition(to) {
            return Err(anyhow!(BookingError::InvalidTransition {
                from: appointment.status,
                to,
            }));
        }
        // Status writes go through the same barber-day lock as bookings
        // so a transition cannot interleave with an overlap check.
        let lock = self.locks.lock_for(&appointment.barber_id, appointment.date);
        let _guard = lock.lock().unwrap();

        let from = appointment.status;
        appointment.status = to;
        self.appointment_repository.update_appointment(appointment)?;
        info!(
            "Appointment {} moved {} -> {}",
            appointment.id,
            from.as_str(),
            to.as_str()
        );
        Ok(())
    }
}
