//! Subscription usage tracking.
//!
//! Gates appointment creation for registered clients (open-booking rule,
//! period quota, late-cancellation restrictions), reacts to the payment
//! processor's two notifications, and rolls billing periods. The engine
//! never calls out to the processor; it only consumes "activated" and
//! "cancelled / payment failed".
use anyhow::{anyhow, Result};
use chrono::{Days, Months, NaiveDate, NaiveDateTime};
use log::{info, warn};
use std::sync::Arc;

use crate::domain::commands::subscriptions::{
    ActivateSubscriptionCommand, DeactivateSubscriptionCommand,
};
use crate::domain::errors::BookingError;
use crate::domain::models::subscription::{
    BookingRestriction, ClientSubscription, SubscriptionStatus,
};
use crate::domain::policy::BookingPolicy;
use crate::storage::csv::{AppointmentRepository, CsvConnection, SubscriptionRepository};
use crate::storage::traits::{AppointmentStorage, SubscriptionStorage};

#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repository: SubscriptionRepository,
    appointment_repository: AppointmentRepository,
    policy: BookingPolicy,
}

impl SubscriptionService {
    pub fn new(connection: Arc<CsvConnection>, policy: BookingPolicy) -> Self {
        Self {
            subscription_repository: SubscriptionRepository::new((*connection).clone()),
            appointment_repository: AppointmentRepository::new((*connection).clone()),
            policy,
        }
    }

    /// Reaction to the processor's "subscription activated" notification:
    /// create (or re-activate) the client's subscription with a fresh
    /// one-period window starting today.
    pub fn activate(&self, command: ActivateSubscriptionCommand) -> Result<ClientSubscription> {
        self.activate_on(command, chrono::Local::now().date_naive())
    }

    /// Activation with an explicit start date, used by tests.
    pub fn activate_on(
        &self,
        command: ActivateSubscriptionCommand,
        today: NaiveDate,
    ) -> Result<ClientSubscription> {
        let period_end = period_end_for(today);
        match self.subscription_repository.get_for_client(&command.client_id)? {
            Some(mut existing) => {
                existing.plan_name = command.plan_name;
                existing.cuts_per_period = command.cuts_per_period;
                existing.preferred_barber_id = command.preferred_barber_id;
                existing.status = SubscriptionStatus::Active;
                existing.period_start = today;
                existing.period_end = period_end;
                existing.cuts_used = 0;
                self.subscription_repository.update_subscription(&existing)?;
                info!(
                    "Re-activated subscription for client {} (period {} - {})",
                    existing.client_id, existing.period_start, existing.period_end
                );
                Ok(existing)
            }
            None => {
                let subscription = ClientSubscription {
                    id: ClientSubscription::generate_id(),
                    client_id: command.client_id,
                    plan_name: command.plan_name,
                    cuts_per_period: command.cuts_per_period,
                    preferred_barber_id: command.preferred_barber_id,
                    status: SubscriptionStatus::Active,
                    period_start: today,
                    period_end,
                    cuts_used: 0,
                };
                self.subscription_repository.store_subscription(&subscription)?;
                info!(
                    "Activated subscription for client {} (period {} - {})",
                    subscription.client_id, subscription.period_start, subscription.period_end
                );
                Ok(subscription)
            }
        }
    }

    /// Reaction to "subscription cancelled" / "payment failed".
    pub fn deactivate(&self, command: DeactivateSubscriptionCommand) -> Result<ClientSubscription> {
        let mut subscription = self
            .subscription_repository
            .get_for_client(&command.client_id)?
            .ok_or_else(|| anyhow!("Client {} has no subscription", command.client_id))?;
        subscription.status = SubscriptionStatus::Cancelled;
        self.subscription_repository.update_subscription(&subscription)?;
        info!("Cancelled subscription for client {}", command.client_id);
        Ok(subscription)
    }

    pub fn subscription_for(&self, client_id: &str) -> Result<Option<ClientSubscription>> {
        self.subscription_repository.get_for_client(client_id)
    }

    pub fn has_active_subscription(&self, client_id: &str) -> Result<bool> {
        Ok(self
            .subscription_repository
            .get_for_client(client_id)?
            .map(|s| s.is_active())
            .unwrap_or(false))
    }

    /// Booking gate, evaluated before an appointment is persisted.
    ///
    /// Applies to every registered client: a late-cancellation restriction
    /// blocks anyone. The open-booking and quota rules additionally apply
    /// when the client holds an active subscription.
    pub fn check_booking_allowed(&self, client_id: &str, now: NaiveDateTime) -> Result<()> {
        if let Some(restriction) = self
            .subscription_repository
            .latest_restriction_for_client(client_id)?
        {
            if restriction.in_force(now) {
                return Err(anyhow!(BookingError::SubscriptionLimitExceeded {
                    reason: format!(
                        "booking restricted until {} ({})",
                        restriction.restricted_until, restriction.reason
                    ),
                }));
            }
        }

        let Some(mut subscription) = self.subscription_repository.get_for_client(client_id)?
        else {
            return Ok(());
        };
        if !subscription.is_active() {
            return Ok(());
        }

        self.ensure_current_period(&mut subscription, now.date())?;

        let open = self.appointment_repository.list_open_for_client(client_id)?;
        if let Some(existing) = open.first() {
            return Err(anyhow!(BookingError::SubscriptionLimitExceeded {
                reason: format!(
                    "client already has an open appointment {} on {}",
                    existing.id, existing.date
                ),
            }));
        }

        if subscription.cuts_used >= subscription.cuts_per_period {
            return Err(anyhow!(BookingError::SubscriptionLimitExceeded {
                reason: format!(
                    "period quota exhausted ({} of {} cuts used)",
                    subscription.cuts_used, subscription.cuts_per_period
                ),
            }));
        }

        Ok(())
    }

    /// Consume one subscription cut when a subscription-flagged
    /// appointment completes.
    pub fn record_completed_cut(&self, client_id: &str) -> Result<()> {
        let Some(mut subscription) = self.subscription_repository.get_for_client(client_id)?
        else {
            warn!(
                "Completed a subscription booking for client {} without a subscription record",
                client_id
            );
            return Ok(());
        };
        subscription.cuts_used += 1;
        self.subscription_repository.update_subscription(&subscription)?;
        info!(
            "Client {} used {} of {} cuts this period",
            client_id, subscription.cuts_used, subscription.cuts_per_period
        );
        Ok(())
    }

    /// Schedule the time-boxed booking restriction that a late
    /// cancellation incurs. Not an error at cancellation time; the ban
    /// surfaces on the next booking attempt.
    pub fn record_late_cancellation(
        &self,
        client_id: &str,
        now: NaiveDateTime,
        appointment_id: &str,
    ) -> Result<BookingRestriction> {
        let restriction = BookingRestriction {
            id: BookingRestriction::generate_id(),
            client_id: client_id.to_string(),
            restricted_until: now + chrono::Duration::minutes(self.policy.penalty_minutes),
            reason: format!("late cancellation of appointment {}", appointment_id),
        };
        self.subscription_repository.store_restriction(&restriction)?;
        warn!(
            "Client {} restricted from booking until {} after late cancellation",
            client_id, restriction.restricted_until
        );
        Ok(restriction)
    }

    /// Roll the billing period forward until it contains `today`,
    /// resetting the cut counter at each new period.
    fn ensure_current_period(
        &self,
        subscription: &mut ClientSubscription,
        today: NaiveDate,
    ) -> Result<()> {
        if today <= subscription.period_end {
            return Ok(());
        }
        while today > subscription.period_end {
            subscription.period_start = subscription
                .period_end
                .checked_add_days(Days::new(1))
                .ok_or_else(|| anyhow!("Period overflow"))?;
            subscription.period_end = period_end_for(subscription.period_start);
        }
        subscription.cuts_used = 0;
        self.subscription_repository.update_subscription(subscription)?;
        info!(
            "Rolled subscription period for client {} to {} - {}",
            subscription.client_id, subscription.period_start, subscription.period_end
        );
        Ok(())
    }
}

/// Inclusive end of a one-month period starting on `start`.
fn period_end_for(start: NaiveDate) -> NaiveDate {
    start
        .checked_add_months(Months::new(1))
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestHelper;

    fn service_over(helper: &TestHelper) -> SubscriptionService {
        SubscriptionService::new(
            Arc::new(helper.env.connection.clone()),
            BookingPolicy::default(),
        )
    }

    fn activate_cmd(client_id: &str) -> ActivateSubscriptionCommand {
        ActivateSubscriptionCommand {
            client_id: client_id.to_string(),
            plan_name: "Monthly".to_string(),
            cuts_per_period: 4,
            preferred_barber_id: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn unwrap_booking_error(err: anyhow::Error) -> BookingError {
        err.downcast::<BookingError>().expect("domain error")
    }

    #[test]
    fn activation_opens_a_one_month_period() -> Result<()> {
        let helper = TestHelper::new()?;
        let service = service_over(&helper);

        let sub = service.activate_on(activate_cmd("client-1"), day(2025, 6, 10))?;
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.period_start, day(2025, 6, 10));
        assert_eq!(sub.period_end, day(2025, 7, 9));
        assert_eq!(sub.cuts_used, 0);
        Ok(())
    }

    #[test]
    fn payment_failure_flips_status() -> Result<()> {
        let helper = TestHelper::new()?;
        let service = service_over(&helper);
        service.activate_on(activate_cmd("client-1"), day(2025, 6, 10))?;

        let sub = service.deactivate(DeactivateSubscriptionCommand {
            client_id: "client-1".to_string(),
        })?;
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert!(!service.has_active_subscription("client-1")?);
        Ok(())
    }

    #[test]
    fn reactivation_resets_usage() -> Result<()> {
        let helper = TestHelper::new()?;
        let service = service_over(&helper);
        service.activate_on(activate_cmd("client-1"), day(2025, 6, 10))?;
        service.record_completed_cut("client-1")?;
        service.deactivate(DeactivateSubscriptionCommand {
            client_id: "client-1".to_string(),
        })?;

        let sub = service.activate_on(activate_cmd("client-1"), day(2025, 8, 1))?;
        assert_eq!(sub.cuts_used, 0);
        assert_eq!(sub.period_start, day(2025, 8, 1));
        Ok(())
    }

    #[test]
    fn quota_exhaustion_blocks_booking() -> Result<()> {
        let helper = TestHelper::new()?;
        let service = service_over(&helper);
        service.activate_on(activate_cmd("client-1"), day(2025, 6, 10))?;
        for _ in 0..4 {
            service.record_completed_cut("client-1")?;
        }

        let err = service
            .check_booking_allowed("client-1", day(2025, 6, 20).and_hms_opt(10, 0, 0).unwrap())
            .unwrap_err();
        assert!(matches!(
            unwrap_booking_error(err),
            BookingError::SubscriptionLimitExceeded { .. }
        ));
        Ok(())
    }

    #[test]
    fn period_rollover_resets_cuts() -> Result<()> {
        let helper = TestHelper::new()?;
        let service = service_over(&helper);
        service.activate_on(activate_cmd("client-1"), day(2025, 6, 10))?;
        for _ in 0..4 {
            service.record_completed_cut("client-1")?;
        }

        // Well past the period end: the quota check passes again
        service.check_booking_allowed(
            "client-1",
            day(2025, 7, 15).and_hms_opt(10, 0, 0).unwrap(),
        )?;

        let sub = service.subscription_for("client-1")?.unwrap();
        assert_eq!(sub.cuts_used, 0);
        assert!(sub.period_start <= day(2025, 7, 15));
        assert!(day(2025, 7, 15) <= sub.period_end);
        Ok(())
    }

    #[test]
    fn restriction_blocks_any_registered_client() -> Result<()> {
        let helper = TestHelper::new()?;
        let service = service_over(&helper);
        // No subscription at all; the restriction alone must block
        let now = day(2025, 6, 10).and_hms_opt(10, 0, 0).unwrap();
        service.record_late_cancellation("client-1", now, "appt-1")?;

        let err = service
            .check_booking_allowed("client-1", now + chrono::Duration::hours(1))
            .unwrap_err();
        assert!(matches!(
            unwrap_booking_error(err),
            BookingError::SubscriptionLimitExceeded { .. }
        ));

        // After the penalty window the client can book again
        service.check_booking_allowed("client-1", now + chrono::Duration::days(3))?;
        Ok(())
    }

    #[test]
    fn non_subscribers_pass_the_gate() -> Result<()> {
        let helper = TestHelper::new()?;
        let service = service_over(&helper);
        service.check_booking_allowed(
            "client-unknown",
            day(2025, 6, 10).and_hms_opt(10, 0, 0).unwrap(),
        )?;
        Ok(())
    }
}
