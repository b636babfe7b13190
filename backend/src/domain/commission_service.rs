//! Monthly commission distribution.
//!
//! The admin sets a revenue pool for the month (total revenue plus the
//! percentage of it that gets paid out); the distributable amount is then
//! split across barbers in proportion to their points. Manual entries add
//! to a barber's payout and displayed minutes but never change the
//! points ratio the split is computed from.
use anyhow::{anyhow, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::commands::commissions::{
    AddManualEntryCommand, CommissionReportQuery, DeleteManualEntryCommand,
    UpdateManualEntryCommand, UpsertRevenuePoolCommand,
};
use crate::domain::errors::BookingError;
use crate::domain::models::commission::{BillingMonth, ManualCommissionEntry, RevenuePool};
use crate::domain::points_service::PointsService;
use crate::domain::policy::BookingPolicy;
use crate::storage::csv::{BarberRepository, CommissionRepository, CsvConnection};
use crate::storage::traits::{BarberStorage, CommissionStorage};

/// One barber's row in the monthly report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRow {
    pub barber_id: String,
    pub barber_name: String,
    pub points: i64,
    pub completed_count: u32,
    /// Completed minutes plus manual-entry minutes
    pub minutes: i64,
    /// Proportional slice of the distributable pool
    pub share_amount: f64,
    /// Sum of the barber's manual entries for the month
    pub manual_amount: f64,
    /// share_amount + manual_amount
    pub total_amount: f64,
}

/// Full monthly report: the pool figures plus one row per barber, ranked
/// by points descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionReport {
    pub month: BillingMonth,
    pub total_revenue: f64,
    pub distribution_percentage: f64,
    pub distributable: f64,
    pub reserved: f64,
    pub rows: Vec<CommissionRow>,
}

#[derive(Clone)]
pub struct CommissionService {
    commission_repository: CommissionRepository,
    barber_repository: BarberRepository,
    points_service: PointsService,
    policy: BookingPolicy,
}

impl CommissionService {
    pub fn new(connection: Arc<CsvConnection>, policy: BookingPolicy) -> Self {
        Self {
            commission_repository: CommissionRepository::new((*connection).clone()),
            barber_repository: BarberRepository::new((*connection).clone()),
            points_service: PointsService::new(connection),
            policy,
        }
    }

    /// Compute the report for a month. With no pool configured the
    /// default distribution percentage applies to a zero pool, so every
    /// share is zero but points still show.
    pub fn report(&self, query: CommissionReportQuery) -> Result<CommissionReport> {
        let month = query.month;
        let pool = match self.commission_repository.get_pool(month)? {
            Some(pool) => pool,
            None => RevenuePool {
                month,
                total_revenue: 0.0,
                distribution_percentage: self.policy.default_distribution_percentage,
            },
        };
        pool.validate()?;

        let points = self.points_service.monthly_points(month)?;
        let total_points: i64 = points.iter().map(|p| p.total_points).sum();
        let distributable = pool.distributable();

        let manual_entries = self
            .commission_repository
            .list_manual_entries_for_month(month)?;
        let barbers = self.barber_repository.list_barbers()?;
        let name_of = |id: &str| {
            barbers
                .iter()
                .find(|b| b.id == id)
                .map(|b| b.name.clone())
                .unwrap_or_default()
        };

        let rows = points
            .into_iter()
            .map(|p| {
                let share_amount = if total_points == 0 {
                    0.0
                } else {
                    distributable * (p.total_points as f64) / (total_points as f64)
                };
                let manual: Vec<&ManualCommissionEntry> = manual_entries
                    .iter()
                    .filter(|e| e.barber_id == p.barber_id)
                    .collect();
                let manual_amount: f64 = manual.iter().map(|e| e.amount).sum();
                let manual_minutes: i64 = manual.iter().map(|e| e.minutes).sum();
                CommissionRow {
                    barber_name: name_of(&p.barber_id),
                    barber_id: p.barber_id,
                    points: p.total_points,
                    completed_count: p.completed_count,
                    minutes: p.total_minutes + manual_minutes,
                    share_amount,
                    manual_amount,
                    total_amount: share_amount + manual_amount,
                }
            })
            .collect();

        Ok(CommissionReport {
            month,
            total_revenue: pool.total_revenue,
            distribution_percentage: pool.distribution_percentage,
            distributable,
            reserved: pool.reserved(),
            rows,
        })
    }

    /// Set or replace the month's revenue pool. Last writer wins.
    pub fn upsert_pool(&self, command: UpsertRevenuePoolCommand) -> Result<RevenuePool> {
        let pool = RevenuePool {
            month: command.month,
            total_revenue: command.total_revenue,
            distribution_percentage: command.distribution_percentage,
        };
        pool.validate()?;
        self.commission_repository.upsert_pool(&pool)?;
        info!(
            "Revenue pool for {} set to {} at {}%",
            pool.month, pool.total_revenue, pool.distribution_percentage
        );
        Ok(pool)
    }

    pub fn add_manual_entry(&self, command: AddManualEntryCommand) -> Result<ManualCommissionEntry> {
        if self
            .barber_repository
            .get_barber(&command.barber_id)?
            .is_none()
        {
            return Err(anyhow!("Barber {} not found", command.barber_id));
        }
        let entry = ManualCommissionEntry {
            id: ManualCommissionEntry::generate_id(),
            barber_id: command.barber_id,
            date: command.date,
            minutes: command.minutes,
            description: command.description,
            amount: command.amount,
        };
        Self::validate_entry(&entry)?;
        self.commission_repository.store_manual_entry(&entry)?;
        Ok(entry)
    }

    pub fn update_manual_entry(
        &self,
        command: UpdateManualEntryCommand,
    ) -> Result<ManualCommissionEntry> {
        let mut entry = self
            .commission_repository
            .get_manual_entry(&command.entry_id)?
            .ok_or_else(|| anyhow!("Manual entry {} not found", command.entry_id))?;
        entry.date = command.date;
        entry.minutes = command.minutes;
        entry.description = command.description;
        entry.amount = command.amount;
        Self::validate_entry(&entry)?;
        self.commission_repository.update_manual_entry(&entry)?;
        Ok(entry)
    }

    pub fn delete_manual_entry(&self, command: DeleteManualEntryCommand) -> Result<()> {
        if !self
            .commission_repository
            .delete_manual_entry(&command.entry_id)?
        {
            return Err(anyhow!("Manual entry {} not found", command.entry_id));
        }
        Ok(())
    }

    // Negative amounts are legal (corrections); negative minutes are not.
    fn validate_entry(entry: &ManualCommissionEntry) -> Result<()> {
        if entry.minutes < 0 {
            return Err(anyhow!(BookingError::DistributionInputInvalid {
                detail: format!("negative manual minutes {}", entry.minutes),
            }));
        }
        if entry.description.trim().is_empty() {
            return Err(anyhow!(BookingError::DistributionInputInvalid {
                detail: "manual entry description is empty".to_string(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::appointment_service::AppointmentService;
    use crate::domain::commands::appointments::{
        BookAppointmentCommand, CompleteAppointmentCommand, ConfirmAppointmentCommand,
    };
    use crate::domain::locks::DayLockRegistry;
    use crate::domain::models::appointment::ClientRef;
    use crate::domain::models::barber::{Barber, WeeklySchedule};
    use crate::domain::subscription_service::SubscriptionService;
    use crate::storage::csv::test_utils::TestHelper;
    use chrono::{NaiveDate, NaiveTime};

    struct Fixture {
        helper: TestHelper,
        appointments: AppointmentService,
        commissions: CommissionService,
    }

    fn fixture() -> Fixture {
        let helper = TestHelper::new().expect("test env");
        let connection = Arc::new(helper.env.connection.clone());
        let policy = BookingPolicy::default();
        let subscriptions = SubscriptionService::new(connection.clone(), policy.clone());
        let appointments = AppointmentService::new(
            connection.clone(),
            subscriptions,
            DayLockRegistry::new(),
            policy.clone(),
        );
        let commissions = CommissionService::new(connection, policy);
        Fixture {
            helper,
            appointments,
            commissions,
        }
    }

    /// Barber working 09:00–18:00 with no breaks, so long fixture
    /// services fit in one shift.
    fn break_free_barber(fx: &Fixture, name: &str) -> Barber {
        let barber = Barber {
            id: Barber::generate_id(),
            name: name.to_string(),
            active: true,
            commission_percentage: 40.0,
            schedule: WeeklySchedule::uniform(
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            ),
            breaks: Vec::new(),
            time_off: Vec::new(),
        };
        fx.helper.barber_repo.store_barber(&barber).expect("barber");
        barber
    }

    fn complete_booking(fx: &Fixture, barber_id: &str, service_id: &str, date: NaiveDate) {
        let appointment = fx
            .appointments
            .book(BookAppointmentCommand {
                client: ClientRef::Guest {
                    name: "Guest".to_string(),
                    phone: "555-0101".to_string(),
                },
                barber_id: barber_id.to_string(),
                service_id: service_id.to_string(),
                date,
                start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                via_subscription: false,
                walk_in: false,
                now: Some(date.pred_opt().unwrap().and_hms_opt(12, 0, 0).unwrap()),
            })
            .expect("booking");
        fx.appointments
            .confirm(ConfirmAppointmentCommand {
                appointment_id: appointment.id.clone(),
            })
            .expect("confirm");
        fx.appointments
            .complete(CompleteAppointmentCommand {
                appointment_id: appointment.id,
            })
            .expect("complete");
    }

    fn month() -> BillingMonth {
        BillingMonth::new(2025, 6).unwrap()
    }

    /// 300 points for Marco, 700 for Luca over June 2025.
    fn seed_points(fx: &Fixture) -> (Barber, Barber) {
        let marco = break_free_barber(fx, "Marco");
        let luca = break_free_barber(fx, "Luca");
        let five_hours = fx.helper.create_service("Full Day Block", 300, 0.0).unwrap();
        let four_hours = fx.helper.create_service("Long Block", 240, 0.0).unwrap();
        let remainder = fx.helper.create_service("Short Block", 160, 0.0).unwrap();

        complete_booking(fx, &marco.id, &five_hours.id, date(2));
        complete_booking(fx, &luca.id, &five_hours.id, date(3));
        complete_booking(fx, &luca.id, &four_hours.id, date(4));
        complete_booking(fx, &luca.id, &remainder.id, date(5));
        (marco, luca)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn shares_are_proportional_to_points() -> Result<()> {
        let fx = fixture();
        let (marco, luca) = seed_points(&fx);
        fx.commissions.upsert_pool(UpsertRevenuePoolCommand {
            month: month(),
            total_revenue: 1000.0,
            distribution_percentage: 70.0,
        })?;

        let report = fx.commissions.report(CommissionReportQuery { month: month() })?;
        assert_eq!(report.distributable, 700.0);
        assert_eq!(report.reserved, 300.0);

        assert_eq!(report.rows[0].barber_id, luca.id);
        assert!((report.rows[0].share_amount - 490.0).abs() < 1e-9);
        assert_eq!(report.rows[1].barber_id, marco.id);
        assert!((report.rows[1].share_amount - 210.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn shares_conserve_the_distributable_pool() -> Result<()> {
        let fx = fixture();
        seed_points(&fx);
        fx.commissions.upsert_pool(UpsertRevenuePoolCommand {
            month: month(),
            total_revenue: 1234.56,
            distribution_percentage: 55.5,
        })?;

        let report = fx.commissions.report(CommissionReportQuery { month: month() })?;
        let paid: f64 = report.rows.iter().map(|r| r.share_amount).sum();
        assert!((paid - report.distributable).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn zero_points_means_zero_shares() -> Result<()> {
        let fx = fixture();
        break_free_barber(&fx, "Marco");
        fx.commissions.upsert_pool(UpsertRevenuePoolCommand {
            month: month(),
            total_revenue: 1000.0,
            distribution_percentage: 70.0,
        })?;

        let report = fx.commissions.report(CommissionReportQuery { month: month() })?;
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].share_amount, 0.0);
        assert_eq!(report.reserved, 300.0);
        Ok(())
    }

    #[test]
    fn missing_pool_falls_back_to_defaults() -> Result<()> {
        let fx = fixture();
        seed_points(&fx);

        let report = fx.commissions.report(CommissionReportQuery { month: month() })?;
        assert_eq!(report.total_revenue, 0.0);
        assert_eq!(report.distribution_percentage, 70.0);
        assert!(report.rows.iter().all(|r| r.share_amount == 0.0));
        // Points still show even with nothing to distribute
        assert_eq!(report.rows[0].points, 700);
        Ok(())
    }

    #[test]
    fn manual_entries_add_to_payout_but_not_to_the_ratio() -> Result<()> {
        let fx = fixture();
        let (marco, luca) = seed_points(&fx);
        fx.commissions.upsert_pool(UpsertRevenuePoolCommand {
            month: month(),
            total_revenue: 1000.0,
            distribution_percentage: 70.0,
        })?;
        fx.commissions.add_manual_entry(AddManualEntryCommand {
            barber_id: marco.id.clone(),
            date: date(10),
            minutes: 60,
            description: "Product sales bonus".to_string(),
            amount: 50.0,
        })?;

        let report = fx.commissions.report(CommissionReportQuery { month: month() })?;
        let marco_row = report.rows.iter().find(|r| r.barber_id == marco.id).unwrap();
        let luca_row = report.rows.iter().find(|r| r.barber_id == luca.id).unwrap();

        // The split itself is untouched
        assert!((marco_row.share_amount - 210.0).abs() < 1e-9);
        assert!((luca_row.share_amount - 490.0).abs() < 1e-9);
        // The entry lands on top
        assert_eq!(marco_row.manual_amount, 50.0);
        assert!((marco_row.total_amount - 260.0).abs() < 1e-9);
        assert_eq!(marco_row.minutes, 360);
        assert_eq!(marco_row.points, 300);
        Ok(())
    }

    #[test]
    fn pool_inputs_are_validated() {
        let fx = fixture();
        let err = fx
            .commissions
            .upsert_pool(UpsertRevenuePoolCommand {
                month: month(),
                total_revenue: 1000.0,
                distribution_percentage: 130.0,
            })
            .unwrap_err();
        assert!(matches!(
            err.downcast::<BookingError>().expect("domain error"),
            BookingError::DistributionInputInvalid { .. }
        ));

        let err = fx
            .commissions
            .upsert_pool(UpsertRevenuePoolCommand {
                month: month(),
                total_revenue: -5.0,
                distribution_percentage: 70.0,
            })
            .unwrap_err();
        assert!(matches!(
            err.downcast::<BookingError>().expect("domain error"),
            BookingError::DistributionInputInvalid { .. }
        ));
    }

    #[test]
    fn manual_entries_can_be_updated_and_deleted() -> Result<()> {
        let fx = fixture();
        let marco = break_free_barber(&fx, "Marco");
        let entry = fx.commissions.add_manual_entry(AddManualEntryCommand {
            barber_id: marco.id.clone(),
            date: date(10),
            minutes: 30,
            description: "Training session".to_string(),
            amount: 20.0,
        })?;

        let updated = fx.commissions.update_manual_entry(UpdateManualEntryCommand {
            entry_id: entry.id.clone(),
            date: date(11),
            minutes: 45,
            description: "Training session".to_string(),
            amount: 35.0,
        })?;
        assert_eq!(updated.minutes, 45);
        assert_eq!(updated.amount, 35.0);

        fx.commissions.delete_manual_entry(DeleteManualEntryCommand {
            entry_id: entry.id.clone(),
        })?;
        assert!(fx
            .commissions
            .delete_manual_entry(DeleteManualEntryCommand { entry_id: entry.id })
            .is_err());
        Ok(())
    }

    #[test]
    fn negative_manual_minutes_are_rejected() {
        let fx = fixture();
        let marco = break_free_barber(&fx, "Marco");
        let err = fx
            .commissions
            .add_manual_entry(AddManualEntryCommand {
                barber_id: marco.id,
                date: date(10),
                minutes: -10,
                description: "Oops".to_string(),
                amount: 5.0,
            })
            .unwrap_err();
        assert!(matches!(
            err.downcast::<BookingError>().expect("domain error"),
            BookingError::DistributionInputInvalid { .. }
        ));
    }
}
