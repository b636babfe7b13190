//! Monthly points ledger.
//!
//! One minute of completed, line-itemized work is one point by default;
//! a catalog entry with a custom weight overrides that through the value
//! captured on its line at attach time. The ledger is never stored: it is
//! recomputed on demand from the completed appointments of a month, so
//! re-running it for the same month always yields the same totals.
use anyhow::Result;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::models::commission::{BarberPoints, BillingMonth};
use crate::storage::csv::{
    AppointmentLineRepository, AppointmentRepository, BarberRepository, CsvConnection,
};
use crate::storage::traits::{AppointmentLineStorage, AppointmentStorage, BarberStorage};

#[derive(Clone)]
pub struct PointsService {
    appointment_repository: AppointmentRepository,
    line_repository: AppointmentLineRepository,
    barber_repository: BarberRepository,
}

impl PointsService {
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self {
            appointment_repository: AppointmentRepository::new((*connection).clone()),
            line_repository: AppointmentLineRepository::new((*connection).clone()),
            barber_repository: BarberRepository::new((*connection).clone()),
        }
    }

    /// Points for every barber in a month, including barbers with no
    /// completed work. Sorted by points descending; ties keep the
    /// barbers' insertion order.
    pub fn monthly_points(&self, month: BillingMonth) -> Result<Vec<BarberPoints>> {
        let barbers = self.barber_repository.list_barbers()?;
        let completed = self.appointment_repository.list_completed_in_month(month)?;

        let mut minutes: HashMap<String, i64> = HashMap::new();
        let mut points: HashMap<String, i64> = HashMap::new();
        let mut counts: HashMap<String, u32> = HashMap::new();
        for appointment in &completed {
            let lines = self.line_repository.list_lines(&appointment.id)?;
            let worked: i64 = lines.iter().map(|l| l.duration_minutes).sum();
            let earned: i64 = lines.iter().map(|l| l.points).sum();
            *minutes.entry(appointment.barber_id.clone()).or_default() += worked;
            *points.entry(appointment.barber_id.clone()).or_default() += earned;
            *counts.entry(appointment.barber_id.clone()).or_default() += 1;
        }

        let mut rows: Vec<BarberPoints> = barbers
            .into_iter()
            .map(|barber| BarberPoints {
                total_points: points.get(&barber.id).copied().unwrap_or(0),
                completed_count: counts.get(&barber.id).copied().unwrap_or(0),
                total_minutes: minutes.get(&barber.id).copied().unwrap_or(0),
                barber_id: barber.id,
                month,
            })
            .collect();
        rows.sort_by(|a, b| b.total_points.cmp(&a.total_points));

        debug!(
            "Points ledger for {}: {} barbers, {} completed appointments",
            month,
            rows.len(),
            completed.len()
        );
        Ok(rows)
    }

    /// Points for one barber in a month, zero when they completed nothing.
    pub fn points_for(&self, barber_id: &str, month: BillingMonth) -> Result<BarberPoints> {
        let rows = self.monthly_points(month)?;
        Ok(rows
            .into_iter()
            .find(|r| r.barber_id == barber_id)
            .unwrap_or(BarberPoints {
                barber_id: barber_id.to_string(),
                month,
                total_points: 0,
                completed_count: 0,
                total_minutes: 0,
            }))
    }
}
