//! Test utilities for the CSV storage backend.
//!
//! RAII-based cleanup: the temp directory lives as long as the helper and
//! is removed when it drops, even if a test panics.
use anyhow::Result;
use chrono::NaiveTime;
use tempfile::TempDir;

use super::appointment_repository::AppointmentRepository;
use super::barber_repository::BarberRepository;
use super::commission_repository::CommissionRepository;
use super::connection::CsvConnection;
use super::line_repository::AppointmentLineRepository;
use super::service_repository::ServiceRepository;
use super::subscription_repository::SubscriptionRepository;
use crate::domain::models::barber::{Barber, BreakWindow, WeeklySchedule};
use crate::domain::models::service::Service;
use crate::storage::traits::{BarberStorage, ServiceStorage};

/// Test environment providing a connection over a temporary directory.
pub struct TestEnvironment {
    pub connection: CsvConnection,
    pub base_path: std::path::PathBuf,
    _temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        Ok(Self {
            connection,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }
}

/// Repository bundle over a fresh test environment.
pub struct TestHelper {
    pub env: TestEnvironment,
    pub barber_repo: BarberRepository,
    pub service_repo: ServiceRepository,
    pub appointment_repo: AppointmentRepository,
    pub line_repo: AppointmentLineRepository,
    pub subscription_repo: SubscriptionRepository,
    pub commission_repo: CommissionRepository,
}

impl TestHelper {
    pub fn new() -> Result<Self> {
        let env = TestEnvironment::new()?;
        let barber_repo = BarberRepository::new(env.connection.clone());
        let service_repo = ServiceRepository::new(env.connection.clone());
        let appointment_repo = AppointmentRepository::new(env.connection.clone());
        let line_repo = AppointmentLineRepository::new(env.connection.clone());
        let subscription_repo = SubscriptionRepository::new(env.connection.clone());
        let commission_repo = CommissionRepository::new(env.connection.clone());

        Ok(Self {
            env,
            barber_repo,
            service_repo,
            appointment_repo,
            line_repo,
            subscription_repo,
            commission_repo,
        })
    }

    /// Barber working 09:00–18:00 every day with a 13:00–15:00 lunch break
    /// on every weekday.
    pub fn create_test_barber(&self, name: &str) -> Result<Barber> {
        let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        let breaks = [
            chrono::Weekday::Mon,
            chrono::Weekday::Tue,
            chrono::Weekday::Wed,
            chrono::Weekday::Thu,
            chrono::Weekday::Fri,
        ]
        .into_iter()
        .map(|weekday| BreakWindow {
            weekday,
            start: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            label: "Lunch".to_string(),
        })
        .collect();

        let barber = Barber {
            id: Barber::generate_id(),
            name: name.to_string(),
            active: true,
            commission_percentage: 40.0,
            schedule: WeeklySchedule::uniform(start, end),
            breaks,
            time_off: Vec::new(),
        };
        self.barber_repo.store_barber(&barber)?;
        Ok(barber)
    }

    /// 30-minute service priced at 25.0.
    pub fn create_test_service(&self) -> Result<Service> {
        let service = Service::new("Haircut", 30, 25.0);
        self.service_repo.store_service(&service)?;
        Ok(service)
    }

    pub fn create_service(&self, name: &str, duration_minutes: i64, price: f64) -> Result<Service> {
        let service = Service::new(name, duration_minutes, price);
        self.service_repo.store_service(&service)?;
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_cleans_up_on_drop() -> Result<()> {
        let base_path;
        {
            let env = TestEnvironment::new()?;
            base_path = env.base_path.clone();
            assert!(base_path.exists());
        }
        assert!(!base_path.exists());
        Ok(())
    }

    #[test]
    fn helper_seeds_fixtures() -> Result<()> {
        let helper = TestHelper::new()?;
        let barber = helper.create_test_barber("Marco")?;
        let service = helper.create_test_service()?;

        assert!(helper.barber_repo.get_barber(&barber.id)?.is_some());
        assert_eq!(helper.service_repo.get_service(&service.id)?.unwrap().duration_minutes, 30);
        Ok(())
    }
}
