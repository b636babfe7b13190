//! CSV-based barber repository.
//!
//! Core fields are flat CSV columns; the nested schedule, break and
//! time-off collections are kept as JSON in their own columns so the
//! whole barber round-trips through one file.
use anyhow::{anyhow, Result};
use csv::{Reader, Writer};
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::barber::{Barber, BreakWindow, TimeOff, WeeklySchedule};
use crate::storage::traits::BarberStorage;

const FILE_NAME: &str = "barbers.csv";
const HEADER: [&str; 7] = [
    "id",
    "name",
    "active",
    "commission_percentage",
    "schedule",
    "breaks",
    "time_off",
];

#[derive(Clone)]
pub struct BarberRepository {
    connection: CsvConnection,
}

impl BarberRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_all(&self) -> Result<Vec<Barber>> {
        let path = self.connection.file_path(FILE_NAME);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&path)?;
        let mut barbers = Vec::new();
        for result in reader.records() {
            let record = result?;
            let schedule: WeeklySchedule = serde_json::from_str(record.get(4).unwrap_or("{}"))?;
            let breaks: Vec<BreakWindow> = serde_json::from_str(record.get(5).unwrap_or("[]"))?;
            let time_off: Vec<TimeOff> = serde_json::from_str(record.get(6).unwrap_or("[]"))?;
            barbers.push(Barber {
                id: record.get(0).unwrap_or("").to_string(),
                name: record.get(1).unwrap_or("").to_string(),
                active: record.get(2).unwrap_or("true") == "true",
                commission_percentage: record.get(3).unwrap_or("0").parse().unwrap_or(0.0),
                schedule,
                breaks,
                time_off,
            });
        }
        Ok(barbers)
    }

    fn write_all(&self, barbers: &[Barber]) -> Result<()> {
        let temp_path = self.connection.temp_path(FILE_NAME);
        {
            let mut writer = Writer::from_path(&temp_path)?;
            writer.write_record(HEADER)?;
            for barber in barbers {
                writer.write_record(&[
                    barber.id.clone(),
                    barber.name.clone(),
                    barber.active.to_string(),
                    barber.commission_percentage.to_string(),
                    serde_json::to_string(&barber.schedule)?,
                    serde_json::to_string(&barber.breaks)?,
                    serde_json::to_string(&barber.time_off)?,
                ])?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, self.connection.file_path(FILE_NAME))?;
        Ok(())
    }
}

impl BarberStorage for BarberRepository {
    fn store_barber(&self, barber: &Barber) -> Result<()> {
        let mut barbers = self.read_all()?;
        if barbers.iter().any(|b| b.id == barber.id) {
            return Err(anyhow!("Barber {} already exists", barber.id));
        }
        barbers.push(barber.clone());
        self.write_all(&barbers)
    }

    fn get_barber(&self, barber_id: &str) -> Result<Option<Barber>> {
        Ok(self.read_all()?.into_iter().find(|b| b.id == barber_id))
    }

    fn list_barbers(&self) -> Result<Vec<Barber>> {
        self.read_all()
    }

    fn update_barber(&self, barber: &Barber) -> Result<()> {
        let mut barbers = self.read_all()?;
        let slot = barbers
            .iter_mut()
            .find(|b| b.id == barber.id)
            .ok_or_else(|| anyhow!("Barber {} not found", barber.id))?;
        *slot = barber.clone();
        self.write_all(&barbers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::barber::{TimeOffKind, WeeklySchedule};
    use chrono::{NaiveDate, NaiveTime, Weekday};
    use tempfile::TempDir;

    fn test_repo() -> (BarberRepository, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("connection");
        (BarberRepository::new(connection), temp_dir)
    }

    fn sample_barber(name: &str) -> Barber {
        Barber {
            id: Barber::generate_id(),
            name: name.to_string(),
            active: true,
            commission_percentage: 40.0,
            schedule: WeeklySchedule::uniform(
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            ),
            breaks: vec![BreakWindow {
                weekday: Weekday::Mon,
                start: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
                label: "Lunch".to_string(),
            }],
            time_off: vec![TimeOff {
                id: TimeOff::generate_id(),
                starts_on: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
                ends_on: NaiveDate::from_ymd_opt(2025, 8, 14).unwrap(),
                kind: TimeOffKind::Vacation,
                active: true,
            }],
        }
    }

    #[test]
    fn store_and_get_round_trips_nested_records() -> Result<()> {
        let (repo, _dir) = test_repo();
        let barber = sample_barber("Marco");
        repo.store_barber(&barber)?;

        let loaded = repo.get_barber(&barber.id)?.expect("barber present");
        assert_eq!(loaded, barber);
        assert_eq!(loaded.breaks[0].label, "Lunch");
        assert_eq!(loaded.time_off[0].kind, TimeOffKind::Vacation);
        Ok(())
    }

    #[test]
    fn update_replaces_schedule() -> Result<()> {
        let (repo, _dir) = test_repo();
        let mut barber = sample_barber("Marco");
        repo.store_barber(&barber)?;

        barber.schedule.days[0].working = false;
        repo.update_barber(&barber)?;

        let loaded = repo.get_barber(&barber.id)?.unwrap();
        assert!(!loaded.schedule.days[0].working);
        Ok(())
    }

    #[test]
    fn list_preserves_insertion_order() -> Result<()> {
        let (repo, _dir) = test_repo();
        let first = sample_barber("Marco");
        let second = sample_barber("Luca");
        repo.store_barber(&first)?;
        repo.store_barber(&second)?;

        let names: Vec<String> = repo.list_barbers()?.into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Marco", "Luca"]);
        Ok(())
    }
}
