//! CSV-based repository for appointment service line items.
use anyhow::Result;
use csv::{Reader, Writer};
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::appointment::AppointmentLine;
use crate::storage::traits::AppointmentLineStorage;

const FILE_NAME: &str = "appointment_lines.csv";
const HEADER: [&str; 7] = [
    "id",
    "appointment_id",
    "service_id",
    "price_at_time",
    "duration_minutes",
    "points",
    "original",
];

#[derive(Clone)]
pub struct AppointmentLineRepository {
    connection: CsvConnection,
}

impl AppointmentLineRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_all(&self) -> Result<Vec<AppointmentLine>> {
        let path = self.connection.file_path(FILE_NAME);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&path)?;
        let mut lines = Vec::new();
        for result in reader.records() {
            let record = result?;
            lines.push(AppointmentLine {
                id: record.get(0).unwrap_or("").to_string(),
                appointment_id: record.get(1).unwrap_or("").to_string(),
                service_id: record.get(2).unwrap_or("").to_string(),
                price_at_time: record.get(3).unwrap_or("0").parse().unwrap_or(0.0),
                duration_minutes: record.get(4).unwrap_or("0").parse().unwrap_or(0),
                points: record.get(5).unwrap_or("0").parse().unwrap_or(0),
                original: record.get(6).unwrap_or("false") == "true",
            });
        }
        Ok(lines)
    }

    fn write_all(&self, lines: &[AppointmentLine]) -> Result<()> {
        let temp_path = self.connection.temp_path(FILE_NAME);
        {
            let mut writer = Writer::from_path(&temp_path)?;
            writer.write_record(HEADER)?;
            for line in lines {
                writer.write_record(&[
                    line.id.clone(),
                    line.appointment_id.clone(),
                    line.service_id.clone(),
                    line.price_at_time.to_string(),
                    line.duration_minutes.to_string(),
                    line.points.to_string(),
                    line.original.to_string(),
                ])?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, self.connection.file_path(FILE_NAME))?;
        Ok(())
    }
}

impl AppointmentLineStorage for AppointmentLineRepository {
    fn store_line(&self, line: &AppointmentLine) -> Result<()> {
        let mut lines = self.read_all()?;
        lines.push(line.clone());
        self.write_all(&lines)
    }

    fn list_lines(&self, appointment_id: &str) -> Result<Vec<AppointmentLine>> {
        // Attachment order; the original line was stored first
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|l| l.appointment_id == appointment_id)
            .collect())
    }

    fn delete_line(&self, appointment_id: &str, line_id: &str) -> Result<bool> {
        let mut lines = self.read_all()?;
        let before = lines.len();
        lines.retain(|l| !(l.appointment_id == appointment_id && l.id == line_id));
        if lines.len() == before {
            return Ok(false);
        }
        self.write_all(&lines)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_repo() -> (AppointmentLineRepository, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("connection");
        (AppointmentLineRepository::new(connection), temp_dir)
    }

    fn line(appointment_id: &str, original: bool) -> AppointmentLine {
        AppointmentLine {
            id: AppointmentLine::generate_id(),
            appointment_id: appointment_id.to_string(),
            service_id: "service-1".to_string(),
            price_at_time: 25.0,
            duration_minutes: 30,
            points: 30,
            original,
        }
    }

    #[test]
    fn lists_only_the_requested_appointment() -> Result<()> {
        let (repo, _dir) = test_repo();
        repo.store_line(&line("appt-1", true))?;
        repo.store_line(&line("appt-2", true))?;
        repo.store_line(&line("appt-1", false))?;

        let lines = repo.list_lines("appt-1")?;
        assert_eq!(lines.len(), 2);
        assert!(lines[0].original);
        assert!(!lines[1].original);
        Ok(())
    }

    #[test]
    fn delete_reports_whether_a_line_was_removed() -> Result<()> {
        let (repo, _dir) = test_repo();
        let extra = line("appt-1", false);
        repo.store_line(&extra)?;

        assert!(repo.delete_line("appt-1", &extra.id)?);
        assert!(!repo.delete_line("appt-1", &extra.id)?);
        assert!(repo.list_lines("appt-1")?.is_empty());
        Ok(())
    }
}
