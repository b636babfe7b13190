//! CSV-based appointment repository.
//!
//! One row per appointment. The registered-client and guest columns are
//! mutually exclusive, mirroring the `ClientRef` domain enum.
use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use csv::{Reader, StringRecord, Writer};
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::appointment::{Appointment, AppointmentStatus, ClientRef};
use crate::domain::models::commission::BillingMonth;
use crate::storage::traits::AppointmentStorage;

const FILE_NAME: &str = "appointments.csv";
const HEADER: [&str; 13] = [
    "id",
    "client_id",
    "guest_name",
    "guest_phone",
    "barber_id",
    "service_id",
    "date",
    "start",
    "end",
    "status",
    "via_subscription",
    "walk_in",
    "created_at",
];

#[derive(Clone)]
pub struct AppointmentRepository {
    connection: CsvConnection,
}

impl AppointmentRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn parse_record(record: &StringRecord) -> Result<Appointment> {
        let client_id = record.get(1).unwrap_or("");
        let client = if client_id.is_empty() {
            ClientRef::Guest {
                name: record.get(2).unwrap_or("").to_string(),
                phone: record.get(3).unwrap_or("").to_string(),
            }
        } else {
            ClientRef::Registered {
                client_id: client_id.to_string(),
            }
        };

        Ok(Appointment {
            id: record.get(0).unwrap_or("").to_string(),
            client,
            barber_id: record.get(4).unwrap_or("").to_string(),
            service_id: record.get(5).unwrap_or("").to_string(),
            date: NaiveDate::parse_from_str(record.get(6).unwrap_or(""), "%Y-%m-%d")?,
            start: NaiveTime::parse_from_str(record.get(7).unwrap_or(""), "%H:%M:%S")?,
            end: NaiveTime::parse_from_str(record.get(8).unwrap_or(""), "%H:%M:%S")?,
            status: AppointmentStatus::parse(record.get(9).unwrap_or(""))?,
            via_subscription: record.get(10).unwrap_or("false") == "true",
            walk_in: record.get(11).unwrap_or("false") == "true",
            created_at: DateTime::parse_from_rfc3339(record.get(12).unwrap_or(""))?
                .with_timezone(&Utc),
        })
    }

    fn read_all(&self) -> Result<Vec<Appointment>> {
        let path = self.connection.file_path(FILE_NAME);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&path)?;
        let mut appointments = Vec::new();
        for result in reader.records() {
            let record = result?;
            appointments.push(Self::parse_record(&record)?);
        }
        Ok(appointments)
    }

    fn write_all(&self, appointments: &[Appointment]) -> Result<()> {
        let temp_path = self.connection.temp_path(FILE_NAME);
        {
            let mut writer = Writer::from_path(&temp_path)?;
            writer.write_record(HEADER)?;
            for appointment in appointments {
                let (client_id, guest_name, guest_phone) = match &appointment.client {
                    ClientRef::Registered { client_id } => {
                        (client_id.clone(), String::new(), String::new())
                    }
                    ClientRef::Guest { name, phone } => {
                        (String::new(), name.clone(), phone.clone())
                    }
                };
                writer.write_record(&[
                    appointment.id.clone(),
                    client_id,
                    guest_name,
                    guest_phone,
                    appointment.barber_id.clone(),
                    appointment.service_id.clone(),
                    appointment.date.format("%Y-%m-%d").to_string(),
                    appointment.start.format("%H:%M:%S").to_string(),
                    appointment.end.format("%H:%M:%S").to_string(),
                    appointment.status.as_str().to_string(),
                    appointment.via_subscription.to_string(),
                    appointment.walk_in.to_string(),
                    appointment.created_at.to_rfc3339(),
                ])?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, self.connection.file_path(FILE_NAME))?;
        Ok(())
    }
}

impl AppointmentStorage for AppointmentRepository {
    fn store_appointment(&self, appointment: &Appointment) -> Result<()> {
        let mut appointments = self.read_all()?;
        if appointments.iter().any(|a| a.id == appointment.id) {
            return Err(anyhow!("Appointment {} already exists", appointment.id));
        }
        appointments.push(appointment.clone());
        self.write_all(&appointments)
    }

    fn get_appointment(&self, appointment_id: &str) -> Result<Option<Appointment>> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|a| a.id == appointment_id))
    }

    fn update_appointment(&self, appointment: &Appointment) -> Result<()> {
        let mut appointments = self.read_all()?;
        let slot = appointments
            .iter_mut()
            .find(|a| a.id == appointment.id)
            .ok_or_else(|| anyhow!("Appointment {} not found", appointment.id))?;
        *slot = appointment.clone();
        self.write_all(&appointments)
    }

    fn list_for_barber_on(&self, barber_id: &str, date: NaiveDate) -> Result<Vec<Appointment>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|a| a.barber_id == barber_id && a.date == date)
            .collect())
    }

    fn list_completed_in_month(&self, month: BillingMonth) -> Result<Vec<Appointment>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|a| a.status == AppointmentStatus::Completed && month.contains(a.date))
            .collect())
    }

    fn list_open_for_client(&self, client_id: &str) -> Result<Vec<Appointment>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|a| a.status.is_open() && a.client.client_id() == Some(client_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_repo() -> (AppointmentRepository, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("connection");
        (AppointmentRepository::new(connection), temp_dir)
    }

    fn sample_appointment(
        barber_id: &str,
        date: NaiveDate,
        start: (u32, u32),
        end: (u32, u32),
    ) -> Appointment {
        Appointment {
            id: Appointment::generate_id(),
            client: ClientRef::Registered {
                client_id: "client-1".to_string(),
            },
            barber_id: barber_id.to_string(),
            service_id: "service-1".to_string(),
            date,
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            status: AppointmentStatus::Pending,
            via_subscription: false,
            walk_in: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn round_trips_registered_and_guest_clients() -> Result<()> {
        let (repo, _dir) = test_repo();
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let registered = sample_appointment("barber-1", date, (10, 0), (10, 30));
        let mut guest = sample_appointment("barber-1", date, (11, 0), (11, 30));
        guest.client = ClientRef::Guest {
            name: "Walk In".to_string(),
            phone: "555-0100".to_string(),
        };
        repo.store_appointment(&registered)?;
        repo.store_appointment(&guest)?;

        let loaded = repo.get_appointment(&guest.id)?.unwrap();
        assert_eq!(loaded.client, guest.client);
        assert_eq!(repo.get_appointment(&registered.id)?.unwrap(), registered);
        Ok(())
    }

    #[test]
    fn filters_by_barber_and_date() -> Result<()> {
        let (repo, _dir) = test_repo();
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();

        repo.store_appointment(&sample_appointment("barber-1", monday, (10, 0), (10, 30)))?;
        repo.store_appointment(&sample_appointment("barber-1", tuesday, (10, 0), (10, 30)))?;
        repo.store_appointment(&sample_appointment("barber-2", monday, (10, 0), (10, 30)))?;

        assert_eq!(repo.list_for_barber_on("barber-1", monday)?.len(), 1);
        assert_eq!(repo.list_for_barber_on("barber-1", tuesday)?.len(), 1);
        assert_eq!(repo.list_for_barber_on("barber-3", monday)?.len(), 0);
        Ok(())
    }

    #[test]
    fn completed_month_listing_ignores_other_statuses() -> Result<()> {
        let (repo, _dir) = test_repo();
        let june = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let july = NaiveDate::from_ymd_opt(2025, 7, 2).unwrap();

        let mut completed = sample_appointment("barber-1", june, (10, 0), (10, 30));
        completed.status = AppointmentStatus::Completed;
        let pending = sample_appointment("barber-1", june, (11, 0), (11, 30));
        let mut other_month = sample_appointment("barber-1", july, (10, 0), (10, 30));
        other_month.status = AppointmentStatus::Completed;

        repo.store_appointment(&completed)?;
        repo.store_appointment(&pending)?;
        repo.store_appointment(&other_month)?;

        let month = BillingMonth::new(2025, 6)?;
        let listed = repo.list_completed_in_month(month)?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, completed.id);
        Ok(())
    }

    #[test]
    fn open_listing_excludes_terminal_statuses() -> Result<()> {
        let (repo, _dir) = test_repo();
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let pending = sample_appointment("barber-1", date, (10, 0), (10, 30));
        let mut cancelled = sample_appointment("barber-1", date, (11, 0), (11, 30));
        cancelled.status = AppointmentStatus::Cancelled;
        repo.store_appointment(&pending)?;
        repo.store_appointment(&cancelled)?;

        let open = repo.list_open_for_client("client-1")?;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, pending.id);
        Ok(())
    }
}
