//! CSV-based service catalog repository.
use anyhow::{anyhow, Result};
use csv::{Reader, Writer};
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::service::Service;
use crate::storage::traits::ServiceStorage;

const FILE_NAME: &str = "services.csv";
const HEADER: [&str; 6] = ["id", "name", "duration_minutes", "price", "active", "points"];

#[derive(Clone)]
pub struct ServiceRepository {
    connection: CsvConnection,
}

impl ServiceRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_all(&self) -> Result<Vec<Service>> {
        let path = self.connection.file_path(FILE_NAME);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&path)?;
        let mut services = Vec::new();
        for result in reader.records() {
            let record = result?;
            let duration_minutes: i64 = record.get(2).unwrap_or("0").parse().unwrap_or(0);
            services.push(Service {
                id: record.get(0).unwrap_or("").to_string(),
                name: record.get(1).unwrap_or("").to_string(),
                duration_minutes,
                price: record.get(3).unwrap_or("0").parse().unwrap_or(0.0),
                active: record.get(4).unwrap_or("true") == "true",
                points: record
                    .get(5)
                    .unwrap_or("")
                    .parse()
                    .unwrap_or(duration_minutes),
            });
        }
        Ok(services)
    }

    fn write_all(&self, services: &[Service]) -> Result<()> {
        let temp_path = self.connection.temp_path(FILE_NAME);
        {
            let mut writer = Writer::from_path(&temp_path)?;
            writer.write_record(HEADER)?;
            for service in services {
                writer.write_record(&[
                    service.id.clone(),
                    service.name.clone(),
                    service.duration_minutes.to_string(),
                    service.price.to_string(),
                    service.active.to_string(),
                    service.points.to_string(),
                ])?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, self.connection.file_path(FILE_NAME))?;
        Ok(())
    }
}

impl ServiceStorage for ServiceRepository {
    fn store_service(&self, service: &Service) -> Result<()> {
        let mut services = self.read_all()?;
        if services.iter().any(|s| s.id == service.id) {
            return Err(anyhow!("Service {} already exists", service.id));
        }
        services.push(service.clone());
        self.write_all(&services)
    }

    fn get_service(&self, service_id: &str) -> Result<Option<Service>> {
        Ok(self.read_all()?.into_iter().find(|s| s.id == service_id))
    }

    fn list_services(&self) -> Result<Vec<Service>> {
        self.read_all()
    }

    fn update_service(&self, service: &Service) -> Result<()> {
        let mut services = self.read_all()?;
        let slot = services
            .iter_mut()
            .find(|s| s.id == service.id)
            .ok_or_else(|| anyhow!("Service {} not found", service.id))?;
        *slot = service.clone();
        self.write_all(&services)
    }
}
