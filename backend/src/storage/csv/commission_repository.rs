//! CSV-based repository for revenue pools and manual commission entries.
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use csv::{Reader, Writer};
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::commission::{BillingMonth, ManualCommissionEntry, RevenuePool};
use crate::storage::traits::CommissionStorage;

const POOLS_FILE: &str = "revenue_pools.csv";
const POOL_HEADER: [&str; 3] = ["month", "total_revenue", "distribution_percentage"];

const ENTRIES_FILE: &str = "manual_entries.csv";
const ENTRY_HEADER: [&str; 6] = ["id", "barber_id", "date", "minutes", "description", "amount"];

#[derive(Clone)]
pub struct CommissionRepository {
    connection: CsvConnection,
}

impl CommissionRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_pools(&self) -> Result<Vec<RevenuePool>> {
        let path = self.connection.file_path(POOLS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&path)?;
        let mut pools = Vec::new();
        for result in reader.records() {
            let record = result?;
            pools.push(RevenuePool {
                month: BillingMonth::parse(record.get(0).unwrap_or(""))?,
                total_revenue: record.get(1).unwrap_or("0").parse().unwrap_or(0.0),
                distribution_percentage: record.get(2).unwrap_or("0").parse().unwrap_or(0.0),
            });
        }
        Ok(pools)
    }

    fn write_pools(&self, pools: &[RevenuePool]) -> Result<()> {
        let temp_path = self.connection.temp_path(POOLS_FILE);
        {
            let mut writer = Writer::from_path(&temp_path)?;
            writer.write_record(POOL_HEADER)?;
            for pool in pools {
                writer.write_record(&[
                    pool.month.to_string(),
                    pool.total_revenue.to_string(),
                    pool.distribution_percentage.to_string(),
                ])?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, self.connection.file_path(POOLS_FILE))?;
        Ok(())
    }

    fn read_entries(&self) -> Result<Vec<ManualCommissionEntry>> {
        let path = self.connection.file_path(ENTRIES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&path)?;
        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result?;
            entries.push(ManualCommissionEntry {
                id: record.get(0).unwrap_or("").to_string(),
                barber_id: record.get(1).unwrap_or("").to_string(),
                date: NaiveDate::parse_from_str(record.get(2).unwrap_or(""), "%Y-%m-%d")?,
                minutes: record.get(3).unwrap_or("0").parse().unwrap_or(0),
                description: record.get(4).unwrap_or("").to_string(),
                amount: record.get(5).unwrap_or("0").parse().unwrap_or(0.0),
            });
        }
        Ok(entries)
    }

    fn write_entries(&self, entries: &[ManualCommissionEntry]) -> Result<()> {
        let temp_path = self.connection.temp_path(ENTRIES_FILE);
        {
            let mut writer = Writer::from_path(&temp_path)?;
            writer.write_record(ENTRY_HEADER)?;
            for entry in entries {
                writer.write_record(&[
                    entry.id.clone(),
                    entry.barber_id.clone(),
                    entry.date.format("%Y-%m-%d").to_string(),
                    entry.minutes.to_string(),
                    entry.description.clone(),
                    entry.amount.to_string(),
                ])?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, self.connection.file_path(ENTRIES_FILE))?;
        Ok(())
    }
}

impl CommissionStorage for CommissionRepository {
    fn upsert_pool(&self, pool: &RevenuePool) -> Result<()> {
        let mut pools = self.read_pools()?;
        match pools.iter_mut().find(|p| p.month == pool.month) {
            Some(slot) => *slot = pool.clone(),
            None => pools.push(pool.clone()),
        }
        self.write_pools(&pools)
    }

    fn get_pool(&self, month: BillingMonth) -> Result<Option<RevenuePool>> {
        Ok(self.read_pools()?.into_iter().find(|p| p.month == month))
    }

    fn store_manual_entry(&self, entry: &ManualCommissionEntry) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.push(entry.clone());
        self.write_entries(&entries)
    }

    fn get_manual_entry(&self, entry_id: &str) -> Result<Option<ManualCommissionEntry>> {
        Ok(self.read_entries()?.into_iter().find(|e| e.id == entry_id))
    }

    fn update_manual_entry(&self, entry: &ManualCommissionEntry) -> Result<()> {
        let mut entries = self.read_entries()?;
        let slot = entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| anyhow!("Manual entry {} not found", entry.id))?;
        *slot = entry.clone();
        self.write_entries(&entries)
    }

    fn delete_manual_entry(&self, entry_id: &str) -> Result<bool> {
        let mut entries = self.read_entries()?;
        let before = entries.len();
        entries.retain(|e| e.id != entry_id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write_entries(&entries)?;
        Ok(true)
    }

    fn list_manual_entries_for_month(
        &self,
        month: BillingMonth,
    ) -> Result<Vec<ManualCommissionEntry>> {
        Ok(self
            .read_entries()?
            .into_iter()
            .filter(|e| month.contains(e.date))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_repo() -> (CommissionRepository, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("connection");
        (CommissionRepository::new(connection), temp_dir)
    }

    #[test]
    fn pool_upsert_is_last_writer_wins() -> Result<()> {
        let (repo, _dir) = test_repo();
        let month = BillingMonth::new(2025, 6)?;
        repo.upsert_pool(&RevenuePool {
            month,
            total_revenue: 1000.0,
            distribution_percentage: 70.0,
        })?;
        repo.upsert_pool(&RevenuePool {
            month,
            total_revenue: 1200.0,
            distribution_percentage: 60.0,
        })?;

        let pool = repo.get_pool(month)?.unwrap();
        assert_eq!(pool.total_revenue, 1200.0);
        assert_eq!(pool.distribution_percentage, 60.0);
        Ok(())
    }

    #[test]
    fn manual_entries_filter_by_month() -> Result<()> {
        let (repo, _dir) = test_repo();
        let june = ManualCommissionEntry {
            id: ManualCommissionEntry::generate_id(),
            barber_id: "barber-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            minutes: 60,
            description: "Event haircuts".to_string(),
            amount: 80.0,
        };
        let july = ManualCommissionEntry {
            id: ManualCommissionEntry::generate_id(),
            date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            ..june.clone()
        };
        repo.store_manual_entry(&june)?;
        repo.store_manual_entry(&july)?;

        let listed = repo.list_manual_entries_for_month(BillingMonth::new(2025, 6)?)?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, june.id);
        Ok(())
    }

    #[test]
    fn delete_reports_missing_entries() -> Result<()> {
        let (repo, _dir) = test_repo();
        let entry = ManualCommissionEntry {
            id: ManualCommissionEntry::generate_id(),
            barber_id: "barber-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            minutes: 30,
            description: "Adjustment".to_string(),
            amount: 20.0,
        };
        repo.store_manual_entry(&entry)?;

        assert!(repo.delete_manual_entry(&entry.id)?);
        assert!(!repo.delete_manual_entry(&entry.id)?);
        Ok(())
    }
}
