//! CSV-based repository for client subscriptions and booking restrictions.
//!
//! Two files: `subscriptions.csv` (one row per client) and
//! `restrictions.csv` (append-only; the latest row per client wins).
use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{Reader, Writer};
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::subscription::{
    BookingRestriction, ClientSubscription, SubscriptionStatus,
};
use crate::storage::traits::SubscriptionStorage;

const SUBSCRIPTIONS_FILE: &str = "subscriptions.csv";
const SUBSCRIPTION_HEADER: [&str; 9] = [
    "id",
    "client_id",
    "plan_name",
    "cuts_per_period",
    "preferred_barber_id",
    "status",
    "period_start",
    "period_end",
    "cuts_used",
];

const RESTRICTIONS_FILE: &str = "restrictions.csv";
const RESTRICTION_HEADER: [&str; 4] = ["id", "client_id", "restricted_until", "reason"];

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Clone)]
pub struct SubscriptionRepository {
    connection: CsvConnection,
}

impl SubscriptionRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_subscriptions(&self) -> Result<Vec<ClientSubscription>> {
        let path = self.connection.file_path(SUBSCRIPTIONS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&path)?;
        let mut subscriptions = Vec::new();
        for result in reader.records() {
            let record = result?;
            let preferred = record.get(4).unwrap_or("");
            subscriptions.push(ClientSubscription {
                id: record.get(0).unwrap_or("").to_string(),
                client_id: record.get(1).unwrap_or("").to_string(),
                plan_name: record.get(2).unwrap_or("").to_string(),
                cuts_per_period: record.get(3).unwrap_or("0").parse().unwrap_or(0),
                preferred_barber_id: if preferred.is_empty() {
                    None
                } else {
                    Some(preferred.to_string())
                },
                status: SubscriptionStatus::parse(record.get(5).unwrap_or(""))?,
                period_start: NaiveDate::parse_from_str(record.get(6).unwrap_or(""), "%Y-%m-%d")?,
                period_end: NaiveDate::parse_from_str(record.get(7).unwrap_or(""), "%Y-%m-%d")?,
                cuts_used: record.get(8).unwrap_or("0").parse().unwrap_or(0),
            });
        }
        Ok(subscriptions)
    }

    fn write_subscriptions(&self, subscriptions: &[ClientSubscription]) -> Result<()> {
        let temp_path = self.connection.temp_path(SUBSCRIPTIONS_FILE);
        {
            let mut writer = Writer::from_path(&temp_path)?;
            writer.write_record(SUBSCRIPTION_HEADER)?;
            for subscription in subscriptions {
                writer.write_record(&[
                    subscription.id.clone(),
                    subscription.client_id.clone(),
                    subscription.plan_name.clone(),
                    subscription.cuts_per_period.to_string(),
                    subscription.preferred_barber_id.clone().unwrap_or_default(),
                    subscription.status.as_str().to_string(),
                    subscription.period_start.format("%Y-%m-%d").to_string(),
                    subscription.period_end.format("%Y-%m-%d").to_string(),
                    subscription.cuts_used.to_string(),
                ])?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, self.connection.file_path(SUBSCRIPTIONS_FILE))?;
        Ok(())
    }

    fn read_restrictions(&self) -> Result<Vec<BookingRestriction>> {
        let path = self.connection.file_path(RESTRICTIONS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&path)?;
        let mut restrictions = Vec::new();
        for result in reader.records() {
            let record = result?;
            restrictions.push(BookingRestriction {
                id: record.get(0).unwrap_or("").to_string(),
                client_id: record.get(1).unwrap_or("").to_string(),
                restricted_until: NaiveDateTime::parse_from_str(
                    record.get(2).unwrap_or(""),
                    DATETIME_FORMAT,
                )?,
                reason: record.get(3).unwrap_or("").to_string(),
            });
        }
        Ok(restrictions)
    }

    fn write_restrictions(&self, restrictions: &[BookingRestriction]) -> Result<()> {
        let temp_path = self.connection.temp_path(RESTRICTIONS_FILE);
        {
            let mut writer = Writer::from_path(&temp_path)?;
            writer.write_record(RESTRICTION_HEADER)?;
            for restriction in restrictions {
                writer.write_record(&[
                    restriction.id.clone(),
                    restriction.client_id.clone(),
                    restriction
                        .restricted_until
                        .format(DATETIME_FORMAT)
                        .to_string(),
                    restriction.reason.clone(),
                ])?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, self.connection.file_path(RESTRICTIONS_FILE))?;
        Ok(())
    }
}

impl SubscriptionStorage for SubscriptionRepository {
    fn store_subscription(&self, subscription: &ClientSubscription) -> Result<()> {
        let mut subscriptions = self.read_subscriptions()?;
        if subscriptions
            .iter()
            .any(|s| s.client_id == subscription.client_id)
        {
            return Err(anyhow!(
                "Client {} already has a subscription record",
                subscription.client_id
            ));
        }
        subscriptions.push(subscription.clone());
        self.write_subscriptions(&subscriptions)
    }

    fn get_for_client(&self, client_id: &str) -> Result<Option<ClientSubscription>> {
        Ok(self
            .read_subscriptions()?
            .into_iter()
            .find(|s| s.client_id == client_id))
    }

    fn update_subscription(&self, subscription: &ClientSubscription) -> Result<()> {
        let mut subscriptions = self.read_subscriptions()?;
        let slot = subscriptions
            .iter_mut()
            .find(|s| s.id == subscription.id)
            .ok_or_else(|| anyhow!("Subscription {} not found", subscription.id))?;
        *slot = subscription.clone();
        self.write_subscriptions(&subscriptions)
    }

    fn store_restriction(&self, restriction: &BookingRestriction) -> Result<()> {
        let mut restrictions = self.read_restrictions()?;
        restrictions.push(restriction.clone());
        self.write_restrictions(&restrictions)
    }

    fn latest_restriction_for_client(&self, client_id: &str) -> Result<Option<BookingRestriction>> {
        Ok(self
            .read_restrictions()?
            .into_iter()
            .filter(|r| r.client_id == client_id)
            .last())
    }
}
