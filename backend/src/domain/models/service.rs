//! Domain model for a billable service in the catalog.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub duration_minutes: i64,
    pub price: f64,
    pub active: bool,
    /// Points awarded per completion. Defaults to the duration in minutes
    /// (the 1 minute = 1 point rule); kept as its own field so the weight
    /// can be decoupled from duration later without a schema change.
    pub points: i64,
}

impl Service {
    pub fn new(name: impl Into<String>, duration_minutes: i64, price: f64) -> Self {
        Self {
            id: Self::generate_id(),
            name: name.into(),
            duration_minutes,
            price,
            active: true,
            points: duration_minutes,
        }
    }

    pub fn generate_id() -> String {
        format!("service::{}", uuid::Uuid::new_v4())
    }
}
