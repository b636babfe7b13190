//! Domain model for a barber and the scheduling records owned by admins:
//! the fixed weekly schedule, recurring breaks, and one-off time-off blocks.
use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barber {
    pub id: String,
    pub name: String,
    pub active: bool,
    /// Stored for reporting; the monthly distribution is points-based.
    pub commission_percentage: f64,
    pub schedule: WeeklySchedule,
    pub breaks: Vec<BreakWindow>,
    pub time_off: Vec<TimeOff>,
}

impl Barber {
    pub fn generate_id() -> String {
        format!("barber::{}", uuid::Uuid::new_v4())
    }
}

/// One day of the weekly schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub working: bool,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Fixed weekly schedule, indexed Monday first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub days: Vec<DaySchedule>,
}

impl WeeklySchedule {
    /// All seven days working with the same shift.
    pub fn uniform(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            days: (0..7)
                .map(|_| DaySchedule {
                    working: true,
                    start,
                    end,
                })
                .collect(),
        }
    }

    pub fn day(&self, weekday: Weekday) -> &DaySchedule {
        &self.days[weekday.num_days_from_monday() as usize]
    }
}

/// Recurring break window on a given weekday (e.g. lunch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub label: String,
}

impl BreakWindow {
    /// Break intervals must be non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(anyhow!(crate::domain::errors::BookingError::InvalidRange));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOffKind {
    DayOff,
    Vacation,
    Block,
}

impl TimeOffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOffKind::DayOff => "day_off",
            TimeOffKind::Vacation => "vacation",
            TimeOffKind::Block => "block",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "day_off" => Ok(TimeOffKind::DayOff),
            "vacation" => Ok(TimeOffKind::Vacation),
            "block" => Ok(TimeOffKind::Block),
            other => Err(anyhow!("Unknown time-off kind: {}", other)),
        }
    }
}

/// One-off blocked date range. Overlapping entries are permitted and all
/// honored; the resolver treats them as a union of blocked days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOff {
    pub id: String,
    /// Inclusive
    pub starts_on: NaiveDate,
    /// Inclusive
    pub ends_on: NaiveDate,
    pub kind: TimeOffKind,
    pub active: bool,
}

impl TimeOff {
    pub fn generate_id() -> String {
        format!("timeoff::{}", uuid::Uuid::new_v4())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ends_on < self.starts_on {
            return Err(anyhow!(crate::domain::errors::BookingError::InvalidRange));
        }
        Ok(())
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.active && self.starts_on <= date && date <= self.ends_on
    }
}
