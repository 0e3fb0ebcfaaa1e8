use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::fleet::{MIN_REST_HOURS, VehicleRef};
use crate::models::trip::Trip;

/// A confirmed booking. Cost and duration are frozen at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub trip: Trip,
    pub taxi: VehicleRef,
    pub time: NaiveDateTime,
    pub flagged: bool,
    pub stop_count: usize,
    pub cost: f64,
    /// Minutes
    pub duration: u32,
}

impl Booking {
    pub fn new(
        trip: Trip,
        taxi: VehicleRef,
        time: NaiveDateTime,
        flagged: bool,
        stop_count: usize,
        cost: f64,
        duration: u32,
    ) -> Self {
        Self {
            trip,
            taxi,
            time,
            flagged,
            stop_count,
            cost,
            duration,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.time.date()
    }

    pub fn start_hour(&self) -> f64 {
        hour_of_day(&self.time)
    }

    pub fn duration_hours(&self) -> f64 {
        f64::from(self.duration) / 60.0
    }

    /// Strictly later than `now`
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.time > now
    }
}

/// Hour of day as a real number, 13:30 is 13.5
pub fn hour_of_day(time: &NaiveDateTime) -> f64 {
    f64::from(time.hour()) + f64::from(time.minute()) / 60.0
}

/// Rejects times in the past or less than the minimum rest away from `now`
pub fn validate_schedule(when: NaiveDateTime, now: NaiveDateTime) -> AppResult<()> {
    let hours_ahead = (when - now).num_seconds() as f64 / 3600.0;
    if hours_ahead < MIN_REST_HOURS {
        return Err(AppError::BadRequest(
            "Date and time must be in the future. You can only book with at least 15 minutes notice"
                .to_string(),
        ));
    }
    Ok(())
}

/// e.g. `Tue 22 Oct 2:30 pm`
pub fn format_schedule(time: &NaiveDateTime) -> String {
    time.format("%a %-d %b %-I:%M %P").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Date,
    Cost,
    Duration,
}

impl SortKey {
    pub fn compare(&self, a: &Booking, b: &Booking) -> Ordering {
        match self {
            SortKey::Date => a.time.cmp(&b.time),
            SortKey::Cost => a.cost.total_cmp(&b.cost),
            SortKey::Duration => a.duration.cmp(&b.duration),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "cost" => Ok(SortKey::Cost),
            "duration" => Ok(SortKey::Duration),
            other => Err(format!("unknown sort key '{}' (expected date, cost or duration)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    Upcoming,
    History,
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Ok(Scope::Upcoming),
            "history" => Ok(Scope::History),
            other => Err(format!("unknown scope '{}' (expected upcoming or history)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDirections {
    pub date: SortDirection,
    pub cost: SortDirection,
    pub duration: SortDirection,
}

impl KeyDirections {
    fn slot(&mut self, key: SortKey) -> &mut SortDirection {
        match key {
            SortKey::Date => &mut self.date,
            SortKey::Cost => &mut self.cost,
            SortKey::Duration => &mut self.duration,
        }
    }
}

/// Direction the next sort of each key will use, kept apart per partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub upcoming: KeyDirections,
    pub history: KeyDirections,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            upcoming: KeyDirections {
                date: SortDirection::Ascending,
                cost: SortDirection::Ascending,
                duration: SortDirection::Ascending,
            },
            // most recent first
            history: KeyDirections {
                date: SortDirection::Descending,
                cost: SortDirection::Ascending,
                duration: SortDirection::Ascending,
            },
        }
    }
}

impl SortState {
    /// Returns the direction to use now and flips it for the next call
    pub fn advance(&mut self, key: SortKey, scope: Scope) -> SortDirection {
        let directions = match scope {
            Scope::Upcoming => &mut self.upcoming,
            Scope::History => &mut self.history,
        };
        let slot = directions.slot(key);
        let current = *slot;
        *slot = current.flipped();
        current
    }
}
