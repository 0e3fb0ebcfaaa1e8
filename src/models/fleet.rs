//! Taxi roster and first-fit time slot allocation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::fare::TaxiType;

/// Minimum idle time in hours a vehicle needs between two trips
pub const MIN_REST_HOURS: f64 = 0.25;

/// A reserved interval `[time, time + duration)` on `date`, in hours.
///
/// Every vehicle starts with one placeholder slot whose fields are all empty.
/// A placeholder never matches a real date, so it never blocks allocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookedTimeSlot {
    pub date: Option<NaiveDate>,
    pub time: Option<f64>,
    pub duration: Option<f64>,
}

impl BookedTimeSlot {
    pub fn new(date: NaiveDate, time: f64, duration: f64) -> Self {
        Self {
            date: Some(date),
            time: Some(time),
            duration: Some(duration),
        }
    }

    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.date.is_none()
    }

    /// Whether a new `[start, start + duration)` on `date` can sit beside this slot.
    ///
    /// Each side is tested on its own: starting more than `MIN_REST_HOURS` after
    /// the request ends, or ending more than `MIN_REST_HOURS` before it starts.
    pub fn clears(&self, date: NaiveDate, start: f64, duration: f64) -> bool {
        if self.date != Some(date) {
            return true;
        }
        let booked_time = self.time.unwrap_or_default();
        let booked_duration = self.duration.unwrap_or_default();

        booked_time - (start + duration) > MIN_REST_HOURS
            || (booked_time + booked_duration) - start < -MIN_REST_HOURS
    }
}

/// Type and registration of an allocated taxi, copied into a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRef {
    pub taxi_type: TaxiType,
    pub rego: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxiVehicle {
    pub rego: String,
    pub taxi_type: TaxiType,
    pub booked_times: Vec<BookedTimeSlot>,
}

impl TaxiVehicle {
    pub fn new(rego: impl Into<String>, taxi_type: TaxiType) -> Self {
        Self {
            rego: rego.into(),
            taxi_type,
            booked_times: vec![BookedTimeSlot::placeholder()],
        }
    }

    pub fn reference(&self) -> VehicleRef {
        VehicleRef {
            taxi_type: self.taxi_type,
            rego: self.rego.clone(),
        }
    }

    pub fn is_free(&self, date: NaiveDate, start: f64, duration: f64) -> bool {
        self.booked_times
            .iter()
            .all(|slot| slot.clears(date, start, duration))
    }

    /// Booked slots that are not the placeholder
    pub fn bookings(&self) -> impl Iterator<Item = &BookedTimeSlot> {
        self.booked_times.iter().filter(|slot| !slot.is_placeholder())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fleet {
    vehicles: Vec<TaxiVehicle>,
}

impl Fleet {
    pub fn new(vehicles: Vec<TaxiVehicle>) -> Self {
        Self { vehicles }
    }

    pub fn default_roster() -> Self {
        Self::new(vec![
            TaxiVehicle::new("VOV-887", TaxiType::Sedan),
            TaxiVehicle::new("OZS-293", TaxiType::Van),
            TaxiVehicle::new("WRE-188", TaxiType::Suv),
            TaxiVehicle::new("FWZ-490", TaxiType::Sedan),
            TaxiVehicle::new("NYE-874", TaxiType::Suv),
            TaxiVehicle::new("TES-277", TaxiType::Sedan),
            TaxiVehicle::new("GSP-874", TaxiType::Suv),
            TaxiVehicle::new("UAH-328", TaxiType::Minibus),
            TaxiVehicle::new("RJQ-001", TaxiType::Suv),
            TaxiVehicle::new("AGD-793", TaxiType::Minibus),
        ])
    }

    pub fn vehicles(&self) -> &[TaxiVehicle] {
        &self.vehicles
    }

    pub fn find(&self, rego: &str) -> Option<&TaxiVehicle> {
        self.vehicles.iter().find(|v| v.rego == rego)
    }

    /// Reserves the first vehicle of `taxi_type`, in roster order, that clears
    /// every slot it already holds. Leaves the roster untouched on `None`.
    pub fn allocate(
        &mut self,
        taxi_type: TaxiType,
        date: NaiveDate,
        start: f64,
        duration: f64,
    ) -> Option<VehicleRef> {
        let vehicle = self
            .vehicles
            .iter_mut()
            .filter(|v| v.taxi_type == taxi_type)
            .find(|v| v.is_free(date, start, duration))?;

        vehicle
            .booked_times
            .push(BookedTimeSlot::new(date, start, duration));
        tracing::debug!(rego = %vehicle.rego, %date, start, duration, "Allocated taxi");

        Some(vehicle.reference())
    }

    /// Drops the first slot of `rego` on `date` starting exactly at `start`.
    /// Returns false when nothing matched.
    pub fn release(&mut self, rego: &str, date: NaiveDate, start: f64) -> bool {
        let Some(vehicle) = self.vehicles.iter_mut().find(|v| v.rego == rego) else {
            return false;
        };

        let position = vehicle
            .booked_times
            .iter()
            .position(|slot| slot.date == Some(date) && slot.time == Some(start));

        match position {
            Some(index) => {
                vehicle.booked_times.remove(index);
                tracing::debug!(rego, %date, start, "Released taxi slot");
                true
            }
            None => false,
        }
    }
}
