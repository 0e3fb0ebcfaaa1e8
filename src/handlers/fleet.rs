use chrono::NaiveDate;
use serde::Serialize;

use crate::AppState;
use crate::error::AppResult;
use crate::models::TaxiType;
use crate::storage::{KeyValueStore, load_fleet};

#[derive(Debug, Serialize)]
pub struct SlotSummary {
    pub date: NaiveDate,
    pub start_hour: f64,
    pub duration_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct VehicleSummary {
    pub rego: String,
    pub taxi_type: TaxiType,
    pub slots: Vec<SlotSummary>,
}

/// Every vehicle in roster order with the slots it currently holds
pub async fn list_fleet<S: KeyValueStore>(state: &AppState<S>) -> AppResult<Vec<VehicleSummary>> {
    let fleet = load_fleet(&state.store).await?;

    let vehicles = fleet
        .vehicles()
        .iter()
        .map(|vehicle| VehicleSummary {
            rego: vehicle.rego.clone(),
            taxi_type: vehicle.taxi_type,
            slots: vehicle
                .bookings()
                .filter_map(|slot| {
                    Some(SlotSummary {
                        date: slot.date?,
                        start_hour: slot.time?,
                        duration_hours: slot.duration?,
                    })
                })
                .collect(),
        })
        .collect();

    Ok(vehicles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::{MemoryStore, save_fleet};

    #[tokio::test]
    async fn test_list_fleet() {
        let state = AppState {
            store: MemoryStore::new(),
            config: Config::default(),
        };

        let vehicles = list_fleet(&state).await.unwrap();
        assert_eq!(vehicles.len(), 10);
        assert!(vehicles.iter().all(|v| v.slots.is_empty()));

        let mut fleet = load_fleet(&state.store).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2030, 1, 2).unwrap();
        fleet.allocate(TaxiType::Suv, date, 14.5, 0.75).unwrap();
        save_fleet(&state.store, &fleet).await.unwrap();

        let vehicles = list_fleet(&state).await.unwrap();
        let suv = vehicles.iter().find(|v| v.rego == "WRE-188").unwrap();
        assert_eq!(suv.slots.len(), 1);
        assert_eq!(suv.slots[0].start_hour, 14.5);
        assert_eq!(suv.slots[0].duration_hours, 0.75);
    }
}
