//! String-keyed persistence.
//!
//! Everything the application keeps lives under a handful of keys as JSON. A value
//! that fails to parse is logged and treated as absent, so a corrupted entry degrades
//! to an empty history instead of an error.

pub mod booking_store;
pub mod database;
pub mod memory;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::AppResult;
use crate::models::Fleet;

pub use booking_store::{BookingStore, Partition};
pub use database::DbStore;
pub use memory::MemoryStore;

pub const BOOKINGS_KEY: &str = "bookings";
pub const FLEET_KEY: &str = "fleet";
pub const BOOKING_NUMBER_KEY: &str = "booking_number";
pub const PAST_OR_FUTURE_KEY: &str = "past_or_future";
pub const SORT_STATE_KEY: &str = "sort_state";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn set(&self, key: &str, value: String) -> AppResult<()>;
    async fn remove(&self, key: &str) -> AppResult<()>;
}

pub async fn load_json<S, T>(store: &S, key: &str) -> AppResult<Option<T>>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed stored data");
            Ok(None)
        }
    }
}

pub async fn save_json<S, T>(store: &S, key: &str, value: &T) -> AppResult<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, raw).await
}

/// Stored roster, or the default one when nothing usable is stored yet
pub async fn load_fleet<S: KeyValueStore + ?Sized>(store: &S) -> AppResult<Fleet> {
    Ok(load_json(store, FLEET_KEY)
        .await?
        .unwrap_or_else(Fleet::default_roster))
}

pub async fn save_fleet<S: KeyValueStore + ?Sized>(store: &S, fleet: &Fleet) -> AppResult<()> {
    save_json(store, FLEET_KEY, fleet).await
}

/// The booking last opened in detail and whether it was upcoming at the time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub upcoming: bool,
}

pub async fn save_selection<S: KeyValueStore + ?Sized>(
    store: &S,
    selection: Selection,
) -> AppResult<()> {
    save_json(store, BOOKING_NUMBER_KEY, &selection.index).await?;
    let past_or_future: i8 = if selection.upcoming { 1 } else { -1 };
    save_json(store, PAST_OR_FUTURE_KEY, &past_or_future).await
}

pub async fn load_selection<S: KeyValueStore + ?Sized>(store: &S) -> AppResult<Option<Selection>> {
    let Some(index) = load_json::<_, usize>(store, BOOKING_NUMBER_KEY).await? else {
        return Ok(None);
    };
    let past_or_future: i8 = load_json(store, PAST_OR_FUTURE_KEY).await?.unwrap_or(-1);

    Ok(Some(Selection {
        index,
        upcoming: past_or_future == 1,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaxiType;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_malformed_data_reads_as_absent() {
        let store = MemoryStore::new();
        store.set(FLEET_KEY, "{not json".to_string()).await.unwrap();

        let raw: Option<Vec<u32>> = load_json(&store, FLEET_KEY).await.unwrap();
        assert_eq!(raw, None);
        assert_eq!(load_fleet(&store).await.unwrap(), Fleet::default_roster());
    }

    #[tokio::test]
    async fn test_fleet_persists() {
        let store = MemoryStore::new();
        let mut fleet = load_fleet(&store).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2030, 1, 2).unwrap();
        fleet.allocate(TaxiType::Van, date, 9.0, 0.5).unwrap();
        save_fleet(&store, &fleet).await.unwrap();

        assert_eq!(load_fleet(&store).await.unwrap(), fleet);
    }

    #[tokio::test]
    async fn test_selection_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(load_selection(&store).await.unwrap(), None);

        let selection = Selection {
            index: 3,
            upcoming: true,
        };
        save_selection(&store, selection).await.unwrap();
        assert_eq!(load_selection(&store).await.unwrap(), Some(selection));

        save_selection(
            &store,
            Selection {
                index: 0,
                upcoming: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(
            store.get(PAST_OR_FUTURE_KEY).await.unwrap().as_deref(),
            Some("-1")
        );
    }
}
