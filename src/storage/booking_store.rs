use chrono::NaiveDateTime;

use super::{
    BOOKINGS_KEY, KeyValueStore, SORT_STATE_KEY, load_fleet, load_json, save_fleet, save_json,
};
use crate::error::{AppError, AppResult};
use crate::models::{Booking, Scope, SortDirection, SortKey, SortState};

/// Bookings split around `now`, each paired with its index in the stored order
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub upcoming: Vec<(usize, &'a Booking)>,
    pub history: Vec<(usize, &'a Booking)>,
}

/// Ordered booking list kept in step with the key-value store.
///
/// Every mutation writes the whole list back. Two writers on the same store
/// overwrite each other; last write wins.
pub struct BookingStore<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
    bookings: Vec<Booking>,
}

impl<'a, S: KeyValueStore + ?Sized> BookingStore<'a, S> {
    pub async fn load(store: &'a S) -> AppResult<Self> {
        let bookings = load_json(store, BOOKINGS_KEY).await?.unwrap_or_default();
        Ok(Self { store, bookings })
    }

    pub fn list(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn get(&self, index: usize) -> Option<&Booking> {
        self.bookings.get(index)
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    /// Appends and persists, returning the new booking's index
    pub async fn create(&mut self, booking: Booking) -> AppResult<usize> {
        self.bookings.push(booking);
        self.persist().await?;
        Ok(self.bookings.len() - 1)
    }

    /// Frees the taxi slot held by the booking, then drops the booking
    pub async fn remove(&mut self, index: usize) -> AppResult<Booking> {
        let booking = self
            .bookings
            .get(index)
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", index)))?;

        let mut fleet = load_fleet(self.store).await?;
        if fleet.release(&booking.taxi.rego, booking.date(), booking.start_hour()) {
            save_fleet(self.store, &fleet).await?;
        } else {
            tracing::warn!(rego = %booking.taxi.rego, "No taxi slot matched the removed booking");
        }

        let removed = self.bookings.remove(index);
        self.persist().await?;
        Ok(removed)
    }

    pub fn partition(&self, now: NaiveDateTime) -> Partition<'_> {
        let mut partition = Partition::default();
        for (index, booking) in self.bookings.iter().enumerate() {
            if booking.is_upcoming(now) {
                partition.upcoming.push((index, booking));
            } else {
                partition.history.push((index, booking));
            }
        }
        partition
    }

    /// Sorts one partition by `key`, alternating direction on every call for that
    /// scope and key, and stores upcoming followed by history as the new order.
    pub async fn sort_by(
        &mut self,
        key: SortKey,
        scope: Scope,
        now: NaiveDateTime,
    ) -> AppResult<SortDirection> {
        let mut state: SortState = load_json(self.store, SORT_STATE_KEY)
            .await?
            .unwrap_or_default();
        let direction = state.advance(key, scope);

        let (mut upcoming, mut history): (Vec<Booking>, Vec<Booking>) =
            std::mem::take(&mut self.bookings)
                .into_iter()
                .partition(|b| b.is_upcoming(now));

        let target = match scope {
            Scope::Upcoming => &mut upcoming,
            Scope::History => &mut history,
        };
        target.sort_by(|a, b| direction.apply(key.compare(a, b)));

        upcoming.append(&mut history);
        self.bookings = upcoming;

        self.persist().await?;
        save_json(self.store, SORT_STATE_KEY, &state).await?;
        tracing::debug!(?key, ?scope, ?direction, "Sorted bookings");
        Ok(direction)
    }

    /// Fresh list view: sort directions reset, then both partitions ordered by date
    pub async fn reset_view(&mut self, now: NaiveDateTime) -> AppResult<()> {
        save_json(self.store, SORT_STATE_KEY, &SortState::default()).await?;
        self.sort_by(SortKey::Date, Scope::Upcoming, now).await?;
        self.sort_by(SortKey::Date, Scope::History, now).await?;
        Ok(())
    }

    async fn persist(&self) -> AppResult<()> {
        save_json(self.store, BOOKINGS_KEY, &self.bookings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fleet, Stop, TaxiType, Trip};
    use crate::storage::{FLEET_KEY, MemoryStore};
    use crate::utils::geo::Coordinate;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M").unwrap()
    }

    fn trip() -> Trip {
        Trip::from_stops(&[
            Stop::new(Coordinate::new(145.2265, -37.8693), "Glen Waverley"),
            Stop::new(Coordinate::new(145.1340, -37.9110), "Clayton"),
        ])
    }

    /// Allocates from the stored roster the way a booking flow does
    async fn book(
        store: &MemoryStore,
        bookings: &mut BookingStore<'_, MemoryStore>,
        when: &str,
        cost: f64,
        duration: u32,
    ) -> usize {
        let time = at(when);
        let booking_hours = f64::from(duration) / 60.0;
        let mut fleet = load_fleet(store).await.unwrap();
        let taxi = fleet
            .allocate(
                TaxiType::Sedan,
                time.date(),
                crate::models::booking::hour_of_day(&time),
                booking_hours,
            )
            .unwrap();
        save_fleet(store, &fleet).await.unwrap();

        bookings
            .create(Booking::new(trip(), taxi, time, false, 2, cost, duration))
            .await
            .unwrap()
    }

    fn costs(bookings: &BookingStore<'_, MemoryStore>) -> Vec<f64> {
        bookings.list().iter().map(|b| b.cost).collect()
    }

    #[tokio::test]
    async fn test_create_then_remove_releases_slot() {
        let store = MemoryStore::new();
        let mut bookings = BookingStore::load(&store).await.unwrap();

        let index = book(&store, &mut bookings, "2030-05-01 10:20", 12.0, 9).await;
        assert_eq!(index, 0);

        let fleet = load_fleet(&store).await.unwrap();
        assert_eq!(fleet.find("VOV-887").unwrap().bookings().count(), 1);

        let removed = bookings.remove(0).await.unwrap();
        assert_eq!(removed.taxi.rego, "VOV-887");
        assert!(bookings.is_empty());

        let reloaded = BookingStore::load(&store).await.unwrap();
        assert!(reloaded.list().is_empty());
        let fleet = load_fleet(&store).await.unwrap();
        assert_eq!(fleet, Fleet::default_roster());
    }

    #[tokio::test]
    async fn test_remove_out_of_range() {
        let store = MemoryStore::new();
        let mut bookings = BookingStore::load(&store).await.unwrap();

        assert!(matches!(bookings.remove(0).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reload_keeps_order_and_values() {
        let store = MemoryStore::new();
        let mut bookings = BookingStore::load(&store).await.unwrap();
        book(&store, &mut bookings, "2030-05-01 10:00", 30.5, 20).await;
        book(&store, &mut bookings, "2030-05-02 10:00", 12.25, 9).await;

        let reloaded = BookingStore::load(&store).await.unwrap();
        assert_eq!(reloaded.list(), bookings.list());
    }

    #[tokio::test]
    async fn test_malformed_bookings_load_empty() {
        let store = MemoryStore::new();
        store
            .set(BOOKINGS_KEY, "[{\"trip\": 3}]".to_string())
            .await
            .unwrap();

        let bookings = BookingStore::load(&store).await.unwrap();
        assert!(bookings.is_empty());
    }

    #[tokio::test]
    async fn test_partition_ignores_insertion_order() {
        let store = MemoryStore::new();
        let mut bookings = BookingStore::load(&store).await.unwrap();
        book(&store, &mut bookings, "2030-05-03 10:00", 10.0, 5).await;
        book(&store, &mut bookings, "2030-05-01 10:00", 11.0, 5).await;
        book(&store, &mut bookings, "2030-05-02 10:00", 12.0, 5).await;

        let now = at("2030-05-02 10:00");
        let partition = bookings.partition(now);

        let upcoming: Vec<usize> = partition.upcoming.iter().map(|(i, _)| *i).collect();
        let history: Vec<usize> = partition.history.iter().map(|(i, _)| *i).collect();
        assert_eq!(upcoming, vec![0]);
        // exactly `now` is not upcoming
        assert_eq!(history, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_cost_sort_alternates() {
        let store = MemoryStore::new();
        let mut bookings = BookingStore::load(&store).await.unwrap();
        book(&store, &mut bookings, "2030-05-01 10:00", 20.0, 5).await;
        book(&store, &mut bookings, "2030-05-01 13:00", 10.0, 5).await;
        book(&store, &mut bookings, "2030-05-01 16:00", 30.0, 5).await;
        let now = at("2030-04-01 09:00");

        let first = bookings
            .sort_by(SortKey::Cost, Scope::Upcoming, now)
            .await
            .unwrap();
        assert_eq!(first, SortDirection::Ascending);
        assert_eq!(costs(&bookings), vec![10.0, 20.0, 30.0]);

        let second = bookings
            .sort_by(SortKey::Cost, Scope::Upcoming, now)
            .await
            .unwrap();
        assert_eq!(second, SortDirection::Descending);
        assert_eq!(costs(&bookings), vec![30.0, 20.0, 10.0]);

        let reloaded = BookingStore::load(&store).await.unwrap();
        assert_eq!(costs(&reloaded), vec![30.0, 20.0, 10.0]);
    }

    #[tokio::test]
    async fn test_sort_puts_upcoming_first_and_leaves_other_scope() {
        let store = MemoryStore::new();
        let mut bookings = BookingStore::load(&store).await.unwrap();
        book(&store, &mut bookings, "2030-05-01 08:00", 5.0, 30).await;
        book(&store, &mut bookings, "2030-06-01 08:00", 7.0, 10).await;
        book(&store, &mut bookings, "2030-04-01 08:00", 6.0, 20).await;
        book(&store, &mut bookings, "2030-06-02 08:00", 8.0, 40).await;
        let now = at("2030-05-15 00:00");

        let direction = bookings
            .sort_by(SortKey::Duration, Scope::Upcoming, now)
            .await
            .unwrap();
        assert_eq!(direction, SortDirection::Ascending);

        let durations: Vec<u32> = bookings.list().iter().map(|b| b.duration).collect();
        // upcoming sorted, history kept in stored order behind it
        assert_eq!(durations, vec![10, 40, 30, 20]);
    }

    #[tokio::test]
    async fn test_reset_view_orders_by_date() {
        let store = MemoryStore::new();
        let mut bookings = BookingStore::load(&store).await.unwrap();
        book(&store, &mut bookings, "2030-04-01 08:00", 1.0, 5).await;
        book(&store, &mut bookings, "2030-06-02 08:00", 2.0, 5).await;
        book(&store, &mut bookings, "2030-05-01 08:00", 3.0, 5).await;
        book(&store, &mut bookings, "2030-06-01 08:00", 4.0, 5).await;
        let now = at("2030-05-15 00:00");

        bookings.reset_view(now).await.unwrap();
        // upcoming soonest first, history most recent first
        assert_eq!(costs(&bookings), vec![4.0, 2.0, 3.0, 1.0]);

        // a second view starts from the same defaults
        bookings.reset_view(now).await.unwrap();
        assert_eq!(costs(&bookings), vec![4.0, 2.0, 3.0, 1.0]);

        let direction = bookings
            .sort_by(SortKey::Date, Scope::Upcoming, now)
            .await
            .unwrap();
        assert_eq!(direction, SortDirection::Descending);
    }

    #[tokio::test]
    async fn test_remove_keeps_other_vehicle_slots() {
        let store = MemoryStore::new();
        let mut bookings = BookingStore::load(&store).await.unwrap();
        book(&store, &mut bookings, "2030-05-01 10:00", 1.0, 30).await;
        book(&store, &mut bookings, "2030-05-01 10:00", 1.0, 30).await;

        let fleet = load_fleet(&store).await.unwrap();
        assert_eq!(fleet.find("VOV-887").unwrap().bookings().count(), 1);
        assert_eq!(fleet.find("FWZ-490").unwrap().bookings().count(), 1);

        bookings.remove(1).await.unwrap();
        let fleet = load_fleet(&store).await.unwrap();
        assert_eq!(fleet.find("VOV-887").unwrap().bookings().count(), 1);
        assert_eq!(fleet.find("FWZ-490").unwrap().bookings().count(), 0);
        assert!(store.get(FLEET_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_without_matching_slot_leaves_fleet_unwritten() {
        let store = MemoryStore::new();
        let mut bookings = BookingStore::load(&store).await.unwrap();
        book(&store, &mut bookings, "2030-05-01 10:00", 1.0, 30).await;
        store.remove(FLEET_KEY).await.unwrap();

        let removed = bookings.remove(0).await.unwrap();
        assert_eq!(removed.taxi.rego, "VOV-887");
        assert!(bookings.is_empty());
        assert_eq!(store.get(FLEET_KEY).await.unwrap(), None);
    }
}
