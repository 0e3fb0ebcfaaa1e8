use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::booking::{format_schedule, hour_of_day, validate_schedule};
use crate::models::fare::{compute_fare, estimate_duration_minutes};
use crate::models::{Booking, Scope, SortDirection, SortKey, Stop, TaxiType, Trip};
use crate::storage::{
    BookingStore, KeyValueStore, Selection, load_fleet, load_selection, save_fleet,
    save_selection,
};
use crate::utils::geo::Coordinate;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub stops: Vec<Stop>,
    pub taxi_type: TaxiType,
    pub flagged: bool,
    pub time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub index: usize,
    pub upcoming: bool,
    pub time: NaiveDateTime,
    pub scheduled: String,
    pub taxi_type: TaxiType,
    pub rego: String,
    pub stops: Vec<String>,
    pub waypoints: Vec<Coordinate>,
    pub stop_count: usize,
    pub distance_km: f64,
    pub flagged: bool,
    pub cost: f64,
    pub duration_minutes: u32,
}

impl BookingResponse {
    fn new(index: usize, booking: &Booking, upcoming: bool) -> Self {
        Self {
            index,
            upcoming,
            time: booking.time,
            scheduled: format_schedule(&booking.time),
            taxi_type: booking.taxi.taxi_type,
            rego: booking.taxi.rego.clone(),
            stops: booking
                .trip
                .formatted_stops()
                .into_iter()
                .map(String::from)
                .collect(),
            waypoints: booking.trip.waypoints(),
            stop_count: booking.stop_count,
            distance_km: booking.trip.total_distance(),
            flagged: booking.flagged,
            cost: booking.cost,
            duration_minutes: booking.duration,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct BookingList {
    pub upcoming: Vec<BookingResponse>,
    pub history: Vec<BookingResponse>,
}

#[derive(Debug, Serialize)]
pub struct SortedBookings {
    pub direction: SortDirection,
    pub bookings: BookingList,
}

fn booking_list<S: KeyValueStore + ?Sized>(
    bookings: &BookingStore<'_, S>,
    now: NaiveDateTime,
) -> BookingList {
    let partition = bookings.partition(now);
    BookingList {
        upcoming: partition
            .upcoming
            .into_iter()
            .map(|(i, b)| BookingResponse::new(i, b, true))
            .collect(),
        history: partition
            .history
            .into_iter()
            .map(|(i, b)| BookingResponse::new(i, b, false))
            .collect(),
    }
}

fn no_taxi_available(taxi_type: TaxiType) -> AppError {
    AppError::Conflict(format!(
        "There are no {}s available at this time",
        taxi_type
    ))
}

/// Reserve a taxi and record the booking
#[tracing::instrument(skip(state, request), fields(taxi_type = %request.taxi_type, time = %request.time))]
pub async fn create_booking<S: KeyValueStore>(
    state: &AppState<S>,
    request: CreateBookingRequest,
    now: NaiveDateTime,
) -> AppResult<BookingResponse> {
    if request.stops.len() < 2 {
        return Err(AppError::BadRequest(
            "A booking needs at least two stops".to_string(),
        ));
    }
    validate_schedule(request.time, now)?;

    let trip = Trip::from_stops(&request.stops);
    let distance_km = trip.total_distance();
    let duration = estimate_duration_minutes(distance_km);
    let hour = hour_of_day(&request.time);

    let mut fleet = load_fleet(&state.store).await?;
    let taxi = fleet
        .allocate(
            request.taxi_type,
            request.time.date(),
            hour,
            f64::from(duration) / 60.0,
        )
        .ok_or_else(|| no_taxi_available(request.taxi_type))?;
    save_fleet(&state.store, &fleet).await?;

    let cost = compute_fare(distance_km, request.taxi_type, request.flagged, hour);
    let booking = Booking::new(
        trip,
        taxi,
        request.time,
        request.flagged,
        request.stops.len(),
        cost,
        duration,
    );

    let mut bookings = BookingStore::load(&state.store).await?;
    let index = bookings.create(booking.clone()).await?;
    tracing::info!(index, rego = %booking.taxi.rego, cost, duration, "Booking created");

    Ok(BookingResponse::new(index, &booking, booking.is_upcoming(now)))
}

/// The list view: both partitions re-sorted by date with fresh sort directions
pub async fn list_bookings<S: KeyValueStore>(
    state: &AppState<S>,
    now: NaiveDateTime,
) -> AppResult<BookingList> {
    let mut bookings = BookingStore::load(&state.store).await?;
    bookings.reset_view(now).await?;
    Ok(booking_list(&bookings, now))
}

pub async fn sort_bookings<S: KeyValueStore>(
    state: &AppState<S>,
    key: SortKey,
    scope: Scope,
    now: NaiveDateTime,
) -> AppResult<SortedBookings> {
    let mut bookings = BookingStore::load(&state.store).await?;
    let direction = bookings.sort_by(key, scope, now).await?;
    Ok(SortedBookings {
        direction,
        bookings: booking_list(&bookings, now),
    })
}

/// Opens one booking and remembers it as the current selection
pub async fn view_booking<S: KeyValueStore>(
    state: &AppState<S>,
    index: usize,
    now: NaiveDateTime,
) -> AppResult<BookingResponse> {
    let bookings = BookingStore::load(&state.store).await?;
    let booking = bookings
        .get(index)
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", index)))?;

    let upcoming = booking.is_upcoming(now);
    save_selection(&state.store, Selection { index, upcoming }).await?;

    Ok(BookingResponse::new(index, booking, upcoming))
}

/// The booking most recently opened with [`view_booking`]
pub async fn last_viewed<S: KeyValueStore>(state: &AppState<S>) -> AppResult<BookingResponse> {
    let selection = load_selection(&state.store)
        .await?
        .ok_or_else(|| AppError::NotFound("No booking has been viewed".to_string()))?;

    let bookings = BookingStore::load(&state.store).await?;
    let booking = bookings.get(selection.index).ok_or_else(|| {
        AppError::NotFound(format!("Booking {} not found", selection.index))
    })?;

    Ok(BookingResponse::new(selection.index, booking, selection.upcoming))
}

/// Cancels an upcoming booking and frees its taxi
#[tracing::instrument(skip(state))]
pub async fn cancel_booking<S: KeyValueStore>(
    state: &AppState<S>,
    index: usize,
    now: NaiveDateTime,
) -> AppResult<BookingResponse> {
    let mut bookings = BookingStore::load(&state.store).await?;
    let booking = bookings
        .get(index)
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", index)))?;

    if !booking.is_upcoming(now) {
        return Err(AppError::Conflict(
            "Cannot cancel bookings that are in the past".to_string(),
        ));
    }

    let removed = bookings.remove(index).await?;
    tracing::info!(index, rego = %removed.taxi.rego, "Booking cancelled");

    Ok(BookingResponse::new(index, &removed, false))
}

/// Moves a booking onto a taxi of another type.
///
/// The replacement is appended at the end of the list with the same trip, time,
/// flag option, cost and duration.
#[tracing::instrument(skip(state))]
pub async fn change_taxi_type<S: KeyValueStore>(
    state: &AppState<S>,
    index: usize,
    taxi_type: TaxiType,
    now: NaiveDateTime,
) -> AppResult<BookingResponse> {
    let mut bookings = BookingStore::load(&state.store).await?;
    let current = bookings
        .get(index)
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", index)))?
        .clone();

    if current.taxi.taxi_type == taxi_type {
        return Err(AppError::BadRequest(format!(
            "Booking already uses a {}",
            taxi_type
        )));
    }

    let mut fleet = load_fleet(&state.store).await?;
    let taxi = fleet
        .allocate(
            taxi_type,
            current.date(),
            current.start_hour(),
            current.duration_hours(),
        )
        .ok_or_else(|| no_taxi_available(taxi_type))?;
    save_fleet(&state.store, &fleet).await?;

    bookings.remove(index).await?;

    let replacement = Booking::new(
        current.trip,
        taxi,
        current.time,
        current.flagged,
        current.stop_count,
        current.cost,
        current.duration,
    );
    let new_index = bookings.create(replacement.clone()).await?;

    let upcoming = replacement.is_upcoming(now);
    save_selection(
        &state.store,
        Selection {
            index: new_index,
            upcoming,
        },
    )
    .await?;
    tracing::info!(from = index, to = new_index, rego = %replacement.taxi.rego, "Taxi changed");

    Ok(BookingResponse::new(new_index, &replacement, upcoming))
}
