use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use taxi_booking::{
    AppResult, AppState,
    handlers::{booking, fleet, location, quote},
    models::{
        Scope, SortKey, Stop, TaxiType,
        booking::format_schedule,
        fare::format_amount,
    },
    storage::KeyValueStore,
    utils::geo::Coordinate,
};

/// Book taxis, manage upcoming trips and review past ones
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct TaxiApp {
    #[command(subcommand)]
    pub op: TaxiOperation,
}

#[derive(Debug, Clone, Subcommand)]
pub enum TaxiOperation {
    /// price a trip without booking it
    Quote {
        #[command(flatten)]
        trip: TripArgs,
    },
    /// reserve a taxi for a trip
    Book {
        #[command(flatten)]
        trip: TripArgs,
    },
    /// upcoming and past bookings, each ordered by date
    List,
    /// show one booking in detail
    View {
        /// position of the booking in the stored list
        #[arg(required_unless_present = "last")]
        index: Option<usize>,

        /// show the booking viewed most recently
        #[arg(long, conflicts_with = "index")]
        last: bool,
    },
    /// cancel an upcoming booking and free its taxi
    Cancel { index: usize },
    /// move a booking onto a different taxi type
    ChangeTaxi {
        index: usize,
        taxi_type: TaxiType,
    },
    /// sort one list by a key; repeating the command flips the direction
    Sort { key: SortKey, scope: Scope },
    /// every vehicle and the slots it holds
    Fleet,
    /// look up addresses within the service region
    Search { query: String },
}

#[derive(Debug, Clone, clap::Args)]
pub struct TripArgs {
    /// a stop as <lng>,<lat>; repeat in travel order
    #[arg(short, long = "stop", required = true, allow_hyphen_values(true))]
    pub stops: Vec<Coordinate>,

    /// Sedan, SUV, Van or Minibus
    #[arg(short = 't', long, default_value = "Sedan")]
    pub taxi_type: TaxiType,

    /// pick-up time as "YYYY-MM-DD HH:MM"
    #[arg(long, value_parser = parse_time)]
    pub time: NaiveDateTime,

    /// hail the taxi from the street
    #[arg(short, long)]
    pub flagged: bool,
}

fn parse_time(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M")
        .map_err(|e| format!("invalid time '{}': {}", s, e))
}

impl TaxiOperation {
    pub async fn run<S: KeyValueStore>(
        &self,
        state: &AppState<S>,
        now: NaiveDateTime,
    ) -> AppResult<()> {
        match self {
            TaxiOperation::Quote { trip } => {
                let stops = resolve_stops(state, &trip.stops).await?;
                let response = quote::quote(&quote::QuoteRequest {
                    stops,
                    taxi_type: trip.taxi_type,
                    flagged: trip.flagged,
                    time: trip.time,
                })?;

                print_stops(&response.stops);
                println!("Taxi:      {}", response.taxi_type);
                println!("Distance:  {} km", format_amount(response.distance_km));
                println!("Duration:  {} min", response.duration_minutes);
                let rate = if response.night_rate { " (night rate)" } else { "" };
                println!("Fare:      ${}{}", format_amount(response.cost), rate);
            }
            TaxiOperation::Book { trip } => {
                let stops = resolve_stops(state, &trip.stops).await?;
                let request = booking::CreateBookingRequest {
                    stops,
                    taxi_type: trip.taxi_type,
                    flagged: trip.flagged,
                    time: trip.time,
                };
                let response = booking::create_booking(state, request, now).await?;
                println!("Booking confirmed");
                print_booking(&response);
            }
            TaxiOperation::List => {
                let list = booking::list_bookings(state, now).await?;
                print_section("Upcoming", &list.upcoming);
                print_section("History", &list.history);
            }
            TaxiOperation::View { index, last } => {
                let response = match index {
                    Some(index) if !last => booking::view_booking(state, *index, now).await?,
                    _ => booking::last_viewed(state).await?,
                };
                print_booking(&response);
            }
            TaxiOperation::Cancel { index } => {
                let response = booking::cancel_booking(state, *index, now).await?;
                println!(
                    "Cancelled the {} booking on {}",
                    response.taxi_type, response.scheduled
                );
            }
            TaxiOperation::ChangeTaxi { index, taxi_type } => {
                let response = booking::change_taxi_type(state, *index, *taxi_type, now).await?;
                println!("Taxi changed");
                print_booking(&response);
            }
            TaxiOperation::Sort { key, scope } => {
                let sorted = booking::sort_bookings(state, *key, *scope, now).await?;
                println!("Sorted {:?} by {:?}, {:?}", scope, key, sorted.direction);
                print_section("Upcoming", &sorted.bookings.upcoming);
                print_section("History", &sorted.bookings.history);
            }
            TaxiOperation::Fleet => {
                for vehicle in fleet::list_fleet(state).await? {
                    println!("{:<8} {:<8} {} booked", vehicle.rego, vehicle.taxi_type.as_str(), vehicle.slots.len());
                    for slot in vehicle.slots {
                        println!(
                            "    {} from {}h for {}h",
                            slot.date,
                            format_amount(slot.start_hour),
                            format_amount(slot.duration_hours)
                        );
                    }
                }
            }
            TaxiOperation::Search { query } => {
                for candidate in location::search_location(state, query).await? {
                    println!("{}  ({})", candidate.formatted, candidate.coordinate());
                }
            }
        }
        Ok(())
    }
}

async fn resolve_stops<S: KeyValueStore>(
    state: &AppState<S>,
    coordinates: &[Coordinate],
) -> AppResult<Vec<Stop>> {
    let mut stops = Vec::with_capacity(coordinates.len());
    for coordinate in coordinates {
        stops.push(location::resolve_stop(state, *coordinate).await?);
    }
    Ok(stops)
}

fn print_stops(stops: &[String]) {
    for (i, stop) in stops.iter().enumerate() {
        let label = match i {
            0 => "From".to_string(),
            i if i == stops.len() - 1 => "To".to_string(),
            i => format!("Stop {}", i),
        };
        println!("{:<10} {}", format!("{}:", label), stop);
    }
}

fn print_booking(response: &booking::BookingResponse) {
    println!("Booking #{}", response.index);
    println!("When:      {}", format_schedule(&response.time));
    print_stops(&response.stops);
    println!("Taxi:      {} ({})", response.taxi_type, response.rego);
    println!("Stops:     {}", response.stop_count);
    println!("Distance:  {} km", format_amount(response.distance_km));
    println!("Duration:  {} min", response.duration_minutes);
    println!("Flagged:   {}", if response.flagged { "yes" } else { "no" });
    println!("Fare:      ${}", format_amount(response.cost));
}

fn print_section(title: &str, bookings: &[booking::BookingResponse]) {
    println!("{} ({})", title, bookings.len());
    for b in bookings {
        let from = b.stops.first().map(String::as_str).unwrap_or("-");
        let to = b.stops.last().map(String::as_str).unwrap_or("-");
        println!(
            "  #{:<3} {:<22} {:<8} ${:>8}  {} min  {} -> {}",
            b.index,
            b.scheduled,
            b.taxi_type.as_str(),
            format_amount(b.cost),
            b.duration_minutes,
            from,
            to
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_book_command() {
        let app = TaxiApp::try_parse_from([
            "taxi-booking",
            "book",
            "--stop",
            "144.96,-37.81",
            "--stop",
            "145.13,-37.91",
            "-t",
            "suv",
            "--time",
            "2030-01-02 14:30",
            "--flagged",
        ])
        .unwrap();

        match app.op {
            TaxiOperation::Book { trip } => {
                assert_eq!(trip.stops.len(), 2);
                assert_eq!(trip.stops[1], Coordinate::new(145.13, -37.91));
                assert_eq!(trip.taxi_type, TaxiType::Suv);
                assert!(trip.flagged);
                assert_eq!(trip.time, parse_time("2030-01-02 14:30").unwrap());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_view_last() {
        let app = TaxiApp::try_parse_from(["taxi-booking", "view", "--last"]).unwrap();
        assert!(matches!(app.op, TaxiOperation::View { index: None, last: true }));

        assert!(TaxiApp::try_parse_from(["taxi-booking", "view"]).is_err());
    }

    #[test]
    fn test_parse_sort() {
        let app = TaxiApp::try_parse_from(["taxi-booking", "sort", "cost", "history"]).unwrap();
        assert!(matches!(
            app.op,
            TaxiOperation::Sort {
                key: SortKey::Cost,
                scope: Scope::History
            }
        ));
    }
}
