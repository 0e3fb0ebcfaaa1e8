pub mod booking;
pub mod fare;
pub mod fleet;
pub mod trip;

pub use booking::{Booking, Scope, SortDirection, SortKey, SortState};
pub use fare::TaxiType;
pub use fleet::{BookedTimeSlot, Fleet, TaxiVehicle, VehicleRef};
pub use trip::{Route, Stop, Trip};
