use serde::{Deserialize, Serialize};

/// Average taxi speed in km per minute
pub const AVERAGE_SPEED_KM_PER_MIN: f64 = 0.83333;
pub const NIGHT_RATE_MULTIPLIER: f64 = 1.2;
/// Day rates apply from 9am up to, but not including, 5pm
pub const DAY_RATE_START_HOUR: f64 = 9.0;
pub const DAY_RATE_END_HOUR: f64 = 17.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxiType {
    Sedan,
    #[serde(rename = "SUV")]
    Suv,
    Van,
    Minibus,
}

impl TaxiType {
    pub const ALL: [TaxiType; 4] = [TaxiType::Sedan, TaxiType::Suv, TaxiType::Van, TaxiType::Minibus];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxiType::Sedan => "Sedan",
            TaxiType::Suv => "SUV",
            TaxiType::Van => "Van",
            TaxiType::Minibus => "Minibus",
        }
    }

    pub fn rate(&self) -> FareRate {
        match self {
            TaxiType::Sedan => FareRate::new(1.10),
            TaxiType::Suv => FareRate::new(4.60),
            TaxiType::Van => FareRate::new(7.10),
            TaxiType::Minibus => FareRate::new(11.10),
        }
    }
}

impl std::fmt::Display for TaxiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaxiType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaxiType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown taxi type '{}' (expected Sedan, SUV, Van or Minibus)", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FareRate {
    pub flag_fee: f64,
    pub per_km: f64,
    pub levy: f64,
}

impl FareRate {
    const FLAG_FEE: f64 = 4.20;
    const PER_KM: f64 = 1.622;

    fn new(levy: f64) -> Self {
        Self {
            flag_fee: Self::FLAG_FEE,
            per_km: Self::PER_KM,
            levy,
        }
    }
}

pub fn is_night_rate(hour: f64) -> bool {
    !(DAY_RATE_START_HOUR..DAY_RATE_END_HOUR).contains(&hour)
}

/// Full precision fare. Round only for display.
pub fn compute_fare(total_distance_km: f64, taxi_type: TaxiType, flagged: bool, hour: f64) -> f64 {
    let rate = taxi_type.rate();

    let mut cost = rate.per_km * total_distance_km + rate.levy;
    if flagged {
        cost += rate.flag_fee;
    }
    if is_night_rate(hour) {
        cost *= NIGHT_RATE_MULTIPLIER;
    }
    cost
}

/// Whole minutes, rounded up
pub fn estimate_duration_minutes(total_distance_km: f64) -> u32 {
    (total_distance_km / AVERAGE_SPEED_KM_PER_MIN).ceil() as u32
}

pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}
