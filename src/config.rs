use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub geocode_api_base: String,
    pub geocode_api_key: Option<String>,
    pub allowed_country: String,
    pub allowed_state: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            geocode_api_base: env::var("GEOCODE_API_BASE").unwrap_or(defaults.geocode_api_base),
            geocode_api_key: env::var("GEOCODE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            allowed_country: env::var("ALLOWED_COUNTRY").unwrap_or(defaults.allowed_country),
            allowed_state: env::var("ALLOWED_STATE").unwrap_or(defaults.allowed_state),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://taxi_booking.db?mode=rwc".to_string(),
            geocode_api_base: "api.opencagedata.com".to_string(),
            geocode_api_key: None,
            allowed_country: "Australia".to_string(),
            allowed_state: "Victoria".to_string(),
        }
    }
}
