//! Forward and reverse geocoding against the OpenCage API.
//!
//! Lookups are single shot: no retry and no client-side timeout beyond reqwest's defaults.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::utils::geo::Coordinate;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub formatted: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub components: Components,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Geometry {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Components {
    pub country: Option<String>,
    pub state: Option<String>,
}

/// Country and state a location must fall in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub country: String,
    pub state: String,
}

impl Region {
    pub fn from_config(config: &Config) -> Self {
        Self {
            country: config.allowed_country.clone(),
            state: config.allowed_state.clone(),
        }
    }
}

impl Candidate {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.geometry.lng, self.geometry.lat)
    }

    pub fn in_region(&self, region: &Region) -> bool {
        self.components.country.as_deref() == Some(region.country.as_str())
            && self.components.state.as_deref() == Some(region.state.as_str())
    }
}

#[derive(Clone, Debug, Deserialize)]
struct Response {
    #[serde(default)]
    results: Vec<Candidate>,
}

pub fn filter_region(candidates: Vec<Candidate>, region: &Region) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| c.in_region(region))
        .collect()
}

#[tracing::instrument(skip(config))]
pub async fn forward(config: &Config, query: &str) -> AppResult<Vec<Candidate>> {
    request(config, query).await
}

#[tracing::instrument(skip(config))]
pub async fn reverse(config: &Config, coordinate: Coordinate) -> AppResult<Vec<Candidate>> {
    let query = format!("{},{}", coordinate.lat, coordinate.lng);
    request(config, &query).await
}

async fn request(config: &Config, query: &str) -> AppResult<Vec<Candidate>> {
    let key = config
        .geocode_api_key
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("GEOCODE_API_KEY is not set".to_string()))?;
    let url = format!("https://{}/geocode/v1/json", config.geocode_api_base);

    let res = reqwest::Client::new()
        .get(url)
        .query(&[("q", query), ("key", key)])
        .send()
        .await?;

    let status_code = res.status().as_u16();

    if (400..500).contains(&status_code) {
        return Err(AppError::BadRequest(format!(
            "Geocoding rejected the request with status {}",
            status_code
        )));
    } else if status_code != 200 {
        return Err(AppError::Upstream(format!(
            "Geocoding failed with status {}",
            status_code
        )));
    }

    let data: Response = res.json().await?;
    tracing::debug!(results = data.results.len(), "Geocoding response");

    Ok(data.results)
}
