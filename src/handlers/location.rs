use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::external::opencage::{self, Candidate, Region, filter_region};
use crate::models::Stop;
use crate::storage::KeyValueStore;
use crate::utils::geo::Coordinate;

/// Keeps the in-region candidates of a forward lookup
pub fn region_matches(candidates: Vec<Candidate>, region: &Region) -> AppResult<Vec<Candidate>> {
    if candidates.is_empty() {
        return Err(AppError::NotFound("No search results found".to_string()));
    }

    let matches = filter_region(candidates, region);
    if matches.is_empty() {
        return Err(AppError::BadRequest(format!(
            "No search results found in {}",
            region.state
        )));
    }
    Ok(matches)
}

/// Builds a stop from the first reverse lookup result when it lies in the region
pub fn stop_from_reverse(
    coordinate: Coordinate,
    candidates: &[Candidate],
    region: &Region,
) -> AppResult<Stop> {
    match candidates.first() {
        Some(candidate) if candidate.in_region(region) => {
            Ok(Stop::new(coordinate, candidate.formatted.clone()))
        }
        _ => Err(AppError::BadRequest(format!(
            "Addresses can only be in {}",
            region.state
        ))),
    }
}

#[tracing::instrument(skip(state))]
pub async fn search_location<S: KeyValueStore>(
    state: &AppState<S>,
    query: &str,
) -> AppResult<Vec<Candidate>> {
    let candidates = opencage::forward(&state.config, query).await?;
    region_matches(candidates, &Region::from_config(&state.config))
}

/// Turns a picked point into a stop with an address.
///
/// Without a geocoding key the stop is labelled with its coordinates.
#[tracing::instrument(skip(state))]
pub async fn resolve_stop<S: KeyValueStore>(
    state: &AppState<S>,
    coordinate: Coordinate,
) -> AppResult<Stop> {
    if state.config.geocode_api_key.is_none() {
        tracing::warn!(%coordinate, "GEOCODE_API_KEY not set, using coordinates as the address");
        return Ok(Stop::new(coordinate, coordinate.to_string()));
    }

    let candidates = opencage::reverse(&state.config, coordinate).await?;
    stop_from_reverse(coordinate, &candidates, &Region::from_config(&state.config))
}
