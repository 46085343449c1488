//! Travel-distance lookup and radius filtering.
//!
//! The external lookup is issued once per ranking request with every candidate address
//! in a single batch. Results are matched back to listings by their position in the
//! request when the lookup reports it, and by normalized address otherwise, since the
//! service may echo the destinations in a reformatted form.

mod matrix_client;

pub use matrix_client::{parse_distance_matrix, DistanceMatrixClient};

use crate::error::{RankingError, Result};
use crate::models::Listing;
use crate::utils::normalize_address;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Distance from the origin to one destination, as resolved by the lookup service.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceEntry {
    /// Position of the destination in the request, when the lookup reports it.
    pub destination_index: Option<usize>,
    /// Address as echoed back by the lookup.
    pub address: String,
    pub meters: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DistanceLookup: Send + Sync {
    async fn batch_distances(
        &self,
        origin: &str,
        destinations: &[String],
    ) -> Result<Vec<DistanceEntry>>;
}

/// Search radius around the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Radius {
    Unlimited,
    Km(f64),
}

impl Radius {
    /// Resolve a requested radius.
    ///
    /// `None` and every value at or above `unlimited_sentinel_km` mean no distance
    /// limit: with the default sentinel of 101, a request for 150 km is unlimited,
    /// not a 150 km cutoff. Negative and non-finite values are rejected.
    pub fn from_km(radius_km: Option<f64>, unlimited_sentinel_km: f64) -> Result<Self> {
        match radius_km {
            None => Ok(Radius::Unlimited),
            Some(km) if !km.is_finite() || km < 0.0 => Err(RankingError::InvalidRadius(km)),
            Some(km) if km >= unlimited_sentinel_km => Ok(Radius::Unlimited),
            Some(km) => Ok(Radius::Km(km)),
        }
    }

    /// Whether a listing at `distance_meters` falls inside the radius. A listing whose
    /// distance is unknown is only inside an unlimited radius.
    pub fn contains(&self, distance_meters: Option<f64>) -> bool {
        match self {
            Radius::Unlimited => true,
            Radius::Km(km) => distance_meters.map_or(false, |meters| meters <= km * 1_000.0),
        }
    }
}

/// A candidate paired with its travel distance from the origin, if one was resolved.
pub type MeasuredListing = (Listing, Option<f64>);

pub struct DistanceFilter {
    lookup: Arc<dyn DistanceLookup>,
    timeout: Duration,
}

impl DistanceFilter {
    pub fn new(lookup: Arc<dyn DistanceLookup>, timeout: Duration) -> Self {
        Self { lookup, timeout }
    }

    /// Resolve the distance of every candidate with one batched lookup.
    ///
    /// Fails with `ExternalLookup` when the lookup fails or exceeds the timeout.
    pub async fn measure(&self, candidates: Vec<Listing>, origin: &str) -> Result<Vec<MeasuredListing>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let destinations: Vec<String> = candidates
            .iter()
            .filter(|listing| seen.insert(listing.location.as_str()))
            .map(|listing| listing.location.clone())
            .collect();

        debug!(
            candidates = candidates.len(),
            destinations = destinations.len(),
            "Requesting batched distances"
        );

        let entries = match tokio::time::timeout(
            self.timeout,
            self.lookup.batch_distances(origin, &destinations),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(RankingError::ExternalLookup(format!(
                    "distance lookup timed out after {:?}",
                    self.timeout
                )))
            }
        };

        let mut by_destination: HashMap<&str, f64> = HashMap::with_capacity(entries.len());
        let mut by_address: HashMap<String, f64> = HashMap::new();
        for entry in &entries {
            match entry.destination_index.and_then(|i| destinations.get(i)) {
                Some(destination) => {
                    by_destination.insert(destination.as_str(), entry.meters);
                }
                None => {
                    by_address
                        .entry(normalize_address(&entry.address))
                        .or_insert(entry.meters);
                }
            }
        }

        let measured: Vec<MeasuredListing> = candidates
            .into_iter()
            .map(|listing| {
                let meters = by_destination
                    .get(listing.location.as_str())
                    .or_else(|| by_address.get(&normalize_address(&listing.location)))
                    .copied();
                (listing, meters)
            })
            .collect();

        let unmatched = measured.iter().filter(|(_, meters)| meters.is_none()).count();
        if unmatched > 0 {
            warn!(
                unmatched,
                total = measured.len(),
                "Some listing addresses were not resolved by the distance lookup"
            );
        }

        Ok(measured)
    }

    /// Candidates within `radius` of `origin`, in no particular order.
    ///
    /// An unlimited radius returns every candidate without calling the lookup.
    pub async fn filter(&self, candidates: Vec<Listing>, origin: &str, radius: Radius) -> Result<Vec<Listing>> {
        if radius == Radius::Unlimited {
            return Ok(candidates);
        }

        let measured = self.measure(candidates, origin).await?;
        Ok(retain_within(measured, radius)
            .into_iter()
            .map(|(listing, _)| listing)
            .collect())
    }
}

pub fn retain_within(measured: Vec<MeasuredListing>, radius: Radius) -> Vec<MeasuredListing> {
    measured
        .into_iter()
        .filter(|(_, meters)| radius.contains(*meters))
        .collect()
}
