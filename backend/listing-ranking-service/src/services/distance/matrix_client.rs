// ============================================
// Distance Matrix Client
// ============================================
//
// Resolves driving distances from one origin to many destinations with a single
// Distance Matrix request. The response lists the resolved destination addresses
// next to one row of elements; element `i` is the distance to address `i`.

use super::{DistanceEntry, DistanceLookup};
use crate::error::{RankingError, Result};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

const STATUS_OK: &str = "OK";

pub struct DistanceMatrixClient {
    client: HttpClient,
    base_url: String,
    api_key: String,
}

impl DistanceMatrixClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RankingError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    destination_addresses: Vec<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    #[serde(default)]
    distance: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: f64,
}

/// Parse a Distance Matrix JSON body into one entry per resolvable destination.
///
/// `destination_addresses` follows request order, so each entry carries the position
/// of the destination it answers.
///
/// Destinations the service could not route (element status other than `OK`) are
/// left out. A failed top-level status or a row that does not line up with the
/// destination list is an `ExternalLookup` error.
pub fn parse_distance_matrix(body: &str) -> Result<Vec<DistanceEntry>> {
    let response: MatrixResponse = serde_json::from_str(body)
        .map_err(|e| RankingError::ExternalLookup(format!("Malformed distance matrix: {}", e)))?;

    if response.status != STATUS_OK {
        return Err(RankingError::ExternalLookup(format!(
            "Distance matrix status {}: {}",
            response.status,
            response.error_message.unwrap_or_default()
        )));
    }

    let elements = match response.rows.into_iter().next() {
        Some(row) => row.elements,
        None if response.destination_addresses.is_empty() => return Ok(Vec::new()),
        None => {
            return Err(RankingError::ExternalLookup(
                "Distance matrix returned no rows".to_string(),
            ))
        }
    };

    if elements.len() != response.destination_addresses.len() {
        return Err(RankingError::ExternalLookup(format!(
            "Distance matrix returned {} elements for {} destinations",
            elements.len(),
            response.destination_addresses.len()
        )));
    }

    Ok(response
        .destination_addresses
        .into_iter()
        .zip(elements)
        .enumerate()
        .filter_map(|(index, (address, element))| match (element.status.as_str(), element.distance) {
            (STATUS_OK, Some(distance)) => Some(DistanceEntry {
                destination_index: Some(index),
                address,
                meters: distance.value,
            }),
            _ => {
                debug!(address = %address, status = %element.status, "Destination not routable");
                None
            }
        })
        .collect())
}

#[async_trait]
impl DistanceLookup for DistanceMatrixClient {
    async fn batch_distances(
        &self,
        origin: &str,
        destinations: &[String],
    ) -> Result<Vec<DistanceEntry>> {
        if destinations.is_empty() {
            return Ok(Vec::new());
        }

        let joined = destinations.join("|");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("origins", origin),
                ("destinations", joined.as_str()),
                ("departure_time", "now"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RankingError::ExternalLookup(format!("Distance matrix request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Distance matrix request rejected");
            return Err(RankingError::ExternalLookup(format!(
                "HttpResponseCode: {}",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RankingError::ExternalLookup(format!("Distance matrix read failed: {}", e)))?;

        parse_distance_matrix(&body)
    }
}
