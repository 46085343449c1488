// ============================================
// Listing Ranking Pipeline
// ============================================
//
// Start -> PersonalizedSplit -> {RecencySort | DistanceReputationSort} -> Done
//
// Input is validated before any directory or distance I/O. A distance lookup failure
// aborts the whole call; the only tolerated partial failures are the dangling keys the
// social graph traversal skips.

use super::distance::{retain_within, DistanceFilter, Radius};
use super::filters::filter_by_keywords;
use super::recommendation::{RecommendationRanker, RecommendationSplit};
use super::scoring::{score_reputation, score_with_distance};
use super::social_graph::SocialGraphIndex;
use crate::config::RankingConfig;
use crate::directory::Directory;
use crate::error::{RankingError, Result};
use crate::models::{Listing, ListingKey, ListingType, User};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

pub const MAX_ORIGIN_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Recommended,
    Reputation,
    Recent,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Recommended => "recommended",
            SortOrder::Reputation => "reputation",
            SortOrder::Recent => "recent",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recommended" => Ok(SortOrder::Recommended),
            "reputation" => Ok(SortOrder::Reputation),
            "recent" => Ok(SortOrder::Recent),
            other => Err(RankingError::InvalidInput(format!(
                "'{}' is not a supported sort order",
                other
            ))),
        }
    }
}

/// A fully resolved ranking request. Absent values are `None`, never empty strings.
#[derive(Debug, Clone, Default)]
pub struct RankingRequest {
    pub sort: SortOrder,
    pub user_email: Option<String>,
    pub origin: Option<String>,
    pub radius_km: Option<f64>,
    /// Empty means every listing type.
    pub type_filters: Vec<ListingType>,
    pub keywords: Option<String>,
}

/// Trimmed origin, rejected when blank or longer than [`MAX_ORIGIN_LEN`] characters.
pub fn validate_origin(origin: Option<&str>) -> Result<Option<&str>> {
    let Some(origin) = origin else {
        return Ok(None);
    };

    let trimmed = origin.trim();
    if trimmed.is_empty() {
        return Err(RankingError::InvalidInput("location must not be blank".to_string()));
    }
    if trimmed.chars().count() > MAX_ORIGIN_LEN {
        return Err(RankingError::InvalidInput(format!(
            "location must be at most {} characters",
            MAX_ORIGIN_LEN
        )));
    }
    Ok(Some(trimmed))
}

pub struct RankingPipeline {
    directory: Arc<dyn Directory>,
    ranker: RecommendationRanker,
    distance_filter: DistanceFilter,
    config: RankingConfig,
}

impl RankingPipeline {
    pub fn new(
        directory: Arc<dyn Directory>,
        distance_filter: DistanceFilter,
        config: RankingConfig,
    ) -> Self {
        let ranker = RecommendationRanker::new(SocialGraphIndex::new(directory.clone()));
        Self {
            directory,
            ranker,
            distance_filter,
            config,
        }
    }

    /// Fetch, filter and order the candidate listings for one request.
    pub async fn rank(&self, request: &RankingRequest) -> Result<Vec<Listing>> {
        let origin = validate_origin(request.origin.as_deref())?;
        let radius = Radius::from_km(request.radius_km, self.config.radius_unlimited_km)?;

        let mut candidates = self
            .directory
            .candidate_listings(&request.type_filters, self.config.listing_limit)
            .await?;
        let fetched = candidates.len();

        if let Some(keywords) = request.keywords.as_deref() {
            candidates = filter_by_keywords(candidates, keywords);
        }

        debug!(
            sort = %request.sort,
            fetched,
            after_keywords = candidates.len(),
            "Candidates selected"
        );

        let ranked = match request.sort {
            SortOrder::Recommended => {
                let user = self.resolve_user(request.user_email.as_deref()).await?;
                self.rank_by_recommended(candidates, user.as_ref(), origin, request.radius_km)
                    .await?
            }
            SortOrder::Reputation => {
                let candidates = self.within_radius(candidates, origin, radius).await?;
                Self::rank_by_reputation(candidates)
            }
            SortOrder::Recent => {
                let candidates = self.within_radius(candidates, origin, radius).await?;
                Self::rank_by_recency(candidates)
            }
        };

        info!(
            sort = %request.sort,
            personalized = request.user_email.is_some(),
            located = origin.is_some(),
            returned = ranked.len(),
            "Ranking completed"
        );

        Ok(ranked)
    }

    /// Personalized prefix followed by the remaining candidates ordered by fused
    /// distance/reputation score, or by recency when no origin is given.
    ///
    /// With an origin, every candidate is measured with one batched lookup and
    /// candidates outside the radius are dropped before the personalized split.
    pub async fn rank_by_recommended(
        &self,
        candidates: Vec<Listing>,
        user: Option<&User>,
        origin: Option<&str>,
        radius_km: Option<f64>,
    ) -> Result<Vec<Listing>> {
        let origin = validate_origin(origin)?;
        let radius = Radius::from_km(radius_km, self.config.radius_unlimited_km)?;

        let (candidates, distances) = match origin {
            Some(origin) => {
                let measured = self.distance_filter.measure(candidates, origin).await?;
                let measured = retain_within(measured, radius);
                let distances: HashMap<ListingKey, Option<f64>> = measured
                    .iter()
                    .map(|(listing, meters)| (listing.key.clone(), *meters))
                    .collect();
                let candidates = measured.into_iter().map(|(listing, _)| listing).collect();
                (candidates, Some(distances))
            }
            None => (candidates, None),
        };

        let RecommendationSplit {
            mut recommended,
            remaining,
        } = match user {
            Some(user) => self.ranker.rank(candidates, user).await?,
            None => RecommendationSplit {
                recommended: Vec::new(),
                remaining: candidates,
            },
        };

        let remaining = match &distances {
            Some(distances) => {
                for listing in &mut recommended {
                    score_with_distance(listing, distances.get(&listing.key).copied().flatten());
                }
                Self::rank_by_distance_and_reputation(remaining, distances)
            }
            None => {
                recommended.iter_mut().for_each(score_reputation);
                Self::rank_by_recency(remaining)
            }
        };

        debug!(
            recommended = recommended.len(),
            remaining = remaining.len(),
            "Recommended ranking assembled"
        );

        recommended.extend(remaining);
        Ok(recommended)
    }

    /// Highest reputation first; equal scores keep candidate order.
    pub fn rank_by_reputation(mut candidates: Vec<Listing>) -> Vec<Listing> {
        candidates.iter_mut().for_each(score_reputation);
        candidates.sort_by_key(|listing| Reverse(listing.scores.reputation));
        candidates
    }

    /// Newest first; equal timestamps keep candidate order.
    pub fn rank_by_recency(mut candidates: Vec<Listing>) -> Vec<Listing> {
        candidates.iter_mut().for_each(score_reputation);
        candidates.sort_by_key(|listing| Reverse(listing.timestamp));
        candidates
    }

    fn rank_by_distance_and_reputation(
        mut candidates: Vec<Listing>,
        distances: &HashMap<ListingKey, Option<f64>>,
    ) -> Vec<Listing> {
        for listing in &mut candidates {
            let meters = distances.get(&listing.key).copied().flatten();
            score_with_distance(listing, meters);
        }
        candidates.sort_by_key(|listing| Reverse(listing.scores.fused.unwrap_or(0)));
        candidates
    }

    async fn within_radius(
        &self,
        candidates: Vec<Listing>,
        origin: Option<&str>,
        radius: Radius,
    ) -> Result<Vec<Listing>> {
        match origin {
            Some(origin) => self.distance_filter.filter(candidates, origin, radius).await,
            None => Ok(candidates),
        }
    }

    /// Unknown emails rank anonymously.
    async fn resolve_user(&self, email: Option<&str>) -> Result<Option<User>> {
        let Some(email) = email else {
            return Ok(None);
        };

        let user = self.directory.user_by_email(email).await?;
        if user.is_none() {
            debug!("No user registered for request email, ranking anonymously");
        }
        Ok(user)
    }
}
