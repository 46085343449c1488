use super::social_graph::{SocialGraphIndex, UpvoteNeighborhood};
use crate::error::Result;
use crate::models::{Listing, ListingKey, User, UserKey};
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::info;

/// Candidates split into the personalized prefix and everything else.
#[derive(Debug, Default)]
pub struct RecommendationSplit {
    pub recommended: Vec<Listing>,
    pub remaining: Vec<Listing>,
}

/// Recommendation Ranker - user-based collaborative filtering over shared upvotes
///
/// Algorithm:
/// 1. Resolve similar users (users sharing an upvoted listing with the requester)
/// 2. Order them by shared upvotes with the requester, then by total upvotes
/// 3. Walk that order and pull each similar user's upvoted candidates into the
///    recommended list, skipping listings the requester already upvoted
///
/// A listing upvoted by several similar users is taken on its first encounter.
pub struct RecommendationRanker {
    graph: SocialGraphIndex,
}

impl RecommendationRanker {
    pub fn new(graph: SocialGraphIndex) -> Self {
        Self { graph }
    }

    pub async fn rank(&self, candidates: Vec<Listing>, user: &User) -> Result<RecommendationSplit> {
        let neighborhood = self.graph.neighborhood(user).await?;
        let split = split_recommended(candidates, &neighborhood);

        info!(
            user_key = %user.key,
            similar_users = neighborhood.similar_users.len(),
            recommended = split.recommended.len(),
            remaining = split.remaining.len(),
            "Recommendation split completed"
        );

        Ok(split)
    }
}

/// Number of listings both sets contain.
pub fn shared_upvotes(a: &HashSet<ListingKey>, b: &HashSet<ListingKey>) -> usize {
    let (smaller, larger) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    smaller.iter().filter(|key| larger.contains(*key)).count()
}

/// Similar users, most compatible first.
///
/// Ordered by shared upvotes with the requester (descending), then by the similar
/// user's total upvotes (descending), then by user key so the order is deterministic.
pub fn order_by_affinity(
    neighborhood: &UpvoteNeighborhood,
) -> Vec<(&UserKey, &HashSet<ListingKey>)> {
    let mut ordered: Vec<(usize, &UserKey, &HashSet<ListingKey>)> = neighborhood
        .similar_users
        .iter()
        .map(|(key, upvoted)| (shared_upvotes(upvoted, &neighborhood.upvoted), key, upvoted))
        .collect();

    ordered.sort_by_key(|(shared, key, upvoted)| (Reverse(*shared), Reverse(upvoted.len()), *key));

    ordered
        .into_iter()
        .map(|(_, key, upvoted)| (key, upvoted))
        .collect()
}

/// Move recommended candidates out of `candidates`, preserving candidate order within
/// each similar user's picks.
pub fn split_recommended(
    candidates: Vec<Listing>,
    neighborhood: &UpvoteNeighborhood,
) -> RecommendationSplit {
    let mut recommended = Vec::new();
    let mut remaining = candidates;

    for (_, upvoted) in order_by_affinity(neighborhood) {
        if remaining.is_empty() {
            break;
        }

        let (picked, rest): (Vec<Listing>, Vec<Listing>) =
            remaining.into_iter().partition(|listing| {
                upvoted.contains(&listing.key) && !neighborhood.upvoted.contains(&listing.key)
            });

        recommended.extend(picked);
        remaining = rest;
    }

    RecommendationSplit {
        recommended,
        remaining,
    }
}
