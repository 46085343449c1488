// ============================================
// Listing Score Model
// ============================================
//
// Integer scores used by the ranking pipeline:
// - Reputation: upvote volume blended with upvote ratio
// - Distance: flat score inside the nearby radius, decaying beyond it
// - Fused: reputation-dominated weighted sum of the two
//
// All arithmetic is done on integers (percent weights) so that equal inputs always
// produce equal scores and sorts stay deterministic.

use crate::models::{Listing, ListingScores};

/// Reputation weights, in percent.
const UPVOTE_VOLUME_WEIGHT: u128 = 20;
const UPVOTE_RATIO_WEIGHT: u128 = 80;

/// Listings closer than this get the flat nearby score.
pub const NEARBY_RADIUS_METERS: u64 = 5_000;
const NEARBY_SCORE: u64 = 75;
/// Ceiling for listings without any reputation signal yet.
const UNPROVEN_SCORE_CEILING: u64 = 50;

/// Fusion weights, in percent.
const DISTANCE_WEIGHT: u64 = 15;
const REPUTATION_WEIGHT: u64 = 85;

/// `floor(upvotes * 0.20 + upvotes * upvote_ratio * 0.80)`; 0 without upvotes.
pub fn reputation_score(upvotes: u64, downvotes: u64) -> u64 {
    if upvotes == 0 {
        return 0;
    }

    let up = upvotes as u128;
    let total = up + downvotes as u128;
    let numerator = UPVOTE_VOLUME_WEIGHT * up * total + UPVOTE_RATIO_WEIGHT * up * up;

    (numerator / (100 * total)) as u64
}

/// Score for a travel distance in meters.
///
/// Within [`NEARBY_RADIUS_METERS`] the score is 75, or 50 when the listing has no
/// reputation yet. Farther away it drops by one point per 5 km (floored at 0) and never
/// exceeds the nearby score for the same reputation, so a closer listing never scores
/// below a farther one.
///
/// The ceiling also applies past the nearby radius. Without it, the far-distance formula
/// alone would give an unproven listing up to 74 just outside 5 km while the same
/// listing scores 50 inside it.
pub fn distance_score(distance_meters: f64, reputation: u64) -> u64 {
    let ceiling = if reputation == 0 {
        UNPROVEN_SCORE_CEILING
    } else {
        NEARBY_SCORE
    };

    let meters = whole_meters(distance_meters);
    if meters <= NEARBY_RADIUS_METERS {
        return ceiling;
    }

    NEARBY_SCORE
        .saturating_sub(meters / NEARBY_RADIUS_METERS)
        .min(ceiling)
}

/// `floor(distance * 0.15) + floor(reputation * 0.85)`
pub fn fused_score(distance: u64, reputation: u64) -> u64 {
    distance * DISTANCE_WEIGHT / 100 + reputation * REPUTATION_WEIGHT / 100
}

/// Attach reputation-only scores to a listing.
pub fn score_reputation(listing: &mut Listing) {
    listing.scores = ListingScores {
        reputation: reputation_score(listing.upvotes, listing.downvotes),
        distance: None,
        fused: None,
    };
}

/// Attach reputation, distance and fused scores to a listing.
///
/// An unknown distance scores 0, ranking the listing as if it were out of reach.
pub fn score_with_distance(listing: &mut Listing, distance_meters: Option<f64>) {
    let reputation = reputation_score(listing.upvotes, listing.downvotes);
    let distance = distance_meters
        .map(|meters| distance_score(meters, reputation))
        .unwrap_or(0);

    listing.scores = ListingScores {
        reputation,
        distance: Some(distance),
        fused: Some(fused_score(distance, reputation)),
    };
}

fn whole_meters(distance_meters: f64) -> u64 {
    if distance_meters.is_finite() && distance_meters > 0.0 {
        distance_meters.floor() as u64
    } else if distance_meters == f64::INFINITY {
        u64::MAX
    } else {
        0
    }
}
