//! Storage collaborator consumed by the ranking core.
//!
//! Lookups by key return `Ok(None)` for entities that no longer exist; callers decide
//! whether a dangling reference is fatal. Connection and decoding failures are errors.

mod memory;
mod redis_store;

pub use memory::InMemoryDirectory;
pub use redis_store::RedisDirectory;

use crate::error::Result;
use crate::models::{Listing, ListingKey, ListingType, User, UserKey};
use async_trait::async_trait;

#[async_trait]
pub trait Directory: Send + Sync {
    async fn listing_by_key(&self, key: &ListingKey) -> Result<Option<Listing>>;

    async fn user_by_key(&self, key: &UserKey) -> Result<Option<User>>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Newest listings of the given types (all types when `types` is empty), at most `limit`.
    async fn candidate_listings(&self, types: &[ListingType], limit: usize)
        -> Result<Vec<Listing>>;
}

/// Keep listings whose type is in `types`, newest first, truncated to `limit`.
pub(crate) fn select_candidates(
    listings: impl IntoIterator<Item = Listing>,
    types: &[ListingType],
    limit: usize,
) -> Vec<Listing> {
    let mut selected: Vec<Listing> = listings
        .into_iter()
        .filter(|listing| types.is_empty() || types.contains(&listing.listing_type))
        .collect();

    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected.truncate(limit);
    selected
}
