use crate::directory::Directory;
use crate::error::Result;
use crate::models::{ListingKey, User, UserKey};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on in-flight directory lookups per traversal hop.
const MAX_CONCURRENT_LOOKUPS: usize = 16;

/// Adjacency view of the upvote graph around one user, built per request.
#[derive(Debug, Clone, Default)]
pub struct UpvoteNeighborhood {
    /// Listings the requesting user upvoted.
    pub upvoted: HashSet<ListingKey>,
    /// Similar users mapped to the listings they upvoted. Users without any upvote are
    /// left out.
    pub similar_users: HashMap<UserKey, HashSet<ListingKey>>,
}

/// Two-hop traversal over the user/listing upvote relation:
/// user -> listings they upvoted -> other users who upvoted those listings.
///
/// Keys pointing at deleted entities are skipped; any other directory failure aborts
/// the traversal.
pub struct SocialGraphIndex {
    directory: Arc<dyn Directory>,
}

impl SocialGraphIndex {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    pub fn upvoted_listing_keys(user: &User) -> HashSet<ListingKey> {
        user.upvoted_listing_keys.clone()
    }

    /// Users sharing at least one upvoted listing with `user`, excluding `user`.
    pub async fn similar_users(&self, user: &User) -> Result<HashSet<UserKey>> {
        let upvoted = Self::upvoted_listing_keys(user);
        if upvoted.is_empty() {
            return Ok(HashSet::new());
        }

        let directory = &self.directory;
        let lookups: Vec<(ListingKey, Result<_>)> = stream::iter(upvoted)
            .map(|key| async move {
                let listing = directory.listing_by_key(&key).await;
                (key, listing)
            })
            .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await;

        let mut similar = HashSet::new();
        for (key, listing) in lookups {
            match listing? {
                Some(listing) => similar.extend(listing.upvoted_user_keys),
                None => {
                    warn!(user_key = %user.key, listing_key = %key, "Skipping deleted upvoted listing");
                }
            }
        }
        similar.remove(&user.key);

        debug!(
            user_key = %user.key,
            similar_users = similar.len(),
            "Resolved similar users"
        );

        Ok(similar)
    }

    /// Build the neighborhood used by the recommendation ranker.
    pub async fn neighborhood(&self, user: &User) -> Result<UpvoteNeighborhood> {
        let similar = self.similar_users(user).await?;

        let directory = &self.directory;
        let lookups: Vec<(UserKey, Result<_>)> = stream::iter(similar)
            .map(|key| async move {
                let similar_user = directory.user_by_key(&key).await;
                (key, similar_user)
            })
            .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await;

        let mut similar_users = HashMap::new();
        for (key, similar_user) in lookups {
            match similar_user? {
                Some(similar_user) => {
                    let upvoted = Self::upvoted_listing_keys(&similar_user);
                    if !upvoted.is_empty() {
                        similar_users.insert(key, upvoted);
                    }
                }
                None => {
                    warn!(user_key = %user.key, similar_user_key = %key, "Skipping deleted similar user");
                }
            }
        }

        Ok(UpvoteNeighborhood {
            upvoted: Self::upvoted_listing_keys(user),
            similar_users,
        })
    }
}
