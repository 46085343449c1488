use super::{key_list, Listing, ListingKey, UserKey};
use crate::error::RankingError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub key: UserKey,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, with = "key_list")]
    pub created_listing_keys: HashSet<ListingKey>,
    #[serde(default, with = "key_list")]
    pub upvoted_listing_keys: HashSet<ListingKey>,
    #[serde(default, with = "key_list")]
    pub downvoted_listing_keys: HashSet<ListingKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Upvote,
    Downvote,
    Neutral,
}

impl FromStr for Vote {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" => Ok(Vote::Upvote),
            "downvote" => Ok(Vote::Downvote),
            "neutral" => Ok(Vote::Neutral),
            other => Err(RankingError::InvalidInput(format!(
                "'{}' is an invalid vote type",
                other
            ))),
        }
    }
}

/// Outcome of applying a vote to a user/listing pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    Unchanged,
    Added(Vote),
    Switched { from: Vote, to: Vote },
    Cleared(Vote),
}

impl User {
    pub fn new(key: impl Into<UserKey>, email: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            email: email.into(),
            username: String::new(),
            bio: String::new(),
            created_listing_keys: HashSet::new(),
            upvoted_listing_keys: HashSet::new(),
            downvoted_listing_keys: HashSet::new(),
        }
    }

    pub fn current_vote(&self, listing_key: &ListingKey) -> Vote {
        if self.upvoted_listing_keys.contains(listing_key) {
            Vote::Upvote
        } else if self.downvoted_listing_keys.contains(listing_key) {
            Vote::Downvote
        } else {
            Vote::Neutral
        }
    }

    /// Apply `vote` to `listing`, keeping the user's vote sets, the listing's counters
    /// and the listing's upvoter set consistent.
    ///
    /// Upvote and downvote are exclusive: switching removes the previous vote first.
    /// Casting the vote the user already holds changes nothing.
    pub fn apply_vote(&mut self, listing: &mut Listing, vote: Vote) -> VoteTransition {
        let current = self.current_vote(&listing.key);
        if current == vote {
            return VoteTransition::Unchanged;
        }

        match current {
            Vote::Upvote => {
                self.upvoted_listing_keys.remove(&listing.key);
                listing.upvoted_user_keys.remove(&self.key);
                listing.upvotes = listing.upvotes.saturating_sub(1);
            }
            Vote::Downvote => {
                self.downvoted_listing_keys.remove(&listing.key);
                listing.downvotes = listing.downvotes.saturating_sub(1);
            }
            Vote::Neutral => {}
        }

        match vote {
            Vote::Upvote => {
                self.upvoted_listing_keys.insert(listing.key.clone());
                listing.upvoted_user_keys.insert(self.key.clone());
                listing.upvotes += 1;
            }
            Vote::Downvote => {
                self.downvoted_listing_keys.insert(listing.key.clone());
                listing.downvotes += 1;
            }
            Vote::Neutral => {}
        }

        match (current, vote) {
            (Vote::Neutral, to) => VoteTransition::Added(to),
            (from, Vote::Neutral) => VoteTransition::Cleared(from),
            (from, to) => VoteTransition::Switched { from, to },
        }
    }
}
