use super::{select_candidates, Directory};
use crate::error::{RankingError, Result};
use crate::models::{Listing, ListingKey, ListingType, User, UserKey, Vote, VoteTransition};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Entities {
    listings: HashMap<ListingKey, Listing>,
    users: HashMap<UserKey, User>,
}

/// Directory backed by process memory. Used for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    entities: RwLock<Entities>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, listing: Listing) -> Self {
        self.entities
            .get_mut()
            .listings
            .insert(listing.key.clone(), listing);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.entities.get_mut().users.insert(user.key.clone(), user);
        self
    }

    /// Apply a vote to both sides of the user/listing relation.
    pub fn record_vote(
        &mut self,
        user_key: &UserKey,
        listing_key: &ListingKey,
        vote: Vote,
    ) -> Result<VoteTransition> {
        let entities = self.entities.get_mut();
        let user = entities
            .users
            .get_mut(user_key)
            .ok_or_else(|| RankingError::InvalidInput(format!("unknown user {}", user_key)))?;
        let listing = entities.listings.get_mut(listing_key).ok_or_else(|| {
            RankingError::InvalidInput(format!("unknown listing {}", listing_key))
        })?;

        Ok(user.apply_vote(listing, vote))
    }

    pub async fn remove_listing(&self, key: &ListingKey) -> Option<Listing> {
        self.entities.write().await.listings.remove(key)
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn listing_by_key(&self, key: &ListingKey) -> Result<Option<Listing>> {
        Ok(self.entities.read().await.listings.get(key).cloned())
    }

    async fn user_by_key(&self, key: &UserKey) -> Result<Option<User>> {
        Ok(self.entities.read().await.users.get(key).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let entities = self.entities.read().await;
        Ok(entities
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn candidate_listings(
        &self,
        types: &[ListingType],
        limit: usize,
    ) -> Result<Vec<Listing>> {
        let entities = self.entities.read().await;
        Ok(select_candidates(
            entities.listings.values().cloned(),
            types,
            limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_user(User::new("U1", "ana@example.com"))
            .with_listing(Listing::new("L1", "Shelter", "Denver, CO", ListingType::Fundraiser, 100))
            .with_listing(Listing::new("L2", "Petition", "Boulder, CO", ListingType::Petition, 300))
            .with_listing(Listing::new("L3", "Meetup", "Golden, CO", ListingType::Event, 200))
    }

    #[tokio::test]
    async fn test_record_vote_updates_both_sides() {
        let mut directory = directory();
        let transition = directory
            .record_vote(&UserKey::from("U1"), &ListingKey::from("L1"), Vote::Upvote)
            .unwrap();
        assert_eq!(transition, VoteTransition::Added(Vote::Upvote));

        let user = directory.user_by_key(&UserKey::from("U1")).await.unwrap().unwrap();
        let listing = directory
            .listing_by_key(&ListingKey::from("L1"))
            .await
            .unwrap()
            .unwrap();
        assert!(user.upvoted_listing_keys.contains(&listing.key));
        assert!(listing.upvoted_user_keys.contains(&user.key));
        assert_eq!(listing.upvotes, 1);
    }

    #[tokio::test]
    async fn test_record_vote_unknown_listing() {
        let mut directory = directory();
        let result = directory.record_vote(&UserKey::from("U1"), &ListingKey::from("L9"), Vote::Upvote);
        assert!(matches!(result, Err(RankingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_user_by_email_ignores_case() {
        let directory = directory();
        let user = directory.user_by_email("ANA@example.com").await.unwrap();
        assert_eq!(user.map(|u| u.key), Some(UserKey::from("U1")));
        assert!(directory.user_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_candidate_listings_newest_first() {
        let directory = directory();

        let all = directory.candidate_listings(&[], 50).await.unwrap();
        let keys: Vec<&str> = all.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, vec!["L2", "L3", "L1"]);

        let limited = directory.candidate_listings(&[], 2).await.unwrap();
        assert_eq!(limited.len(), 2);

        let events = directory
            .candidate_listings(&[ListingType::Event, ListingType::Fundraiser], 50)
            .await
            .unwrap();
        let keys: Vec<&str> = events.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, vec!["L3", "L1"]);
    }

    #[tokio::test]
    async fn test_removed_listing_is_not_found() {
        let directory = directory();
        assert!(directory.remove_listing(&ListingKey::from("L1")).await.is_some());
        assert!(directory
            .listing_by_key(&ListingKey::from("L1"))
            .await
            .unwrap()
            .is_none());
    }
}
