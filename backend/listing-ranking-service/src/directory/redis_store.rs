use super::{select_candidates, Directory};
use crate::error::Result;
use crate::models::{Listing, ListingKey, ListingType, User, UserKey};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Redis key prefixes
const LISTING_KEY_PREFIX: &str = "listing:";
const USER_KEY_PREFIX: &str = "user:";
const USER_EMAIL_KEY_PREFIX: &str = "user:email:";
const ALL_LISTINGS_KEY: &str = "listings:all";

/// Directory over JSON entity blobs stored in Redis.
///
/// - `listing:{key}` / `user:{key}` -> serialized entity
/// - `user:email:{email}` -> user key
/// - `listings:all` -> set of every listing key
#[derive(Clone)]
pub struct RedisDirectory {
    conn: ConnectionManager,
}

impl RedisDirectory {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        Ok(raw.map(|value| serde_json::from_str(&value)).transpose()?)
    }
}

fn listing_redis_key(key: &ListingKey) -> String {
    format!("{}{}", LISTING_KEY_PREFIX, key)
}

fn user_redis_key(key: &UserKey) -> String {
    format!("{}{}", USER_KEY_PREFIX, key)
}

fn email_redis_key(email: &str) -> String {
    format!("{}{}", USER_EMAIL_KEY_PREFIX, email.to_lowercase())
}

#[async_trait]
impl Directory for RedisDirectory {
    async fn listing_by_key(&self, key: &ListingKey) -> Result<Option<Listing>> {
        self.get_json(&listing_redis_key(key)).await
    }

    async fn user_by_key(&self, key: &UserKey) -> Result<Option<User>> {
        self.get_json(&user_redis_key(key)).await
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = self.conn.clone();
        let user_key: Option<String> = conn.get(email_redis_key(email)).await?;

        match user_key {
            Some(user_key) => self.user_by_key(&UserKey::from(user_key)).await,
            None => Ok(None),
        }
    }

    async fn candidate_listings(
        &self,
        types: &[ListingType],
        limit: usize,
    ) -> Result<Vec<Listing>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.smembers(ALL_LISTINGS_KEY).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let redis_keys: Vec<String> = keys
            .iter()
            .map(|key| format!("{}{}", LISTING_KEY_PREFIX, key))
            .collect();

        let blobs: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&redis_keys)
            .query_async(&mut conn)
            .await?;

        let listings = blobs
            .into_iter()
            .zip(keys.iter())
            .filter_map(|(blob, key)| match blob {
                Some(raw) => match serde_json::from_str::<Listing>(&raw) {
                    Ok(listing) => Some(listing),
                    Err(e) => {
                        warn!(listing_key = %key, error = %e, "Skipping undecodable listing");
                        None
                    }
                },
                // Key still indexed but entity already deleted
                None => None,
            });

        let selected = select_candidates(listings, types, limit);
        debug!(
            indexed = keys.len(),
            selected = selected.len(),
            "Loaded candidate listings from Redis"
        );

        Ok(selected)
    }
}
