use super::{key_list, ListingKey, UserKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Fundraiser,
    Petition,
    Event,
    Other,
}

/// Legacy numeric codes used by the listing type filter.
const FILTER_CODES: [(&str, ListingType); 4] = [
    ("1", ListingType::Fundraiser),
    ("2", ListingType::Petition),
    ("3", ListingType::Event),
    ("4", ListingType::Other),
];

impl ListingType {
    pub const ALL: [ListingType; 4] = [
        ListingType::Fundraiser,
        ListingType::Petition,
        ListingType::Event,
        ListingType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Fundraiser => "fundraiser",
            ListingType::Petition => "petition",
            ListingType::Event => "event",
            ListingType::Other => "other",
        }
    }

    pub fn from_filter_code(code: &str) -> Option<Self> {
        FILTER_CODES
            .iter()
            .find(|(candidate, _)| *candidate == code)
            .map(|(_, listing_type)| *listing_type)
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores computed while ranking. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListingScores {
    pub reputation: u64,
    pub distance: Option<u64>,
    pub fused: Option<u64>,
}

/// A cause (fundraiser, petition, event) users can discover and vote on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub key: ListingKey,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub how_to_help: String,
    /// Free-text address.
    pub location: String,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    #[serde(default)]
    pub tags: String,
    /// Creation time, epoch millis.
    pub timestamp: i64,
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub downvotes: u64,
    #[serde(default)]
    pub views: u64,
    /// Email of the owning account.
    pub owner: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    /// Users who upvoted this listing.
    #[serde(default, with = "key_list")]
    pub upvoted_user_keys: HashSet<UserKey>,
    #[serde(skip)]
    pub scores: ListingScores,
}

impl Listing {
    pub fn new(
        key: impl Into<ListingKey>,
        name: impl Into<String>,
        location: impl Into<String>,
        listing_type: ListingType,
        timestamp: i64,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: String::new(),
            how_to_help: String::new(),
            location: location.into(),
            listing_type,
            tags: String::new(),
            timestamp,
            upvotes: 0,
            downvotes: 0,
            views: 0,
            owner: String::new(),
            image_url: None,
            website_url: None,
            upvoted_user_keys: HashSet::new(),
            scores: ListingScores::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_codes() {
        assert_eq!(ListingType::from_filter_code("1"), Some(ListingType::Fundraiser));
        assert_eq!(ListingType::from_filter_code("4"), Some(ListingType::Other));
        assert_eq!(ListingType::from_filter_code("5"), None);
        assert_eq!(ListingType::from_filter_code(""), None);
    }

    #[test]
    fn test_listing_round_trips_stored_form() {
        let raw = r#"{
            "key": "L1",
            "name": "Beach cleanup",
            "howToHelp": "Bring gloves",
            "location": "Santa Cruz, CA",
            "type": "event",
            "timestamp": 1596240000000,
            "upvotes": 3,
            "owner": "ana@example.com",
            "upvotedUserKeys": "U1 U2 U3"
        }"#;

        let listing: Listing = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.listing_type, ListingType::Event);
        assert_eq!(listing.downvotes, 0);
        assert_eq!(listing.upvoted_user_keys.len(), 3);
        assert_eq!(listing.scores, ListingScores::default());

        let stored = serde_json::to_value(&listing).unwrap();
        assert_eq!(stored["upvotedUserKeys"], "U1 U2 U3");
        assert!(stored.get("scores").is_none());
    }
}
