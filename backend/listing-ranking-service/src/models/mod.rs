//! Listing marketplace entities.
//!
//! `Listing` and `User` are owned by the storage collaborator; the ranking core only
//! reads per-request snapshots of them.

mod listing;
mod user;

pub use listing::{Listing, ListingScores, ListingType};
pub use user::{User, Vote, VoteTransition};

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_key!(
    /// Opaque datastore key of a listing.
    ListingKey
);
string_key!(
    /// Opaque datastore key of a user account.
    UserKey
);

/// Serde adapter for key sets stored as a whitespace-delimited token list.
///
/// An account without votes is stored as `" "`, so a blank value is the empty set
/// rather than a single empty key. A missing or null property is also the empty set.
pub mod key_list {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::HashSet;
    use std::hash::Hash;

    /// Placeholder written for an empty set.
    pub const EMPTY: &str = " ";

    pub fn parse<K>(raw: &str) -> HashSet<K>
    where
        K: From<String> + Eq + Hash,
    {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return HashSet::new();
        }

        trimmed
            .split_whitespace()
            .map(|token| K::from(token.to_string()))
            .collect()
    }

    pub fn format<K>(keys: &HashSet<K>) -> String
    where
        K: AsRef<str>,
    {
        if keys.is_empty() {
            return EMPTY.to_string();
        }

        let mut tokens: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
        tokens.sort_unstable();
        tokens.join(" ")
    }

    pub fn serialize<S, K>(keys: &HashSet<K>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: AsRef<str>,
    {
        serializer.serialize_str(&format(keys))
    }

    pub fn deserialize<'de, D, K>(deserializer: D) -> Result<HashSet<K>, D::Error>
    where
        D: Deserializer<'de>,
        K: From<String> + Eq + Hash,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|value| parse(&value)).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_key_list() {
        let keys: HashSet<ListingKey> = key_list::parse(" aGVsbG8 d29ybGQ  ");
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&ListingKey::new("aGVsbG8")));
        assert!(keys.contains(&ListingKey::new("d29ybGQ")));
    }

    #[test]
    fn test_blank_key_list_is_empty() {
        let sentinel: HashSet<UserKey> = key_list::parse(key_list::EMPTY);
        let empty: HashSet<UserKey> = key_list::parse("");
        let tabs: HashSet<UserKey> = key_list::parse("\t \n");

        assert!(sentinel.is_empty());
        assert!(empty.is_empty());
        assert!(tabs.is_empty());
    }

    #[test]
    fn test_format_key_list() {
        let keys: HashSet<ListingKey> = ["b", "a", "c"].into_iter().map(ListingKey::from).collect();
        assert_eq!(key_list::format(&keys), "a b c");
        assert_eq!(key_list::format(&HashSet::<ListingKey>::new()), key_list::EMPTY);
    }
}
