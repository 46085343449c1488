use crate::error::{RankingError, Result};
use crate::models::{Listing, ListingType};
use crate::utils::word_tokens;

const TYPE_FILTER_DELIMITER: char = '@';
/// Longest filter string: every code checked, `1@2@3@4`.
pub const TYPE_FILTER_MAX_LEN: usize = 7;

/// Parse an `@`-delimited list of legacy type codes.
///
/// Returns an empty list, meaning no type restriction, when nothing or everything is
/// checked.
pub fn parse_type_filters(raw: &str) -> Result<Vec<ListingType>> {
    let raw = raw.trim();
    if raw.len() > TYPE_FILTER_MAX_LEN {
        return Err(RankingError::InvalidInput(format!(
            "type-filters must be at most {} characters",
            TYPE_FILTER_MAX_LEN
        )));
    }

    let mut types = Vec::new();
    for code in raw.split(TYPE_FILTER_DELIMITER).filter(|code| !code.is_empty()) {
        let listing_type = ListingType::from_filter_code(code).ok_or_else(|| {
            RankingError::InvalidInput(format!("'{}' is not a listing type filter", code))
        })?;
        if !types.contains(&listing_type) {
            types.push(listing_type);
        }
    }

    if types.len() == ListingType::ALL.len() {
        types.clear();
    }
    Ok(types)
}

/// Keep listings whose tags or name share at least one word with `query`.
///
/// A query without any word keeps every listing.
pub fn filter_by_keywords(listings: Vec<Listing>, query: &str) -> Vec<Listing> {
    let keywords = word_tokens(query);
    if keywords.is_empty() {
        return listings;
    }

    listings
        .into_iter()
        .filter(|listing| {
            let mut words = word_tokens(&listing.tags);
            words.extend(word_tokens(&listing.name));
            !words.is_disjoint(&keywords)
        })
        .collect()
}
