/// Listing API Handlers
///
/// HTTP endpoint serving ranked listings for the marketplace feed
use actix_web::{get, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{info_span, Instrument};

use crate::error::{RankingError, Result};
use crate::middleware::correlation_id;
use crate::models::{Listing, ListingKey, ListingScores, ListingType};
use crate::services::filters::parse_type_filters;
use crate::services::pipeline::{RankingPipeline, RankingRequest, SortOrder};

/// Header carrying the authenticated email, set by the upstream identity provider.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

pub const MIN_RADIUS_KM: u32 = 10;
pub const MAX_RADIUS_KM: u32 = 101;
/// Radius used when a location is given without `radius-filter`.
pub const DEFAULT_RADIUS_KM: u32 = 10;

/// Query parameters for GET /api/v1/listings
#[derive(Debug, Default, Deserialize)]
pub struct ListingsQuery {
    /// `@`-delimited type codes, e.g. "1@3"
    #[serde(rename = "type-filters")]
    pub type_filters: Option<String>,
    pub keywords: Option<String>,
    /// "recommended" (default), "reputation" or "recent"
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub location: Option<String>,
    /// Radius in km, 10..=101; 101 means no limit
    #[serde(rename = "radius-filter")]
    pub radius_filter: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl ListingsQuery {
    pub fn into_request(self, user_email: Option<String>) -> Result<RankingRequest> {
        let sort = match non_empty(self.sort_by.as_deref()) {
            Some(raw) => raw.parse()?,
            None => SortOrder::default(),
        };

        let type_filters = match non_empty(self.type_filters.as_deref()) {
            Some(raw) => parse_type_filters(raw)?,
            None => Vec::new(),
        };

        let radius_km = match non_empty(self.radius_filter.as_deref()) {
            Some(raw) => parse_radius(raw)?,
            None => DEFAULT_RADIUS_KM,
        };

        Ok(RankingRequest {
            sort,
            user_email: non_empty(user_email.as_deref()).map(str::to_string),
            origin: non_empty(self.location.as_deref()).map(str::to_string),
            radius_km: Some(f64::from(radius_km)),
            type_filters,
            keywords: non_empty(self.keywords.as_deref()).map(str::to_string),
        })
    }
}

fn parse_radius(raw: &str) -> Result<u32> {
    let radius: u32 = raw
        .parse()
        .map_err(|_| RankingError::InvalidInput(format!("Could not convert to int: {}", raw)))?;

    if !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius) {
        return Err(RankingError::InvalidInput(format!(
            "radius-filter must be between {} and {}",
            MIN_RADIUS_KM, MAX_RADIUS_KM
        )));
    }
    Ok(radius)
}

/// Public view of a ranked listing with the scores it was ranked by.
///
/// The owner's email and the upvoter keys stay server-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView<'a> {
    pub key: &'a ListingKey,
    pub name: &'a str,
    pub description: &'a str,
    pub how_to_help: &'a str,
    pub location: &'a str,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub tags: &'a str,
    pub timestamp: i64,
    pub upvotes: u64,
    pub downvotes: u64,
    pub views: u64,
    pub image_url: Option<&'a str>,
    pub website_url: Option<&'a str>,
    pub scores: &'a ListingScores,
}

impl<'a> From<&'a Listing> for ListingView<'a> {
    fn from(listing: &'a Listing) -> Self {
        Self {
            key: &listing.key,
            name: &listing.name,
            description: &listing.description,
            how_to_help: &listing.how_to_help,
            location: &listing.location,
            listing_type: listing.listing_type,
            tags: &listing.tags,
            timestamp: listing.timestamp,
            upvotes: listing.upvotes,
            downvotes: listing.downvotes,
            views: listing.views,
            image_url: listing.image_url.as_deref(),
            website_url: listing.website_url.as_deref(),
            scores: &listing.scores,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListingsResponse<'a> {
    pub listings: Vec<ListingView<'a>>,
    pub count: usize,
}

/// GET /api/v1/listings
///
/// Candidate listings filtered by type, keywords and radius, in the requested order
#[get("/api/v1/listings")]
pub async fn get_listings(
    req: HttpRequest,
    query: web::Query<ListingsQuery>,
    pipeline: web::Data<RankingPipeline>,
) -> Result<HttpResponse> {
    let user_email = req
        .headers()
        .get(USER_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let request = query.into_inner().into_request(user_email)?;

    let span = info_span!(
        "get_listings",
        correlation_id = %correlation_id(&req),
        sort = %request.sort
    );
    let ranked = pipeline.rank(&request).instrument(span).await?;

    let listings: Vec<ListingView<'_>> = ranked.iter().map(ListingView::from).collect();

    Ok(HttpResponse::Ok().json(ListingsResponse {
        count: listings.len(),
        listings,
    }))
}

pub async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserKey;

    fn query(pairs: &[(&str, &str)]) -> ListingsQuery {
        let encoded: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        web::Query::<ListingsQuery>::from_query(&encoded.join("&"))
            .unwrap()
            .into_inner()
    }

    #[test]
    fn test_defaults() {
        let request = ListingsQuery::default().into_request(None).unwrap();
        assert_eq!(request.sort, SortOrder::Recommended);
        assert!(request.type_filters.is_empty());
        assert_eq!(request.origin, None);
        assert_eq!(request.radius_km, Some(10.0));
        assert_eq!(request.keywords, None);
    }

    #[test]
    fn test_legacy_parameter_names() {
        let request = query(&[
            ("type-filters", "1@2"),
            ("sortBy", "reputation"),
            ("location", "Chicago"),
            ("radius-filter", "101"),
            ("keywords", "food"),
        ])
        .into_request(Some("a@example.com".to_string()))
        .unwrap();

        assert_eq!(request.sort, SortOrder::Reputation);
        assert_eq!(
            request.type_filters,
            vec![ListingType::Fundraiser, ListingType::Petition]
        );
        assert_eq!(request.origin.as_deref(), Some("Chicago"));
        assert_eq!(request.radius_km, Some(101.0));
        assert_eq!(request.keywords.as_deref(), Some("food"));
        assert_eq!(request.user_email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_blank_values_are_absent() {
        let request = query(&[("location", ""), ("keywords", ""), ("sortBy", "")])
            .into_request(Some(" ".to_string()))
            .unwrap();

        assert_eq!(request.origin, None);
        assert_eq!(request.keywords, None);
        assert_eq!(request.user_email, None);
        assert_eq!(request.sort, SortOrder::Recommended);
    }

    #[test]
    fn test_radius_bounds() {
        for raw in ["9", "102", "ten", "-10"] {
            let result = query(&[("radius-filter", raw)]).into_request(None);
            assert!(matches!(result, Err(RankingError::InvalidInput(_))), "{}", raw);
        }
        assert!(query(&[("radius-filter", "10")]).into_request(None).is_ok());
    }

    #[test]
    fn test_listing_view_hides_owner_and_upvoters() {
        let mut listing = Listing::new("L1", "Food drive", "Austin, TX", ListingType::Event, 1_000);
        listing.owner = "owner@example.com".to_string();
        listing.upvoted_user_keys.insert(UserKey::from("U1"));
        listing.scores.reputation = 42;

        let json = serde_json::to_value(ListingView::from(&listing)).unwrap();

        assert!(json.get("owner").is_none());
        assert!(json.get("upvotedUserKeys").is_none());
        assert_eq!(json["key"], "L1");
        assert_eq!(json["type"], "event");
        assert_eq!(json["howToHelp"], "");
        assert_eq!(json["scores"]["reputation"], 42);
    }
}
