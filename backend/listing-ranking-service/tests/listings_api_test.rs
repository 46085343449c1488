use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use listing_ranking_service::config::RankingConfig;
use listing_ranking_service::handlers;
use listing_ranking_service::middleware::{CorrelationIdMiddleware, CORRELATION_HEADER};
use listing_ranking_service::models::{Listing, ListingKey, ListingType, User, UserKey, Vote};
use listing_ranking_service::services::distance::{DistanceEntry, DistanceLookup};
use listing_ranking_service::{
    DistanceFilter, InMemoryDirectory, RankingError, RankingPipeline, Result,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

struct UnavailableLookup;

#[async_trait]
impl DistanceLookup for UnavailableLookup {
    async fn batch_distances(&self, _: &str, _: &[String]) -> Result<Vec<DistanceEntry>> {
        Err(RankingError::ExternalLookup("HttpResponseCode: 503".to_string()))
    }
}

fn pipeline() -> web::Data<RankingPipeline> {
    let mut tree_planting = Listing::new("L1", "Tree planting", "Denver, CO", ListingType::Event, 1);
    tree_planting.owner = "owner@example.com".to_string();

    let mut directory = InMemoryDirectory::new()
        .with_user(User::new("A", "a@example.com"))
        .with_user(User::new("B", "b@example.com"))
        .with_listing(tree_planting)
        .with_listing(Listing::new("L3", "River cleanup", "Golden, CO", ListingType::Event, 2))
        .with_listing(Listing::new("L4", "Book drive", "Aurora, CO", ListingType::Event, 3))
        .with_listing(Listing::new("P1", "Save the park", "Denver, CO", ListingType::Petition, 4));

    for (user, listing) in [("A", "L1"), ("B", "L1"), ("B", "L3")] {
        directory
            .record_vote(&UserKey::from(user), &ListingKey::from(listing), Vote::Upvote)
            .unwrap();
    }

    web::Data::new(RankingPipeline::new(
        Arc::new(directory),
        DistanceFilter::new(Arc::new(UnavailableLookup), Duration::from_millis(100)),
        RankingConfig::default(),
    ))
}

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .wrap(CorrelationIdMiddleware)
                .app_data(pipeline())
                .configure(handlers::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health() {
    let app = app!();
    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(test::read_body(res).await, "ok");
}

#[actix_web::test]
async fn test_personalized_listings() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/v1/listings?type-filters=3&sortBy=recommended")
        .insert_header(("x-user-email", "a@example.com"))
        .insert_header((CORRELATION_HEADER, "corr-42"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(CORRELATION_HEADER).unwrap(), "corr-42");

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["count"], 3);
    let keys: Vec<&str> = body["listings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["L3", "L4", "L1"]);
    assert_eq!(body["listings"][2]["scores"]["reputation"], 2);
    assert_eq!(body["listings"][0]["type"], "event");
}

#[actix_web::test]
async fn test_listings_hide_owner_and_upvoters() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/v1/listings?sortBy=reputation")
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    let listings = body["listings"].as_array().unwrap();
    assert_eq!(listings.len(), 4);
    for listing in listings {
        assert!(listing.get("owner").is_none(), "{}", listing);
        assert!(listing.get("upvotedUserKeys").is_none(), "{}", listing);
    }
    assert_eq!(listings[0]["key"], "L1");
    assert_eq!(listings[0]["upvotes"], 2);
}

#[actix_web::test]
async fn test_radius_out_of_range_is_bad_request() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/v1/listings?location=Denver&radius-filter=5")
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers().contains_key(CORRELATION_HEADER));
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], 400);
}

#[actix_web::test]
async fn test_unknown_type_filter_is_bad_request() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/v1/listings?type-filters=7")
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_distance_outage_is_bad_gateway() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/v1/listings?location=Denver%2C%20CO&radius-filter=25")
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], 502);
    assert!(body["error"].as_str().unwrap().contains("503"));
}
