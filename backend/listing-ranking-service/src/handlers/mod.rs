/// HTTP handlers for the listing ranking API
pub mod listings;

pub use listings::{get_listings, health};

use actix_web::web;

/// Register every route of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_listings)
        .route("/health", web::get().to(health));
}
