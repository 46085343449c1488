use actix_web::{web, App, HttpServer};
use anyhow::Context;
use listing_ranking_service::{
    handlers, middleware::CorrelationIdMiddleware, Config, DistanceFilter, DistanceMatrixClient,
    RankingPipeline, RedisDirectory,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("Failed to load config")?;

    info!(
        service = %config.service.service_name,
        http_port = config.service.http_port,
        listing_limit = config.ranking.listing_limit,
        "Starting listing ranking service"
    );

    let directory = RedisDirectory::connect(&config.redis.url)
        .await
        .context("Failed to connect to Redis")?;

    let distance_client = DistanceMatrixClient::new(
        &config.distance.matrix_url,
        &config.distance.api_key,
        config.distance.lookup_timeout,
    )
    .context("Failed to build distance matrix client")?;

    let pipeline = web::Data::new(RankingPipeline::new(
        Arc::new(directory),
        DistanceFilter::new(Arc::new(distance_client), config.distance.lookup_timeout),
        config.ranking.clone(),
    ));

    let addr = ("0.0.0.0", config.service.http_port);
    info!("HTTP server listening on {}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(CorrelationIdMiddleware)
            .app_data(pipeline.clone())
            .configure(handlers::configure)
    })
    .bind(addr)
    .with_context(|| format!("Failed to bind port {}", config.service.http_port))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
