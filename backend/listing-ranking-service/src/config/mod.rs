use crate::error::{RankingError, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub redis: RedisConfig,
    pub distance: DistanceConfig,
    pub ranking: RankingConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub http_port: u16,
    pub service_name: String,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct DistanceConfig {
    pub matrix_url: String,
    pub api_key: String,
    pub lookup_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Maximum number of candidates fetched per request.
    pub listing_limit: usize,
    /// Radius at or above which no distance limit applies.
    pub radius_unlimited_km: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            listing_limit: 50,
            radius_unlimited_km: 101.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            service: ServiceConfig {
                http_port: parse_var("HTTP_PORT", 8012)?,
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "listing-ranking-service".to_string()),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            distance: DistanceConfig {
                matrix_url: env::var("DISTANCE_MATRIX_URL").unwrap_or_else(|_| {
                    "https://maps.googleapis.com/maps/api/distancematrix/json".to_string()
                }),
                api_key: env::var("DISTANCE_MATRIX_API_KEY").unwrap_or_default(),
                lookup_timeout: Duration::from_millis(parse_var("DISTANCE_LOOKUP_TIMEOUT_MS", 3000)?),
            },
            ranking: RankingConfig {
                listing_limit: parse_var("LISTING_LIMIT", 50)?,
                radius_unlimited_km: parse_var("RADIUS_UNLIMITED_KM", 101.0)?,
            },
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RankingError::Config(format!("{} has an invalid value: '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_defaults_and_errors() {
        env::remove_var("LISTING_RANKING_TEST_UNSET");
        assert_eq!(parse_var("LISTING_RANKING_TEST_UNSET", 42u16).unwrap(), 42);

        env::set_var("LISTING_RANKING_TEST_PORT", " 9100 ");
        assert_eq!(parse_var("LISTING_RANKING_TEST_PORT", 0u16).unwrap(), 9100);

        env::set_var("LISTING_RANKING_TEST_BAD", "eighty");
        assert!(matches!(
            parse_var("LISTING_RANKING_TEST_BAD", 0u16),
            Err(RankingError::Config(_))
        ));
    }
}
