pub mod config;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use directory::{Directory, InMemoryDirectory, RedisDirectory};
pub use error::{RankingError, Result};
pub use services::{DistanceFilter, DistanceMatrixClient, RankingPipeline, RankingRequest, SortOrder};
