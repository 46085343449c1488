pub mod distance;
pub mod filters;
pub mod pipeline;
pub mod recommendation;
pub mod scoring;
pub mod social_graph;

pub use distance::{DistanceFilter, DistanceLookup, DistanceMatrixClient, Radius};
pub use pipeline::{RankingPipeline, RankingRequest, SortOrder};
pub use recommendation::{RecommendationRanker, RecommendationSplit};
pub use social_graph::{SocialGraphIndex, UpvoteNeighborhood};
