pub mod generator;
pub mod image;
pub mod markets;
pub mod metrics;

pub use generator::{CampaignGenerator, CampaignRequest, CampaignResponse, Variation};
pub use image::{GeminiImageClient, ImageOracle};
pub use markets::{Market, MarketId};
pub use metrics::CampaignMetrics;
