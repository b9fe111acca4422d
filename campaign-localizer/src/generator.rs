use std::sync::Arc;

use common::error::AppError;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    image::ImageOracle,
    markets::{Market, MarketId},
    metrics::CampaignMetrics,
};

pub const INVALID_CAMPAIGN_REQUEST: &str =
    "Invalid request. Campaign, industry, and at least 2 markets required.";

const MIN_MARKETS: usize = 2;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignRequest {
    #[serde(default)]
    pub campaign: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub markets: Vec<String>,
}

impl CampaignRequest {
    /// Checks required fields and resolves market ids, keeping request order.
    pub fn validate(&self) -> Result<Vec<MarketId>, AppError> {
        if self.campaign.trim().is_empty()
            || self.industry.trim().is_empty()
            || self.markets.len() < MIN_MARKETS
        {
            return Err(AppError::Validation(INVALID_CAMPAIGN_REQUEST.to_string()));
        }
        self.markets.iter().map(|raw| raw.parse()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub market: String,
    pub culture: String,
    pub adaptations: Vec<String>,
    pub image_url: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignResponse {
    pub variations: Vec<Variation>,
    pub metrics: CampaignMetrics,
}

/// Produces one localized variation per requested market.
#[derive(Clone, Default)]
pub struct CampaignGenerator {
    images: Option<Arc<dyn ImageOracle>>,
}

impl CampaignGenerator {
    /// Without an image backend every variation gets a placeholder image.
    pub fn new(images: Option<Arc<dyn ImageOracle>>) -> Self {
        Self { images }
    }

    #[instrument(skip_all, fields(industry = %request.industry, markets = request.markets.len()))]
    pub async fn generate(&self, request: &CampaignRequest) -> Result<CampaignResponse, AppError> {
        let markets = request.validate()?;

        let variations = join_all(
            markets
                .iter()
                .map(|id| self.variation(*id, request.campaign.trim())),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>, AppError>>()?;

        info!(variations = variations.len(), "Generated campaign variations");

        Ok(CampaignResponse {
            metrics: CampaignMetrics::for_assets(markets.len()),
            variations,
        })
    }

    async fn variation(&self, id: MarketId, campaign: &str) -> Result<Variation, AppError> {
        let market: &Market = id.market();
        let prompt = market.prompt_for(campaign);

        let generated = match &self.images {
            Some(images) => match images.generate_image(&prompt).await {
                Ok(url) => url,
                Err(err) => {
                    warn!(market = %id, error = %err, "Image generation failed; using placeholder");
                    None
                }
            },
            None => None,
        };

        let image_url = match generated {
            Some(url) => url,
            None => market.placeholder_url()?,
        };

        Ok(Variation {
            market: market.name.to_string(),
            culture: market.culture.to_string(),
            adaptations: market.adaptations.iter().map(ToString::to_string).collect(),
            image_url,
            prompt,
        })
    }
}
