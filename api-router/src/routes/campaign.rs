use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use campaign_localizer::{generator::INVALID_CAMPAIGN_REQUEST, CampaignRequest};

use crate::{api_state::ApiState, error::ApiError};

pub async fn generate_campaign(
    State(state): State<ApiState>,
    payload: Result<Json<CampaignRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Ok(Json(request)) = payload else {
        return Err(ApiError::ValidationError(INVALID_CAMPAIGN_REQUEST.to_string()));
    };

    let response = state
        .campaigns
        .generate(&request)
        .await
        .map_err(|err| ApiError::from_app(err, "Failed to generate campaign variations"))?;

    Ok(Json(response))
}
