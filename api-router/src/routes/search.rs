use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::query::QUERY_REQUIRED;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::{api_state::ApiState, error::ApiError, query_handler::QueryOutcome};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub text: String,
}

pub async fn search(
    State(state): State<ApiState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let raw_query = match payload {
        Ok(Json(SearchRequest { query: Some(query) })) => query,
        Ok(_) => return Err(ApiError::ValidationError(QUERY_REQUIRED.to_string())),
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "Rejected search body");
            return Err(ApiError::ValidationError(QUERY_REQUIRED.to_string()));
        }
    };

    match state.handler.handle(&raw_query).await {
        Ok(QueryOutcome::Answered(answer)) => Ok(Json(vec![SearchHit {
            text: answer.into_string(),
        }])
        .into_response()),
        Ok(QueryOutcome::NoResults) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "message": "No results found",
                "query": raw_query.trim(),
            })),
        )
            .into_response()),
        Err(err) => Err(ApiError::from_app(err, "Search failed")),
    }
}
