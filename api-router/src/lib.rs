use api_state::ApiState;
use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use routes::{campaign::generate_campaign, health::health, readiness::ready, search::search};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

pub mod api_state;
pub mod error;
pub mod query_handler;
mod routes;

/// Search, campaign and probe endpoints.
pub fn api_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        .route("/search", post(search))
        .route("/generate-campaign", post(generate_campaign))
        .route("/health", get(health))
        .route("/ready", get(ready))
}

/// Browser access for the configured origins. Unparseable origins are skipped.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(origin = %origin, error = %err, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// The full application: routes at the root and again under `/api`.
pub fn app_router(state: ApiState, allowed_origins: &[String]) -> Router {
    Router::new()
        .merge(api_routes::<ApiState>())
        .nest("/api", api_routes::<ApiState>())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}
