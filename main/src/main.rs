use std::{sync::Arc, time::Duration};

use api_router::{api_state::ApiState, app_router, query_handler::QueryHandler};
use campaign_localizer::{CampaignGenerator, GeminiImageClient, ImageOracle};
use common::{
    storage::{
        db::{sanitize_address, SurrealDbClient},
        indexes::{ensure_content_indexes, ContentIndexSpec},
        store::{ContentStore, SurrealContentStore},
    },
    utils::{
        config::{get_config, AppConfig},
        embedding::{EmbeddingOracle, EmbeddingProvider},
        llm::{GenerationOracle, OpenAiGenerator},
    },
};
use retrieval_pipeline::{RetrievalConfig, RetrievalEngine};
use synthesis_pipeline::{ResponseSynthesizer, SynthesisConfig};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedding_provider = EmbeddingProvider::from_config(&config, Arc::clone(&openai_client));
    info!(
        embedding_backend = embedding_provider.backend_label(),
        embedding_dimension = ?embedding_provider.dimension(),
        "Embedding provider initialized"
    );

    if config.ensure_indexes {
        let db = SurrealDbClient::from_params(&config.surreal_params()).await?;
        ensure_content_indexes(
            &db,
            ContentIndexSpec {
                table: &config.content_table,
                vector_index: &config.vector_index,
                dimension: embedding_provider
                    .dimension()
                    .unwrap_or_else(|| config.embedding_dimension_or_default()),
            },
        )
        .await?;
        db.invalidate().await?;
    }

    let store: Arc<dyn ContentStore> = Arc::new(SurrealContentStore::remote(
        config.surreal_params(),
        config.content_table.clone(),
    ));
    info!(
        address = %sanitize_address(&config.surrealdb_address),
        table = %config.content_table,
        "Content store configured"
    );

    let generator: Arc<dyn GenerationOracle> = Arc::new(OpenAiGenerator::new(
        openai_client,
        config.generation_model.clone(),
    ));

    let campaigns = campaign_generator(&config)?;

    let api_state = build_state(
        &config,
        store,
        Arc::new(embedding_provider),
        generator,
        campaigns,
    );

    // Create Axum router
    let app = app_router(api_state, &config.allowed_origins);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }

    Ok(())
}

fn campaign_generator(config: &AppConfig) -> Result<CampaignGenerator, Box<dyn std::error::Error>> {
    let images: Option<Arc<dyn ImageOracle>> = match &config.image_api_key {
        Some(key) if !key.trim().is_empty() => {
            info!(model = %config.image_model, "Image generation enabled");
            Some(Arc::new(GeminiImageClient::new(
                key.trim(),
                config.image_model.clone(),
                Duration::from_secs(config.oracle_timeout_secs),
            )?))
        }
        _ => {
            info!("No image API key configured; campaigns use placeholder images");
            None
        }
    };
    Ok(CampaignGenerator::new(images))
}

fn build_state(
    config: &AppConfig,
    store: Arc<dyn ContentStore>,
    embedder: Arc<dyn EmbeddingOracle>,
    generator: Arc<dyn GenerationOracle>,
    campaigns: CampaignGenerator,
) -> ApiState {
    let retrieval = RetrievalEngine::new(
        Arc::clone(&store),
        embedder,
        RetrievalConfig::from_app_config(config),
    );
    let synthesis = ResponseSynthesizer::new(generator, SynthesisConfig::from_app_config(config));

    ApiState::new(
        QueryHandler::new(retrieval, synthesis),
        store,
        Duration::from_secs(config.store_timeout_secs),
        campaigns,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use common::{
        storage::types::content_document::ContentDocument, testing::ScriptedGenerator,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn smoke_startup_with_in_memory_surrealdb() {
        let config = AppConfig {
            embedding_backend: common::utils::config::EmbeddingBackend::Hashed,
            embedding_dimensions: Some(8),
            ..AppConfig::default()
        };

        let db = SurrealDbClient::memory("test_ns", &format!("test_db_{}", Uuid::new_v4()))
            .await
            .expect("failed to start in-memory surrealdb");
        db.store_item(ContentDocument::new(
            "Keynote on distributed systems.".into(),
            None,
        ))
        .await
        .expect("failed to seed document");

        let store: Arc<dyn ContentStore> =
            Arc::new(SurrealContentStore::shared(db, config.content_table.clone()));
        let embedder = Arc::new(EmbeddingProvider::new_hashed(
            config.embedding_dimension_or_default(),
        ));

        let state = build_state(
            &config,
            store,
            embedder,
            Arc::new(ScriptedGenerator::echoing()),
            campaign_generator(&config).expect("campaign generator"),
        );
        let app = app_router(state, &config.allowed_origins);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let ready_response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/ready")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("ready response");
        assert_eq!(ready_response.status(), StatusCode::OK);

        let search_response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/search")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query":"tell me about distributed systems"}"#))
                    .expect("request"),
            )
            .await
            .expect("search response");
        assert_eq!(search_response.status(), StatusCode::OK);
        let body = to_bytes(search_response.into_body(), usize::MAX)
            .await
            .expect("search body");
        assert_eq!(&body[..], br#"[{"text":"reply 3"}]"#);
    }
}
