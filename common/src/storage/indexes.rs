use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::{error::AppError, storage::db::SurrealDbClient};

const FTS_ANALYZER_NAME: &str = "content_en_fts_analyzer";

/// Names the indexes a content table needs for the retrieval cascade.
#[derive(Debug, Clone, Copy)]
pub struct ContentIndexSpec<'a> {
    pub table: &'a str,
    pub vector_index: &'a str,
    pub dimension: usize,
}

impl ContentIndexSpec<'_> {
    fn fts_index_name(&self) -> String {
        format!("{}_text_fts_idx", self.table)
    }

    fn hnsw_definition(&self) -> String {
        format!(
            "DEFINE INDEX IF NOT EXISTS {index} ON TABLE {table} \
             FIELDS embedding HNSW DIMENSION {dimension} DIST COSINE TYPE F32;",
            index = self.vector_index,
            table = self.table,
            dimension = self.dimension,
        )
    }

    fn fts_definition(&self) -> String {
        format!(
            "DEFINE INDEX IF NOT EXISTS {index} ON TABLE {table} \
             FIELDS text SEARCH ANALYZER {FTS_ANALYZER_NAME} BM25;",
            index = self.fts_index_name(),
            table = self.table,
        )
    }
}

/// Defines the full-text analyzer, the text index and the HNSW vector index.
/// Idempotent: existing definitions are left untouched.
pub async fn ensure_content_indexes(
    db: &SurrealDbClient,
    spec: ContentIndexSpec<'_>,
) -> Result<(), AppError> {
    ensure_content_indexes_inner(db, spec)
        .await
        .map_err(|err| AppError::InternalError(format!("{err:#}")))
}

async fn ensure_content_indexes_inner(db: &SurrealDbClient, spec: ContentIndexSpec<'_>) -> Result<()> {
    let analyzer = format!(
        "DEFINE ANALYZER IF NOT EXISTS {FTS_ANALYZER_NAME}
            TOKENIZERS class
            FILTERS lowercase, ascii, snowball(english);"
    );

    for (label, statement) in [
        ("fts analyzer", analyzer),
        ("fts index", spec.fts_definition()),
        ("hnsw index", spec.hnsw_definition()),
    ] {
        db.client
            .query(statement)
            .await
            .with_context(|| format!("submitting {label} for {}", spec.table))?
            .check()
            .with_context(|| format!("{label} definition failed for {}", spec.table))?;
    }

    info!(
        table = spec.table,
        vector_index = spec.vector_index,
        dimension = spec.dimension,
        "Content indexes ensured"
    );
    Ok(())
}

/// Reads an `INFO FOR TABLE` payload and reports whether `index_name` is defined.
///
/// Accepts both the tagged (`{"Object": {"indexes": {"Object": ...}}}`) and the
/// plain JSON shape of the response.
pub fn table_defines_index(info: &Value, index_name: &str) -> bool {
    let unwrap_object = |value: &Value| -> Option<serde_json::Map<String, Value>> {
        value
            .get("Object")
            .unwrap_or(value)
            .as_object()
            .cloned()
    };

    unwrap_object(info)
        .and_then(|table| table.get("indexes").cloned())
        .and_then(|indexes| unwrap_object(&indexes))
        .is_some_and(|indexes| indexes.contains_key(index_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_index_in_tagged_info_payload() {
        let info = json!({
            "Object": {
                "indexes": {
                    "Object": {
                        "vector_index": { "Strand": "DEFINE INDEX vector_index ON content FIELDS embedding HNSW DIMENSION 1536" }
                    }
                }
            }
        });
        assert!(table_defines_index(&info, "vector_index"));
        assert!(!table_defines_index(&info, "other_index"));
    }

    #[test]
    fn finds_index_in_plain_info_payload() {
        let info = json!({ "indexes": { "vector_index": "DEFINE INDEX ..." }, "fields": {} });
        assert!(table_defines_index(&info, "vector_index"));
    }

    #[test]
    fn missing_indexes_section_means_undefined() {
        assert!(!table_defines_index(&json!({ "fields": {} }), "vector_index"));
        assert!(!table_defines_index(&Value::Null, "vector_index"));
    }

    #[test]
    fn definitions_reference_table_and_dimension() {
        let spec = ContentIndexSpec {
            table: "content",
            vector_index: "vector_index",
            dimension: 1536,
        };
        assert!(spec.hnsw_definition().contains("vector_index ON TABLE content"));
        assert!(spec.hnsw_definition().contains("DIMENSION 1536"));
        assert!(spec.fts_definition().contains("content_text_fts_idx"));
    }
}
