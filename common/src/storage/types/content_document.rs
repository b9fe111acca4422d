use crate::{query::preview_text, stored_object};
use uuid::Uuid;

stored_object!(ContentDocument, "content", {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    embedding: Option<Vec<f32>>
});

impl ContentDocument {
    pub fn new(text: String, embedding: Option<Vec<f32>>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            text,
            embedding,
        }
    }

    pub fn preview(&self, max_chars: usize) -> String {
        preview_text(&self.text, max_chars)
    }
}

/// Joins document bodies into the context block handed to the language model.
pub fn join_document_text(documents: &[ContentDocument]) -> String {
    documents
        .iter()
        .map(|doc| doc.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
