use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::models::{AddDocumentRequest, Document};
use crate::state::AppState;

/// GET /api/documents — list registered acts.
pub async fn list_documents(State(state): State<AppState>) -> Json<Vec<Document>> {
    Json(state.documents.read().clone())
}

/// POST /api/documents — register an act already stored on local disk.
/// The directory is indexed lazily, on the first question.
pub async fn add_document(
    State(state): State<AppState>,
    Json(req): Json<AddDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), (StatusCode, String)> {
    let id = req.id.trim().to_string();
    if id.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Document id is required".to_string()));
    }
    // The id names the index file on disk; keep it path-safe
    if id.contains(['/', '\\', '.']) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Document id must not contain path separators or dots".to_string(),
        ));
    }

    let path = std::path::PathBuf::from(&req.path);
    if !path.is_dir() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("{} is not a directory", path.display()),
        ));
    }

    {
        let documents = state.documents.read();
        if documents.iter().any(|d| d.id == id) {
            return Err((
                StatusCode::CONFLICT,
                format!("Document {id} is already registered"),
            ));
        }
    }

    let document = Document {
        id,
        title: req.title,
        origin_url: req.origin_url,
        path,
        added_at: Utc::now(),
        chunk_count: 0,
    };

    state.documents.write().push(document.clone());
    state.persist_documents();
    tracing::info!("Registered document {} ({})", document.id, document.title);

    Ok((StatusCode::CREATED, Json(document)))
}

/// GET /api/config — current LLM configuration with the key redacted.
pub async fn get_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    let llm = &state.config.llm;
    Json(serde_json::json!({
        "provider": llm.provider,
        "base_url": llm.base_url,
        "chat_model": llm.chat_model,
        "embedding_model": llm.embedding_model,
        "embedding_dim": llm.embedding_dim,
        "api_key_set": llm.api_key.is_some(),
    }))
}
