use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error_response;
use crate::models::{SuggestQuestionsRequest, SuggestQuestionsResponse};
use crate::state::AppState;

/// POST /api/questions — generate suggested citizen-level questions for
/// one document. The model's reply must match the strict list schema or
/// the request fails; no partial lists are returned.
pub async fn suggest_questions(
    State(state): State<AppState>,
    Json(req): Json<SuggestQuestionsRequest>,
) -> Result<Json<SuggestQuestionsResponse>, (StatusCode, String)> {
    if req.count == 0 || req.count > 20 {
        return Err((
            StatusCode::BAD_REQUEST,
            "count must be between 1 and 20".to_string(),
        ));
    }

    if state.document(&req.document_id).is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            format!("Unknown document: {}", req.document_id),
        ));
    }

    let session = state.session(&req.document_id).await.map_err(error_response)?;
    let questions = {
        let session = session.lock().await;
        session
            .suggest_questions(req.count)
            .await
            .map_err(error_response)?
    };

    Ok(Json(SuggestQuestionsResponse {
        document_id: req.document_id,
        questions,
    }))
}
