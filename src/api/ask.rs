use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error_response;
use crate::models::{AskRequest, AskResponse};
use crate::state::AppState;

/// POST /api/ask — answer a question about one document.
///
/// Cache first: a previously answered (document, question) pair returns
/// the stored answer verbatim without touching either provider. On a
/// miss the document's session retrieves, synthesizes, persists the
/// index, and the answer is cached for next time.
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question is required".to_string()));
    }
    let k = req.k.max(1);

    if state.document(&req.document_id).is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            format!("Unknown document: {}", req.document_id),
        ));
    }

    if let Some(answer) = state.cache.get(&req.document_id, &question) {
        tracing::debug!("Cache hit for {}-{question}", req.document_id);
        return Ok(Json(AskResponse {
            question,
            answer: answer.text,
            sources: answer.sources,
            cached: true,
        }));
    }

    let session = state.session(&req.document_id).await.map_err(error_response)?;
    let answer = {
        let mut session = session.lock().await;
        let answer = session.answer(&question, k).await.map_err(error_response)?;
        session
            .persist(&state.config.index_path(&req.document_id))
            .map_err(error_response)?;
        answer
    };

    state.cache.put(&req.document_id, &question, answer.clone());

    Ok(Json(AskResponse {
        question,
        answer: answer.text,
        sources: answer.sources,
        cached: false,
    }))
}
