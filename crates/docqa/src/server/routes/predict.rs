//! Question answering endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::server::state::AppState;
use crate::types::{PredictRequest, PredictResponse, NO_QUESTION_MESSAGE};

/// POST /predict - answer a question with the requested model
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Json<PredictResponse> {
    if request.is_blank() {
        return Json(PredictResponse {
            result: NO_QUESTION_MESSAGE.to_string(),
        });
    }

    let start = Instant::now();
    tracing::info!("Question ({}): \"{}\"", request.model, request.text);

    let result = state.rag().answer(&request.text, &request.model).await;

    tracing::info!("Answered in {}ms", start.elapsed().as_millis());
    Json(PredictResponse { result })
}
