use axum::{Json, extract::State};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{RecommendRequest, RecommendationResponse},
};

pub async fn health() -> &'static str {
    "ok"
}

pub async fn recommend(
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    if state.config.groq_api_key.trim().is_empty() {
        return Err(AppError::Config("GROQ_API_KEY is not configured".to_string()));
    }

    let narrative = req.narrative.trim();
    if narrative.is_empty() {
        return Err(AppError::InvalidInput("narrative is required".to_string()));
    }

    let response = state.concierge.recommend(narrative, req.era, req.user_id).await?;
    Ok(Json(response))
}
