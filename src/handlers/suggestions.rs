use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::guard::require_admin;
use crate::models::Suggestion;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSuggestionRequest {
    pub name: String,
    pub email: Option<String>,
    pub message: String,
}

/// お問い合わせ投稿ハンドラー（公開フォーム）
///
/// POST /api/suggestions
pub async fn create_suggestion(
    State(state): State<AppState>,
    Json(request): Json<CreateSuggestionRequest>,
) -> Result<Json<Suggestion>, AppError> {
    validate_suggestion_request(&request)?;

    let suggestion = state
        .suggestion_repo
        .create(
            &request.name,
            request.email.as_deref(),
            &request.message,
        )
        .await?;

    tracing::info!(suggestion_id = %suggestion.id, "お問い合わせ受付");

    Ok(Json(suggestion))
}

/// お問い合わせ一覧ハンドラー（管理者）
///
/// GET /api/admin/suggestions
pub async fn list_suggestions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Suggestion>>, AppError> {
    require_admin(&state, &headers).await?;

    let suggestions = state.suggestion_repo.list().await?;

    Ok(Json(suggestions))
}

/// お問い合わせ削除ハンドラー（管理者）
///
/// DELETE /api/admin/suggestions/{id}
pub async fn delete_suggestion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(suggestion_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers).await?;

    if !state.suggestion_repo.delete(suggestion_id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(suggestion_id = %suggestion_id, "お問い合わせ削除");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// お問い合わせのバリデーション
fn validate_suggestion_request(request: &CreateSuggestionRequest) -> Result<(), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("お名前は必須です".to_string()));
    }
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("メッセージは必須です".to_string()));
    }
    if let Some(email) = &request.email
        && !email.contains('@')
    {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    Ok(())
}
