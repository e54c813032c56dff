use axum::{Json, extract::State, http::HeaderMap};

use crate::error::AppError;
use crate::handlers::guard::require_session;
use crate::models::Profile;
use crate::state::AppState;

/// プロフィール取得ハンドラー
///
/// GET /api/profile
///
/// ログイン中のユーザー自身のプロフィールを返す。
pub async fn fetch_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Profile>, AppError> {
    let session = require_session(&state, &headers).await?;

    let profile = state
        .profile_repo
        .find_by_user_id(session.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(profile))
}
