use axum::{Json, extract::State, http::HeaderMap};
use serde::Serialize;

use crate::error::AppError;
use crate::handlers::guard::bearer_token;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// ログアウトハンドラー
///
/// POST /api/logout
///
/// セッションを失効させる。トークンが既に無効でも成功を返す。
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, AppError> {
    let token = bearer_token(&headers)?;
    state.session_service.revoke(token).await?;

    Ok(Json(LogoutResponse { logged_out: true }))
}
