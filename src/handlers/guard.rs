use axum::http::HeaderMap;

use crate::error::AppError;
use crate::models::Session;
use crate::state::AppState;

/// Authorization ヘッダーから Bearer トークンを取り出す
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(AppError::SessionInvalid)
}

/// 有効なセッションを要求する
pub async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Session, AppError> {
    let token = bearer_token(headers)?;
    state.session_service.authenticate(token).await
}

/// 管理者セッションを要求する
///
/// # Security
/// セッションの有効性確認に加えて、リクエストごとにロールを照合する。
/// ロール行がないユーザーは customer 扱いで拒否。
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<Session, AppError> {
    let session = require_session(state, headers).await?;

    let role = state.role_repo.find_by_user_id(session.user_id).await?;
    if !role.is_some_and(|r| r.is_admin()) {
        tracing::warn!(user_id = %session.user_id, "管理者権限のないアクセスを拒否");
        return Err(AppError::AdminRequired);
    }

    Ok(session)
}
