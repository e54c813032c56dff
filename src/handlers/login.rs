use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// ログインリクエスト（一般ユーザー）
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// ログインレスポンス
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
}

/// 一般ユーザーのログインハンドラー
///
/// POST /api/login
///
/// # Security
/// 管理者アカウントはここではログインできない。2FAを経由しない
/// セッション発行経路を作らないため、管理者ログインに誘導する。
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    // バリデーション
    validate_login_request(&request)?;

    // パスワード認証
    let auth_service = AuthService::new(state.user_repo.clone());
    let user = auth_service
        .authenticate(&request.email, &request.password)
        .await?;

    // 管理者は必ず2FA付きの管理者ログインを通す
    let role = state.role_repo.find_by_user_id(user.id).await?;
    if role.is_some_and(|r| r.is_admin()) {
        tracing::warn!(user_id = %user.id, "管理者アカウントの一般ログインを拒否");
        return Err(AppError::Validation(
            "管理者アカウントは管理者ログインを使用してください".to_string(),
        ));
    }

    // セッション発行
    let token = state.session_service.issue(user.id).await?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        email: user.email,
    }))
}

/// ログインリクエストのバリデーション
fn validate_login_request(request: &LoginRequest) -> Result<(), AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("メールアドレスは必須です".to_string()));
    }
    if !request.email.contains('@') {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    if request.password.is_empty() {
        return Err(AppError::Validation("パスワードは必須です".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_email() {
        let request = LoginRequest {
            email: "".to_string(),
            password: "password123".to_string(),
        };
        assert!(validate_login_request(&request).is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        let request = LoginRequest {
            email: "invalid-email".to_string(),
            password: "password123".to_string(),
        };
        assert!(validate_login_request(&request).is_err());
    }

    #[test]
    fn test_validate_empty_password() {
        let request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "".to_string(),
        };
        assert!(validate_login_request(&request).is_err());
    }

    #[test]
    fn test_validate_valid_request() {
        let request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(validate_login_request(&request).is_ok());
    }
}
