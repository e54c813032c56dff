use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::AdminLoginService;
use crate::services::admin_login::TwoFactorChallenge;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// 管理者ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
    /// TOTPコード（クレデンシャル登録済みの場合に必須）
    pub code: Option<String>,
}

/// 管理者ログインレスポンス
#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    /// "ok" | "setup_required" | "totp_required"
    pub status: &'static str,
    /// セッショントークン（2FA検証成功時のみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// provisioning URI（初回登録時のみ、一度きりの表示用）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otpauth_url: Option<String>,
    /// QRコード（data URL、初回登録時のみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
}

/// 管理者ログインハンドラー
///
/// POST /api/admin/login
///
/// 処理フロー:
/// 1. リクエストバリデーション
/// 2. パスワード認証（DB照合）
/// 3. ロール確認 — セッション発行より前に必ず行う。非管理者はここで拒否
/// 4. 2FAクレデンシャル未登録なら生成・保存し、QRを返す（セッションなし）
/// 5. 登録済みでコード未提出なら totp_required を返す（セッションなし）
/// 6. コード検証成功で初めてセッションを発行する
///
/// # Security
/// - コード・シークレット・URIはログ出力禁止
/// - 登録直後のログインもコード検証を経ないとセッションを得られない
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, AppError> {
    // 1. リクエストバリデーション
    validate_admin_login_request(&request)?;

    // 2. パスワード認証
    let auth_service = AuthService::new(state.user_repo.clone());
    let user = auth_service
        .authenticate(&request.email, &request.password)
        .await?;

    // 3. ロール確認（セッション発行前）
    let role = state.role_repo.find_by_user_id(user.id).await?;
    if !role.is_some_and(|r| r.is_admin()) {
        tracing::warn!(user_id = %user.id, "非管理者の管理者ログインを拒否");
        return Err(AppError::AdminRequired);
    }

    let login_service = AdminLoginService::new(
        state.two_factor_repo.clone(),
        state.totp_service.clone(),
    );

    match &request.code {
        // 6. コード検証 → セッション発行
        Some(code) => {
            login_service.verify(user.id, code).await?;

            let token = state.session_service.issue(user.id).await?;

            tracing::info!(user_id = %user.id, "管理者ログイン完了");

            Ok(Json(AdminLoginResponse {
                status: "ok",
                token: Some(token),
                otpauth_url: None,
                qr_code: None,
            }))
        }
        // 4, 5. コード未提出 → 登録または検証要求
        None => match login_service.begin(user.id, &user.email).await? {
            TwoFactorChallenge::SetupRequired {
                otpauth_url,
                qr_code,
            } => {
                tracing::info!(user_id = %user.id, "2FA登録を開始（セッション未発行）");

                Ok(Json(AdminLoginResponse {
                    status: "setup_required",
                    token: None,
                    otpauth_url: Some(otpauth_url),
                    qr_code: Some(format!("data:image/png;base64,{}", qr_code)),
                }))
            }
            TwoFactorChallenge::CodeRequired => Ok(Json(AdminLoginResponse {
                status: "totp_required",
                token: None,
                otpauth_url: None,
                qr_code: None,
            })),
        },
    }
}

/// 管理者ログインリクエストのバリデーション
fn validate_admin_login_request(request: &AdminLoginRequest) -> Result<(), AppError> {
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
    if let Some(code) = &request.code
        && (code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(AppError::Validation(
            "認証コードは6桁の数字で入力してください".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> AdminLoginRequest {
        AdminLoginRequest {
            email: "admin@example.com".to_string(),
            password: "password123".to_string(),
            code: None,
        }
    }

    #[test]
    fn test_validate_empty_email() {
        let request = AdminLoginRequest {
            email: "".to_string(),
            ..valid_request()
        };
        assert!(validate_admin_login_request(&request).is_err());
    }

    #[test]
    fn test_validate_empty_password() {
        let request = AdminLoginRequest {
            password: "".to_string(),
            ..valid_request()
        };
        assert!(validate_admin_login_request(&request).is_err());
    }

    #[test]
    fn test_validate_short_code() {
        let request = AdminLoginRequest {
            code: Some("12345".to_string()),
            ..valid_request()
        };
        assert!(validate_admin_login_request(&request).is_err());
    }

    #[test]
    fn test_validate_non_digit_code() {
        let request = AdminLoginRequest {
            code: Some("12345a".to_string()),
            ..valid_request()
        };
        assert!(validate_admin_login_request(&request).is_err());
    }

    #[test]
    fn test_validate_without_code() {
        assert!(validate_admin_login_request(&valid_request()).is_ok());
    }

    #[test]
    fn test_validate_with_valid_code() {
        let request = AdminLoginRequest {
            code: Some("087082".to_string()),
            ..valid_request()
        };
        assert!(validate_admin_login_request(&request).is_ok());
    }
}
