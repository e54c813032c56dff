use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Session;
use crate::repositories::SessionRepository;

/// セッションサービス
///
/// # Security
/// - トークン平文はクライアントへの一度きりの返却以外で扱わない
/// - DBにはSHA256ハッシュのみ保存
#[derive(Clone)]
pub struct SessionService {
    session_repo: SessionRepository,
    ttl_secs: i64,
}

impl SessionService {
    /// 新しい SessionService を作成
    pub fn new(session_repo: SessionRepository, ttl_secs: i64) -> Self {
        Self {
            session_repo,
            ttl_secs,
        }
    }

    /// セッションを発行し、トークン平文を返す
    pub async fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        // 発行のついでに同一ユーザーの期限切れセッションを掃除
        self.session_repo.delete_expired(user_id).await?;

        let token = generate_token();
        let token_hash = hash_token(&token);
        let expires_at = OffsetDateTime::now_utc() + Duration::seconds(self.ttl_secs);

        self.session_repo
            .create(user_id, &token_hash, expires_at)
            .await?;

        tracing::info!(user_id = %user_id, "セッション発行");

        Ok(token)
    }

    /// トークンからセッションを解決
    pub async fn authenticate(&self, token: &str) -> Result<Session, AppError> {
        let token_hash = hash_token(token);

        self.session_repo
            .find_valid_by_token_hash(&token_hash)
            .await?
            .ok_or(AppError::SessionInvalid)
    }

    /// セッションを失効させる
    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        let token_hash = hash_token(token);
        self.session_repo.delete_by_token_hash(&token_hash).await?;
        Ok(())
    }
}

/// 32バイトのランダムトークンを生成
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// トークンをSHA256でハッシュ化
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
