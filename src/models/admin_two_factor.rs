use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// 管理者アカウントの二要素認証（TOTP）クレデンシャル
///
/// シークレットは AES-256-GCM で暗号化されて保存される。
/// 平文シークレットはログに出力禁止。
/// アカウントごとに最大1行（user_id が主キー）。登録後は更新されない。
#[derive(Debug, FromRow, Serialize)]
pub struct AdminTwoFactor {
    pub user_id: Uuid,
    #[serde(skip)]
    pub secret_encrypted: Vec<u8>,
    pub created_at: OffsetDateTime,
}
