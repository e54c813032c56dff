use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// お問い合わせ・要望（公開フォームから投稿、管理画面で閲覧・削除）
#[derive(Debug, FromRow, Serialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub message: String,
    pub created_at: OffsetDateTime,
}
