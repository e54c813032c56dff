use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// トップページのマーキーバナー
#[derive(Debug, FromRow, Serialize)]
pub struct Banner {
    pub id: Uuid,
    pub message: String,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: OffsetDateTime,
}
