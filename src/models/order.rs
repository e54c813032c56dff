use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// 注文
///
/// items は注文時点の商品スナップショット（JSONB）
#[derive(Debug, FromRow, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub total: i64,
    pub items: serde_json::Value,
    pub created_at: OffsetDateTime,
}
