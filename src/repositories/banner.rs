use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Banner;

#[derive(Clone)]
pub struct BannerRepository {
    pool: PgPool,
}

impl BannerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 表示中のバナーを表示順で取得
    pub async fn list_active(&self) -> Result<Vec<Banner>, sqlx::Error> {
        sqlx::query_as::<_, Banner>(
            r#"
            SELECT id, message, is_active, sort_order, created_at
            FROM banners
            WHERE is_active = true
            ORDER BY sort_order ASC, created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create(&self, message: &str, sort_order: i32) -> Result<Banner, sqlx::Error> {
        sqlx::query_as::<_, Banner>(
            r#"
            INSERT INTO banners (message, sort_order)
            VALUES ($1, $2)
            RETURNING id, message, is_active, sort_order, created_at
            "#,
        )
        .bind(message)
        .bind(sort_order)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update(
        &self,
        banner_id: Uuid,
        message: &str,
        is_active: bool,
        sort_order: i32,
    ) -> Result<Option<Banner>, sqlx::Error> {
        sqlx::query_as::<_, Banner>(
            r#"
            UPDATE banners
            SET message = $2, is_active = $3, sort_order = $4
            WHERE id = $1
            RETURNING id, message, is_active, sort_order, created_at
            "#,
        )
        .bind(banner_id)
        .bind(message)
        .bind(is_active)
        .bind(sort_order)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, banner_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM banners
            WHERE id = $1
            "#,
        )
        .bind(banner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
