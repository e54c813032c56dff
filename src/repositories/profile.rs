use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Profile;

#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, full_name, phone, created_at, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        full_name: &str,
        phone: Option<&str>,
    ) -> Result<Profile, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, full_name, phone)
            VALUES ($1, $2, $3)
            RETURNING user_id, full_name, phone, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .bind(phone)
        .fetch_one(&self.pool)
        .await
    }
}
