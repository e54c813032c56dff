use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Suggestion;

#[derive(Clone)]
pub struct SuggestionRepository {
    pool: PgPool,
}

impl SuggestionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        email: Option<&str>,
        message: &str,
    ) -> Result<Suggestion, sqlx::Error> {
        sqlx::query_as::<_, Suggestion>(
            r#"
            INSERT INTO suggestions (name, email, message)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, message, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(message)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list(&self) -> Result<Vec<Suggestion>, sqlx::Error> {
        sqlx::query_as::<_, Suggestion>(
            r#"
            SELECT id, name, email, message, created_at
            FROM suggestions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn delete(&self, suggestion_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM suggestions
            WHERE id = $1
            "#,
        )
        .bind(suggestion_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
