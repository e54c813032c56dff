use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::AdminTwoFactor;
use crate::services::admin_login::{CredentialStore, InsertOutcome};

#[derive(Clone)]
pub struct AdminTwoFactorRepository {
    pool: PgPool,
}

impl AdminTwoFactorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// ユーザーIDで2FAクレデンシャルを検索
    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<AdminTwoFactor>, sqlx::Error> {
        sqlx::query_as::<_, AdminTwoFactor>(
            r#"
            SELECT user_id, secret_encrypted, created_at
            FROM admin_two_factor
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// クレデンシャルが存在しない場合のみ挿入
    ///
    /// # Note
    /// user_id の主キー制約で一意性を保証する。同一アカウントの同時登録
    /// （ブラウザタブ2枚など）では先勝ちとなり、負けた側は false を受け取る。
    pub async fn insert_if_absent(
        &self,
        user_id: Uuid,
        secret_encrypted: &[u8],
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO admin_two_factor (user_id, secret_encrypted)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(secret_encrypted)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

impl CredentialStore for AdminTwoFactorRepository {
    async fn find(&self, user_id: Uuid) -> Result<Option<Vec<u8>>, AppError> {
        let row = self.find_by_user_id(user_id).await?;
        Ok(row.map(|r| r.secret_encrypted))
    }

    async fn insert_if_absent(
        &self,
        user_id: Uuid,
        secret_encrypted: &[u8],
    ) -> Result<InsertOutcome, AppError> {
        let inserted =
            AdminTwoFactorRepository::insert_if_absent(self, user_id, secret_encrypted).await?;
        Ok(if inserted {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::AlreadyExists
        })
    }
}
