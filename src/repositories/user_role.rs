use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Role;

#[derive(Clone)]
pub struct UserRoleRepository {
    pool: PgPool,
}

impl UserRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// ユーザーのロールを取得
    ///
    /// # Note
    /// 行が存在しないユーザーは customer として扱う（呼び出し側で解釈）。
    /// admin ロールの付与は運用作業（SQL直接実行）であり、APIからは行わない。
    pub async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_scalar::<_, Role>(
            r#"
            SELECT role
            FROM user_roles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
