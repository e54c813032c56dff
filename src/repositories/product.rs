use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Product;

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 公開中の商品を人気順（like_count降順）で取得
    pub async fn list_active(
        &self,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Product>, sqlx::Error> {
        match category {
            Some(category) => {
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT id, name, description, price, image_url, category,
                           like_count, is_active, created_at, updated_at
                    FROM products
                    WHERE is_active = true AND category = $1
                    ORDER BY like_count DESC, created_at DESC
                    LIMIT $2
                    "#,
                )
                .bind(category)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT id, name, description, price, image_url, category,
                           like_count, is_active, created_at, updated_at
                    FROM products
                    WHERE is_active = true
                    ORDER BY like_count DESC, created_at DESC
                    LIMIT $1
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    /// ユーザーがいいねした公開中の商品を人気順で取得
    ///
    /// 非公開になった商品は、いいね済みでも一覧から外す。
    pub async fn list_liked_by_user(&self, user_id: Uuid) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.name, p.description, p.price, p.image_url, p.category,
                   p.like_count, p.is_active, p.created_at, p.updated_at
            FROM products p
            JOIN product_likes pl ON pl.product_id = p.id
            WHERE pl.user_id = $1 AND p.is_active = true
            ORDER BY p.like_count DESC, p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, product_id: Uuid) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, image_url, category,
                   like_count, is_active, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        price: i64,
        image_url: Option<&str>,
        category: &str,
    ) -> Result<Product, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price, image_url, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, price, image_url, category,
                      like_count, is_active, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(image_url)
        .bind(category)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update(
        &self,
        product_id: Uuid,
        name: &str,
        description: Option<&str>,
        price: i64,
        image_url: Option<&str>,
        category: &str,
        is_active: bool,
    ) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, image_url = $5,
                category = $6, is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, price, image_url, category,
                      like_count, is_active, created_at, updated_at
            "#,
        )
        .bind(product_id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(image_url)
        .bind(category)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, product_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// いいねを記録して like_count を加算
    ///
    /// # Note
    /// product_likes の (product_id, user_id) UNIQUE 制約で1ユーザー1回に制限。
    /// 既にいいね済みの場合は加算せず現在のカウントを返す。
    pub async fn like(&self, product_id: Uuid, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO product_likes (product_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (product_id, user_id) DO NOTHING
            "#,
        )
        .bind(product_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        let like_count = if inserted {
            sqlx::query_scalar::<_, i64>(
                r#"
                UPDATE products
                SET like_count = like_count + 1
                WHERE id = $1
                RETURNING like_count
                "#,
            )
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT like_count
                FROM products
                WHERE id = $1
                "#,
            )
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?
        };

        tx.commit().await?;

        Ok(like_count)
    }
}
