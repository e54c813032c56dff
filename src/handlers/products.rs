use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::guard::{require_admin, require_session};
use crate::models::Product;
use crate::state::AppState;

/// デフォルトの取得件数（トップページの人気商品一覧と同じ）
const DEFAULT_LIMIT: i64 = 15;
const MAX_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    /// カテゴリで絞り込み（Rings / Necklaces / Earrings / Bangles / Chains）
    pub category: Option<String>,
    pub limit: Option<i64>,
}

/// 商品一覧ハンドラー
///
/// GET /api/products
///
/// 公開中の商品を人気順（like_count降順）で返す。
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let products = state
        .product_repo
        .list_active(query.category.as_deref(), limit)
        .await?;

    Ok(Json(products))
}

/// 保存済み商品一覧ハンドラー
///
/// GET /api/products/saved
///
/// ログイン中のユーザーがいいねした商品を人気順で返す。
/// 非公開になった商品は含まれない。
pub async fn list_saved_products(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Product>>, AppError> {
    let session = require_session(&state, &headers).await?;

    let products = state
        .product_repo
        .list_liked_by_user(session.user_id)
        .await?;

    Ok(Json(products))
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub like_count: i64,
}

/// いいねハンドラー
///
/// POST /api/products/{id}/like
///
/// 1ユーザー1商品につき1回まで。2回目以降は加算せず現在値を返す。
pub async fn like_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
) -> Result<Json<LikeResponse>, AppError> {
    let session = require_session(&state, &headers).await?;

    // 存在しない・非公開の商品にはいいねできない
    let product = state
        .product_repo
        .find_by_id(product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(AppError::NotFound)?;

    let like_count = state.product_repo.like(product.id, session.user_id).await?;

    Ok(Json(LikeResponse { like_count }))
}

// === 管理者向けCRUD ===

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image_url: Option<String>,
    pub category: String,
}

/// 商品登録ハンドラー（管理者）
///
/// POST /api/admin/products
pub async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateProductRequest>,
) -> Result<Json<Product>, AppError> {
    require_admin(&state, &headers).await?;
    validate_product_fields(&request.name, request.price, &request.category)?;

    let product = state
        .product_repo
        .create(
            &request.name,
            request.description.as_deref(),
            request.price,
            request.image_url.as_deref(),
            &request.category,
        )
        .await?;

    tracing::info!(product_id = %product.id, "商品登録");

    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image_url: Option<String>,
    pub category: String,
    pub is_active: bool,
}

/// 商品更新ハンドラー（管理者）
///
/// PUT /api/admin/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    require_admin(&state, &headers).await?;
    validate_product_fields(&request.name, request.price, &request.category)?;

    let product = state
        .product_repo
        .update(
            product_id,
            &request.name,
            request.description.as_deref(),
            request.price,
            request.image_url.as_deref(),
            &request.category,
            request.is_active,
        )
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(product_id = %product.id, "商品更新");

    Ok(Json(product))
}

/// 商品削除ハンドラー（管理者）
///
/// DELETE /api/admin/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers).await?;

    if !state.product_repo.delete(product_id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(product_id = %product_id, "商品削除");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// 商品フィールドのバリデーション
fn validate_product_fields(name: &str, price: i64, category: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("商品名は必須です".to_string()));
    }
    if price <= 0 {
        return Err(AppError::Validation(
            "価格は1以上で入力してください".to_string(),
        ));
    }
    if category.trim().is_empty() {
        return Err(AppError::Validation("カテゴリは必須です".to_string()));
    }
    Ok(())
}
