use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::guard::require_admin;
use crate::models::Banner;
use crate::state::AppState;

/// バナー一覧ハンドラー
///
/// GET /api/banners
///
/// トップページのマーキーに表示するバナーを表示順で返す。
pub async fn list_banners(State(state): State<AppState>) -> Result<Json<Vec<Banner>>, AppError> {
    let banners = state.banner_repo.list_active().await?;
    Ok(Json(banners))
}

#[derive(Debug, Deserialize)]
pub struct CreateBannerRequest {
    pub message: String,
    #[serde(default)]
    pub sort_order: i32,
}

/// バナー登録ハンドラー（管理者）
///
/// POST /api/admin/banners
pub async fn create_banner(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateBannerRequest>,
) -> Result<Json<Banner>, AppError> {
    require_admin(&state, &headers).await?;

    if request.message.trim().is_empty() {
        return Err(AppError::Validation("メッセージは必須です".to_string()));
    }

    let banner = state
        .banner_repo
        .create(&request.message, request.sort_order)
        .await?;

    tracing::info!(banner_id = %banner.id, "バナー登録");

    Ok(Json(banner))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBannerRequest {
    pub message: String,
    pub is_active: bool,
    pub sort_order: i32,
}

/// バナー更新ハンドラー（管理者）
///
/// PUT /api/admin/banners/{id}
pub async fn update_banner(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(banner_id): Path<Uuid>,
    Json(request): Json<UpdateBannerRequest>,
) -> Result<Json<Banner>, AppError> {
    require_admin(&state, &headers).await?;

    if request.message.trim().is_empty() {
        return Err(AppError::Validation("メッセージは必須です".to_string()));
    }

    let banner = state
        .banner_repo
        .update(
            banner_id,
            &request.message,
            request.is_active,
            request.sort_order,
        )
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(banner_id = %banner.id, "バナー更新");

    Ok(Json(banner))
}

/// バナー削除ハンドラー（管理者）
///
/// DELETE /api/admin/banners/{id}
pub async fn delete_banner(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(banner_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers).await?;

    if !state.banner_repo.delete(banner_id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(banner_id = %banner_id, "バナー削除");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
