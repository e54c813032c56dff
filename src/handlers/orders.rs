use axum::{Json, extract::State, http::HeaderMap};

use crate::error::AppError;
use crate::handlers::guard::require_session;
use crate::models::Order;
use crate::state::AppState;

/// 注文履歴取得ハンドラー
///
/// GET /api/orders
///
/// ログイン中のユーザー自身の注文を新しい順で返す。
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, AppError> {
    let session = require_session(&state, &headers).await?;

    let orders = state.order_repo.list_by_user(session.user_id).await?;

    Ok(Json(orders))
}
