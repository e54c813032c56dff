use axum::Json;
use serde::Serialize;

/// 稼働状況レスポンス
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// 稼働確認ハンドラー
///
/// GET /api/health
///
/// ストアフロント・管理画面のデプロイ確認と死活監視に使う。
/// DBには触れない（接続障害時もプロセス自体の生存は報告する）。
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
