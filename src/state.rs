use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::{
    AdminTwoFactorRepository, BannerRepository, OrderRepository, ProductRepository,
    ProfileRepository, SessionRepository, SuggestionRepository, UserRepository,
    UserRoleRepository,
};
use crate::services::{SessionService, TotpService};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL コネクションプール
    pub db_pool: PgPool,
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// ユーザーリポジトリ
    pub user_repo: UserRepository,
    /// ユーザーロールリポジトリ
    pub role_repo: UserRoleRepository,
    /// プロフィールリポジトリ
    pub profile_repo: ProfileRepository,
    /// 管理者2FAクレデンシャルリポジトリ
    pub two_factor_repo: AdminTwoFactorRepository,
    /// 商品リポジトリ
    pub product_repo: ProductRepository,
    /// バナーリポジトリ
    pub banner_repo: BannerRepository,
    /// 注文リポジトリ
    pub order_repo: OrderRepository,
    /// お問い合わせリポジトリ
    pub suggestion_repo: SuggestionRepository,
    /// TOTPサービス
    pub totp_service: TotpService,
    /// セッションサービス
    pub session_service: SessionService,
}

impl AppState {
    /// 新しい AppState を作成
    pub fn new(db_pool: PgPool, config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let totp_service = TotpService::new(
            config.totp_issuer.clone(),
            config.encryption_key.expose_secret(),
        )?;
        let session_service = SessionService::new(
            SessionRepository::new(db_pool.clone()),
            config.session_ttl_secs,
        );

        Ok(Self {
            user_repo: UserRepository::new(db_pool.clone()),
            role_repo: UserRoleRepository::new(db_pool.clone()),
            profile_repo: ProfileRepository::new(db_pool.clone()),
            two_factor_repo: AdminTwoFactorRepository::new(db_pool.clone()),
            product_repo: ProductRepository::new(db_pool.clone()),
            banner_repo: BannerRepository::new(db_pool.clone()),
            order_repo: OrderRepository::new(db_pool.clone()),
            suggestion_repo: SuggestionRepository::new(db_pool.clone()),
            totp_service,
            session_service,
            db_pool,
            config,
        })
    }
}
