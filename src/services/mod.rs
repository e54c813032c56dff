pub mod admin_login;
pub mod auth;
pub mod session;
pub mod totp;

pub use admin_login::AdminLoginService;
pub use session::SessionService;
pub use totp::TotpService;
