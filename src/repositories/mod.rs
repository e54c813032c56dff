pub mod admin_two_factor;
pub mod banner;
pub mod order;
pub mod product;
pub mod profile;
pub mod session;
pub mod suggestion;
pub mod user;
pub mod user_role;

pub use admin_two_factor::AdminTwoFactorRepository;
pub use banner::BannerRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use profile::ProfileRepository;
pub use session::SessionRepository;
pub use suggestion::SuggestionRepository;
pub use user::UserRepository;
pub use user_role::UserRoleRepository;
