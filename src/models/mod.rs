pub mod admin_two_factor;
pub mod banner;
pub mod order;
pub mod product;
pub mod profile;
pub mod session;
pub mod suggestion;
pub mod user;
pub mod user_role;

pub use admin_two_factor::AdminTwoFactor;
pub use banner::Banner;
pub use order::Order;
pub use product::Product;
pub use profile::Profile;
pub use session::Session;
pub use suggestion::Suggestion;
pub use user::User;
pub use user_role::Role;
