pub mod admin_login;
pub mod banners;
pub mod guard;
pub mod health;
pub mod login;
pub mod logout;
pub mod orders;
pub mod products;
pub mod profile;
pub mod register;
pub mod suggestions;

pub use admin_login::admin_login;
pub use banners::{create_banner, delete_banner, list_banners, update_banner};
pub use health::health_check;
pub use login::login;
pub use logout::logout;
pub use orders::list_orders;
pub use products::{
    create_product, delete_product, like_product, list_products, list_saved_products,
    update_product,
};
pub use profile::fetch_profile;
pub use register::register;
pub use suggestions::{create_suggestion, delete_suggestion, list_suggestions};
