//! HTTP routes for cropchain

pub mod admin;
pub mod auth_routes;
pub mod crops;
pub mod health;
pub mod readings;
pub mod response;

pub use admin::handle_holders;
pub use auth_routes::{authenticate, handle_login, handle_me, handle_register, handle_set_wallet};
pub use crops::{handle_get_crop, handle_list_crops, handle_register_crop, handle_summary};
pub use health::health_check;
pub use response::{
    cors_preflight, error_response, error_with_status, json_response, BoxBody, RouteResult,
};
