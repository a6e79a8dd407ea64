//! HTTP handlers.

pub mod health_handler;
pub mod list_handler;
pub mod user_handler;

pub use health_handler::health_routes;
pub use list_handler::list_routes;
pub use user_handler::user_routes;
