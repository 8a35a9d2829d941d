pub mod admin_handlers;
pub mod auth_handlers;
pub mod health_handlers;
pub mod movie_handlers;
pub mod view;
