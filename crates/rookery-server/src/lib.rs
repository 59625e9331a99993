pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod service;

pub use config::ServerConfig;
pub use error::ApiError;
pub use handler::{AppState, router};
pub use service::{serve, spawn_server};
