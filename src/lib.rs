pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod router;
pub mod services;
pub mod utils;
pub mod views;

#[cfg(feature = "desktop")]
pub mod commands;

pub use app::{ActionRequest, ElearnApp, Page};
pub use config::AppConfig;
pub use error::{AppError, Result};
