pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;

pub use config::Config;
pub use db::Store;
pub use error::{AppError, AppResult};
pub use handlers::AppState;
