pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod external;
pub mod handlers;
pub mod models;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub config: Config,
}
