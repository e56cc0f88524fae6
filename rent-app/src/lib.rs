pub mod app;
pub mod config;
pub mod hosted;
pub mod logging;
pub mod render;

pub use app::{RentCalculator, build_registry};
pub use config::AppConfig;
