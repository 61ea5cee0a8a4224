mod app;
pub mod config;
mod effects;
mod presenter;

pub use app::run_app;
