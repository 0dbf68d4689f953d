pub mod api;
pub mod config;
mod constants;
