pub mod auth;
pub mod config;
pub mod generate;
pub mod templates;
