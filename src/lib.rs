pub mod config;
pub mod db;
pub mod error;
pub mod prompt;
pub mod seed;
pub mod server;
pub mod store;
pub mod upstream;

mod utils;

pub use error::{PromptdeskError, StoreError, UpstreamError};
pub use store::TemplateStore;
