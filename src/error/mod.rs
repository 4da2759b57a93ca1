mod promptdesk;
mod store;
mod upstream;

pub use promptdesk::{ApiErrorBody, ApiErrorObject, PromptdeskError};
pub use store::StoreError;
pub use upstream::UpstreamError;
