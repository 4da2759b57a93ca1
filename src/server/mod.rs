pub mod guards;
pub mod router;
pub mod routes;

pub use router::{PromptdeskState, promptdesk_router};
