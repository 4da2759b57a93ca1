mod completion_chunk;
mod completion_request;
mod error;

pub use completion_chunk::{ChatChunkChoice, ChatChunkDelta, ChatCompletionChunk};
pub use completion_request::{ChatCompletionRequest, ChatMessage, ChatRole};
pub use error::{ChatErrorBody, ChatErrorObject};
