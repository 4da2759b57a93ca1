pub mod chat;

pub use chat::{
    ChatCompletionChunk, ChatCompletionRequest, ChatErrorBody, ChatErrorObject, ChatMessage,
    ChatRole,
};
