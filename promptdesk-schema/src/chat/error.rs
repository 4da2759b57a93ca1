use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAI-compatible error envelope returned by the model API:
/// `{ "error": { "message": "...", "type": "...", "code": "...", "param": ... } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatErrorBody {
    #[serde(rename = "error")]
    pub inner: ChatErrorObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatErrorObject {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub r#type: Option<String>,

    #[serde(default)]
    pub code: Option<Value>,

    #[serde(default)]
    pub param: Option<Value>,
}
