//! Prompt assembly: turns the editable fields into chat messages.

use promptdesk_schema::ChatMessage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Config keys that double as fallbacks for the matching prompt fields.
pub const KEY_STRUCTURE: &str = "structure";
pub const KEY_OUTPUT: &str = "output";
pub const KEY_LIMITATIONS: &str = "limitations";
pub const KEY_KNOWLEDGE_BASE: &str = "knowledgeBase";
pub const KEY_SYSTEM_PROMPT: &str = "systemPrompt";

/// Field values as sent by the UI. Every field is optional; blanks fall back
/// to the stored config entry of the same key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFields {
    #[serde(default)]
    pub structure: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub limitations: Option<String>,
    #[serde(default)]
    pub knowledge_base: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Free-form request appended after the rule sections.
    #[serde(default)]
    pub input: Option<String>,
}

impl PromptFields {
    /// Fill blank fields from `defaults` (missing keys become "").
    pub fn with_defaults(self, defaults: &BTreeMap<String, String>) -> ResolvedPrompt {
        let pick = |field: Option<String>, key: &str| -> String {
            match field.filter(|s| !s.trim().is_empty()) {
                Some(v) => v,
                None => defaults.get(key).cloned().unwrap_or_default(),
            }
        };

        ResolvedPrompt {
            structure: pick(self.structure, KEY_STRUCTURE),
            output: pick(self.output, KEY_OUTPUT),
            limitations: pick(self.limitations, KEY_LIMITATIONS),
            knowledge_base: pick(self.knowledge_base, KEY_KNOWLEDGE_BASE),
            system_prompt: pick(self.system_prompt, KEY_SYSTEM_PROMPT),
            input: self.input.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    pub structure: String,
    pub output: String,
    pub limitations: String,
    pub knowledge_base: String,
    pub system_prompt: String,
    pub input: String,
}

impl ResolvedPrompt {
    /// System message (only when non-empty) followed by the user message.
    ///
    /// Returns `None` when there is nothing to ask.
    pub fn into_messages(self) -> Option<Vec<ChatMessage>> {
        let system = join_sections([
            (None, self.system_prompt.as_str()),
            (Some("Knowledge base"), self.knowledge_base.as_str()),
        ]);
        let user = join_sections([
            (Some("Structure"), self.structure.as_str()),
            (Some("Output rules"), self.output.as_str()),
            (Some("Limitations"), self.limitations.as_str()),
            (None, self.input.as_str()),
        ]);

        if user.is_empty() {
            return None;
        }

        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(user));
        Some(messages)
    }
}

fn join_sections<const N: usize>(sections: [(Option<&str>, &str); N]) -> String {
    sections
        .into_iter()
        .filter_map(|(title, body)| {
            let body = body.trim();
            if body.is_empty() {
                return None;
            }
            Some(match title {
                Some(title) => format!("## {title}\n{body}"),
                None => body.to_string(),
            })
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptdesk_schema::ChatRole;

    fn defaults() -> BTreeMap<String, String> {
        BTreeMap::from([
            (KEY_SYSTEM_PROMPT.to_string(), "You write landing pages.".to_string()),
            (KEY_KNOWLEDGE_BASE.to_string(), "Product: Acme".to_string()),
            (KEY_LIMITATIONS.to_string(), "No emojis.".to_string()),
        ])
    }

    #[test]
    fn blank_fields_fall_back_to_config() {
        let fields = PromptFields {
            structure: Some("Hero, CTA".to_string()),
            limitations: Some("   ".to_string()),
            ..Default::default()
        };
        let resolved = fields.with_defaults(&defaults());

        assert_eq!(resolved.structure, "Hero, CTA");
        assert_eq!(resolved.limitations, "No emojis.");
        assert_eq!(resolved.output, "");
        assert_eq!(resolved.system_prompt, "You write landing pages.");
    }

    #[test]
    fn messages_skip_empty_sections() {
        let messages = PromptFields {
            structure: Some("Hero, CTA".to_string()),
            input: Some("Make it short".to_string()),
            ..Default::default()
        }
        .with_defaults(&defaults())
        .into_messages()
        .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(
            messages[0].content,
            "You write landing pages.\n\n## Knowledge base\nProduct: Acme"
        );
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(
            messages[1].content,
            "## Structure\nHero, CTA\n\n## Limitations\nNo emojis.\n\nMake it short"
        );
    }

    #[test]
    fn nothing_to_ask_yields_none() {
        let resolved = PromptFields {
            system_prompt: Some("sys".to_string()),
            ..Default::default()
        }
        .with_defaults(&BTreeMap::new());
        assert!(resolved.into_messages().is_none());
    }

    #[test]
    fn camel_case_body_deserializes() {
        let fields: PromptFields =
            serde_json::from_str(r#"{"knowledgeBase":"kb","systemPrompt":"sp"}"#).unwrap();
        assert_eq!(fields.knowledge_base.as_deref(), Some("kb"));
        assert_eq!(fields.system_prompt.as_deref(), Some("sp"));
    }
}
