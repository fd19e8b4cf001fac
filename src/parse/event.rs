//! Event decoder: one JSON hook payload on stdin → one [`ToolEvent`].

use serde::Deserialize;

use crate::error::GateError;

/// Tool name given to prompt-submission events, which carry no `tool_name`.
pub const USER_PROMPT_SUBMIT: &str = "UserPromptSubmit";

/// Raw hook payload. Every field is optional; extra fields are ignored.
#[derive(Debug, Default, Deserialize)]
struct HookInput {
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    tool_input: Option<ToolInput>,
    #[serde(default)]
    transcript_path: Option<String>,
    #[serde(default)]
    hook_event_name: Option<String>,
    #[serde(default, alias = "prompt")]
    user_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolInput {
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    notebook_path: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    skill: Option<String>,
}

/// One decoded hook invocation. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolEvent {
    /// e.g. "Edit", "Write", "Bash", "Skill", or [`USER_PROMPT_SUBMIT`].
    pub tool_name: String,
    /// Target file for Edit/Write/MultiEdit/NotebookEdit.
    pub file_path: Option<String>,
    /// Shell command text for Bash.
    pub command: Option<String>,
    /// Capability named by a Skill invocation.
    pub loaded_skill: Option<String>,
    /// Session transcript used as the capability ledger.
    pub transcript_path: Option<String>,
    /// Free text of a prompt submission.
    pub user_prompt: Option<String>,
}

/// Treat empty strings the same as absent keys.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ToolEvent {
    /// Decode a hook payload.
    ///
    /// Missing keys default to absent. Empty input, invalid JSON and a
    /// missing `tool_name` are errors, which the caller turns into ALLOW.
    pub fn decode(input: &str) -> Result<Self, GateError> {
        if input.trim().is_empty() {
            return Err(GateError::EmptyInput);
        }
        let raw: HookInput = serde_json::from_str(input)?;
        let tool = raw.tool_input.unwrap_or_default();

        let tool_name = match non_empty(raw.tool_name) {
            Some(name) => name,
            None if raw.hook_event_name.as_deref() == Some(USER_PROMPT_SUBMIT) => {
                USER_PROMPT_SUBMIT.to_string()
            }
            None => return Err(GateError::MissingToolName),
        };

        let loaded_skill = if tool_name == "Skill" {
            non_empty(tool.skill)
        } else {
            None
        };

        Ok(Self {
            tool_name,
            file_path: non_empty(tool.file_path).or_else(|| non_empty(tool.notebook_path)),
            command: non_empty(tool.command),
            loaded_skill,
            transcript_path: non_empty(raw.transcript_path),
            user_prompt: non_empty(raw.user_prompt),
        })
    }

    /// True when the event has neither a file path, a command, nor a prompt.
    pub fn has_no_subject(&self) -> bool {
        self.file_path.is_none() && self.command.is_none() && self.user_prompt.is_none()
    }

    /// Short description of what the event targets, for audit lines.
    pub fn subject(&self) -> String {
        let text = self
            .file_path
            .as_deref()
            .or(self.command.as_deref())
            .or(self.loaded_skill.as_deref())
            .or(self.user_prompt.as_deref())
            .unwrap_or("-");
        text.replace('\n', " ").chars().take(200).collect()
    }
}
