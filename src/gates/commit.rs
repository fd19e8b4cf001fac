//! Commit Message Validator: Conventional Commits subject grammar plus an
//! attribution check over the whole message.
//!
//! The validator is state-free. A message that cannot be read from the
//! command text is allowed; only a confidently extracted message is judged.

use regex::Regex;

use super::Gate;
use crate::config::CommitConfig;
use crate::eval::{Decision, GateEnv};
use crate::parse::{CommitMessage, ToolEvent, extract_commit_message, subject_line};

const EXAMPLES: &[&str] = &[
    "feat: Add user login",
    "fix(api): Handle empty payloads",
    "refactor!: Drop legacy session store",
];

pub struct CommitGate {
    types: Vec<String>,
    markers: Vec<String>,
    subject: Option<Regex>,
}

impl CommitGate {
    pub fn from_config(config: &CommitConfig) -> Self {
        let alternatives: Vec<String> = config.types.iter().map(|t| regex::escape(t)).collect();
        let pattern = format!(r"^({})(\([\w-]+\))?!?: .+$", alternatives.join("|"));
        let subject = match Regex::new(&pattern) {
            Ok(re) if !alternatives.is_empty() => Some(re),
            Ok(_) => None,
            Err(e) => {
                log::warn!("commit subject grammar disabled: {e}");
                None
            }
        };
        Self {
            types: config.types.clone(),
            markers: config
                .attribution_markers
                .iter()
                .map(|m| m.to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
            subject,
        }
    }

    /// Whether a subject line satisfies the grammar.
    pub fn subject_ok(&self, subject: &str) -> bool {
        self.subject.as_ref().is_none_or(|re| re.is_match(subject))
    }

    /// The first attribution marker found anywhere in the message.
    pub fn attribution(&self, message: &str) -> Option<&str> {
        let lower = message.to_lowercase();
        self.markers
            .iter()
            .find(|m| lower.contains(m.as_str()))
            .map(String::as_str)
    }

    fn grammar_message(&self, subject: &str) -> String {
        let examples: Vec<String> = EXAMPLES.iter().map(|e| format!("  {e}")).collect();
        format!(
            "BLOCKED: commit subject does not follow Conventional Commits.\n\
             \n\
             Subject:\n  {subject}\n\
             \n\
             Expected:\n  type(scope)!: description\n\
             \n\
             type is one of: {types}\n\
             (scope) and ! are optional; a description must follow \": \".\n\
             \n\
             Examples:\n{examples}",
            types = self.types.join(", "),
            examples = examples.join("\n"),
        )
    }

    fn attribution_message(marker: &str) -> String {
        format!(
            "BLOCKED: commit message contains AI attribution ({marker:?}).\n\
             \n\
             Remove co-author trailers and \"generated with\" lines, then commit again."
        )
    }

    /// Judge an extracted commit message.
    pub fn check_message(&self, message: &str) -> Decision {
        let subject = subject_line(message);
        let grammar = (!self.subject_ok(subject)).then(|| self.grammar_message(subject));
        let attribution = self.attribution(message).map(Self::attribution_message);

        match (grammar, attribution) {
            (None, None) => Decision::allow("valid"),
            (Some(g), None) => Decision::deny("bad-subject", g),
            (None, Some(a)) => Decision::deny("ai-attribution", a),
            (Some(g), Some(a)) => Decision::deny("bad-subject+ai-attribution", format!("{g}\n\n{a}")),
        }
    }
}

impl Gate for CommitGate {
    fn name(&self) -> &str {
        "commit-validator"
    }

    fn handles(&self, event: &ToolEvent) -> bool {
        event.tool_name == "Bash"
    }

    fn evaluate(&self, event: &ToolEvent, _env: &GateEnv) -> Decision {
        let Some(command) = event.command.as_deref() else {
            return Decision::allow("no-command");
        };
        match extract_commit_message(command) {
            CommitMessage::NotCommit => Decision::allow("not-commit"),
            CommitMessage::Unresolved => Decision::allow("message-unresolved"),
            CommitMessage::Literal(message) => self.check_message(&message),
        }
    }
}
