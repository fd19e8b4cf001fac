/// Outcome class of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verdict {
    Allow,
    AllowWithContext,
    Deny,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Allow => "allow",
            Verdict::AllowWithContext => "context",
            Verdict::Deny => "deny",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Allow => "ALLOW",
            Verdict::AllowWithContext => "ALLOW+CONTEXT",
            Verdict::Deny => "DENY",
        }
    }

    /// Process exit code: 2 blocks the tool call, 0 lets it proceed.
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Deny => 2,
            Verdict::Allow | Verdict::AllowWithContext => 0,
        }
    }
}

/// The result of one gate evaluation. Computed per invocation, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    /// Short branch tag for the audit log (e.g. `"not-loaded"`).
    pub reason: String,
    /// Remediation text written to stderr on DENY.
    pub message: Option<String>,
    /// Reference text injected on ALLOW_WITH_CONTEXT.
    pub context: Option<String>,
}

impl Decision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Allow,
            reason: reason.into(),
            message: None,
            context: None,
        }
    }

    pub fn deny(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Deny,
            reason: reason.into(),
            message: Some(message.into()),
            context: None,
        }
    }

    pub fn with_context(reason: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::AllowWithContext,
            reason: reason.into(),
            message: None,
            context: Some(context.into()),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.verdict.exit_code()
    }

    pub fn is_deny(&self) -> bool {
        self.verdict == Verdict::Deny
    }
}

/// How injected context is written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextFormat {
    /// Raw text, consumed as session context.
    #[default]
    Text,
    /// `{"additionalContext": "<text>"}`.
    Json,
}

impl ContextFormat {
    /// Render a context payload for stdout.
    pub fn render(self, context: &str) -> String {
        match self {
            ContextFormat::Text => context.to_string(),
            ContextFormat::Json => {
                serde_json::json!({ "additionalContext": context }).to_string()
            }
        }
    }
}
