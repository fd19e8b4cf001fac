//! Context injection: matched file types (or prompt keywords) pull
//! reference documents into the session instead of blocking.

use std::path::{Path, PathBuf};

use super::Gate;
use super::matcher::{Classification, Rule, RuleTable};
use crate::config::{ContextTableConfig, expand_path};
use crate::eval::{Decision, GateEnv};
use crate::parse::ToolEvent;

/// What a context rule injects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextAction {
    /// Lowercased prompt keywords.
    keywords: Vec<String>,
    documents: Vec<String>,
}

pub struct ContextGate {
    name: String,
    tools: Vec<String>,
    table: RuleTable<ContextAction>,
    reference_root: Option<PathBuf>,
}

impl ContextGate {
    pub fn from_config(config: &ContextTableConfig, reference_root: Option<PathBuf>) -> Self {
        let rules = config
            .rules
            .iter()
            .map(|r| {
                let action = ContextAction {
                    keywords: r.keywords.iter().map(|k| k.to_lowercase()).collect(),
                    documents: r.documents.clone(),
                };
                Rule::new(&r.category, &r.patterns, &[], action)
            })
            .collect();
        Self {
            name: config.name.clone(),
            tools: config.tools.clone(),
            table: RuleTable::new(&config.exclude, rules),
            reference_root,
        }
    }

    /// Rules triggered by the event: the first path match, or every rule
    /// with a keyword in the prompt.
    fn triggered(&self, event: &ToolEvent) -> Vec<&Rule<ContextAction>> {
        if let Some(path) = event.file_path.as_deref() {
            return match self.table.classify(path) {
                Classification::Matched(rule) => vec![rule],
                _ => Vec::new(),
            };
        }
        let Some(prompt) = event.user_prompt.as_deref() else {
            return Vec::new();
        };
        let prompt = prompt.to_lowercase();
        self.table
            .rules()
            .iter()
            .filter(|r| r.action.keywords.iter().any(|k| prompt.contains(k.as_str())))
            .collect()
    }

    /// Resolve a configured document path against the reference root.
    fn resolve(&self, document: &str) -> Option<PathBuf> {
        let path = expand_path(document)?;
        if path.is_absolute() {
            return Some(path);
        }
        self.reference_root.as_deref().map(|root| root.join(path))
    }

    /// Read every resolvable document, skipping unreadable ones.
    fn load_documents(&self, documents: &[&str]) -> Vec<String> {
        documents
            .iter()
            .filter_map(|doc| self.resolve(doc))
            .filter_map(|path| read_document(&path))
            .collect()
    }
}

fn read_document(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => Some(text.trim_end().to_string()),
        Ok(_) => None,
        Err(e) => {
            log::debug!("reference {} unreadable: {e}", path.display());
            None
        }
    }
}

impl Gate for ContextGate {
    fn name(&self) -> &str {
        &self.name
    }

    fn handles(&self, event: &ToolEvent) -> bool {
        self.tools.iter().any(|t| t == &event.tool_name)
    }

    fn evaluate(&self, event: &ToolEvent, _env: &GateEnv) -> Decision {
        let rules = self.triggered(event);
        if rules.is_empty() {
            return Decision::allow("no-match");
        }

        let mut documents: Vec<&str> = Vec::new();
        for rule in &rules {
            for doc in &rule.action.documents {
                if !documents.contains(&doc.as_str()) {
                    documents.push(doc);
                }
            }
        }
        let categories: Vec<&str> = rules.iter().map(|r| r.category.as_str()).collect();

        let texts = self.load_documents(&documents);
        if texts.is_empty() {
            return Decision::allow(format!("context-unavailable:{}", categories.join(",")));
        }
        Decision::with_context(
            format!("context:{}", categories.join(",")),
            texts.join("\n\n"),
        )
    }
}
