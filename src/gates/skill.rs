//! Capability gate: file edits of a classified kind require a loaded skill.

use super::Gate;
use super::matcher::{Classification, Rule, RuleTable};
use crate::config::SkillTableConfig;
use crate::eval::{Decision, GateEnv};
use crate::parse::ToolEvent;

/// Gate built from one `[[skill_tables]]` entry.
///
/// Evaluation order for a file path:
/// 1. No matching rule → ALLOW
/// 2. Matching rule excluded (owned by another table) → ALLOW
/// 3. Required capability loaded → ALLOW
/// 4. Otherwise → DENY with remediation
pub struct SkillGate {
    name: String,
    tools: Vec<String>,
    table: RuleTable<String>,
}

impl SkillGate {
    pub fn from_config(config: &SkillTableConfig) -> Self {
        let rules = config
            .rules
            .iter()
            .map(|r| Rule::new(&r.category, &r.patterns, &r.exclude, r.capability.clone()))
            .collect();
        Self {
            name: config.name.clone(),
            tools: config.tools.clone(),
            table: RuleTable::new(&config.exclude, rules),
        }
    }
}

/// DENY text: which capability to load, and not to blindly retry.
pub fn remediation(path: &str, category: &str, capability: &str) -> String {
    format!(
        "BLOCKED: {path} is a {category} file governed by the `{capability}` skill, \
         which has not been loaded in this session.\n\
         \n\
         Before editing this file:\n  \
         1. Stop. Do not retry this edit as-is.\n  \
         2. Load the skill: invoke the Skill tool with skill \"{capability}\".\n  \
         3. Re-read the conventions it describes.\n  \
         4. Reconsider the edit against those conventions, then make it again."
    )
}

impl Gate for SkillGate {
    fn name(&self) -> &str {
        &self.name
    }

    fn handles(&self, event: &ToolEvent) -> bool {
        self.tools.iter().any(|t| t == &event.tool_name)
    }

    fn evaluate(&self, event: &ToolEvent, env: &GateEnv) -> Decision {
        let Some(path) = event.file_path.as_deref() else {
            return Decision::allow("no-file");
        };

        match self.table.classify(path) {
            Classification::NoMatch => Decision::allow("no-match"),
            Classification::Excluded { category } => {
                Decision::allow(format!("excluded:{category}"))
            }
            Classification::Matched(rule) => {
                let capability = &rule.action;
                if env.ledger.is_loaded(capability) {
                    Decision::allow(format!("loaded:{capability}"))
                } else {
                    Decision::deny(
                        format!("not-loaded:{capability}"),
                        remediation(path, &rule.category, capability),
                    )
                }
            }
        }
    }
}
