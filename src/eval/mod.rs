pub mod context;
pub mod decision;

pub use context::GateEnv;
pub use decision::{ContextFormat, Decision, Verdict};

use crate::config::{Config, expand_path};
use crate::gates::Gate;
use crate::parse::ToolEvent;

/// Gate name used for audit records the engine writes itself.
const ENGINE: &str = "engine";

/// Ordered set of gates built from configuration.
pub struct GateRegistry {
    gates: Vec<Box<dyn Gate>>,
    context_format: ContextFormat,
}

impl GateRegistry {
    /// Build the registry from configuration, in config order: skill tables,
    /// context tables, then the binstub and commit gates if enabled.
    pub fn from_config(config: &Config) -> Self {
        use crate::gates::{
            binstub::BinstubGate, commit::CommitGate, context::ContextGate, skill::SkillGate,
        };

        let mut gates: Vec<Box<dyn Gate>> = Vec::new();

        for table in &config.skill_tables {
            gates.push(Box::new(SkillGate::from_config(table)));
        }

        // An unexpandable reference root disables relative documents only
        let reference_root = expand_path(&config.settings.reference_root);
        for table in &config.context_tables {
            gates.push(Box::new(ContextGate::from_config(table, reference_root.clone())));
        }

        if config.binstubs.enabled {
            gates.push(Box::new(BinstubGate::from_config(&config.binstubs)));
        }
        if config.commit.enabled {
            gates.push(Box::new(CommitGate::from_config(&config.commit)));
        }

        Self {
            gates,
            context_format: config.settings.context_format,
        }
    }

    /// Keep only the named gates (in registry order). Empty keeps all.
    /// Unknown names are logged and ignored.
    pub fn select(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        for name in names {
            if !self.gates.iter().any(|g| g.name() == name) {
                log::warn!("unknown gate {name:?}");
            }
        }
        self.gates.retain(|g| names.iter().any(|n| n == g.name()));
    }

    /// Names of the registered gates, in evaluation order.
    pub fn gate_names(&self) -> Vec<&str> {
        self.gates.iter().map(|g| g.name()).collect()
    }

    pub fn context_format(&self) -> ContextFormat {
        self.context_format
    }

    /// Evaluate an event against every gate that handles it.
    ///
    /// The first DENY terminates evaluation. Context from several gates is
    /// concatenated in gate order.
    pub fn evaluate(&self, event: &ToolEvent, env: &GateEnv) -> Decision {
        let subject = event.subject();

        if event.tool_name == "Skill" {
            let skill = event.loaded_skill.as_deref().unwrap_or("unknown");
            let decision = Decision::allow(format!("skill-loaded:{skill}"));
            env.audit.record(ENGINE, &decision, &subject);
            return decision;
        }

        if event.has_no_subject() {
            let decision = Decision::allow("no-subject");
            env.audit.record(ENGINE, &decision, &subject);
            return decision;
        }

        let mut contexts: Vec<String> = Vec::new();
        let mut reasons: Vec<String> = Vec::new();
        for gate in self.gates.iter().filter(|g| g.handles(event)) {
            let decision = gate.evaluate(event, env);
            env.audit.record(gate.name(), &decision, &subject);
            if decision.is_deny() {
                return decision;
            }
            if let Some(context) = decision.context {
                reasons.push(decision.reason);
                contexts.push(context);
            }
        }

        if contexts.is_empty() {
            Decision::allow("allowed")
        } else {
            Decision::with_context(reasons.join(","), contexts.join("\n\n"))
        }
    }
}
