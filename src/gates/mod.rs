//! Gates: independent policies evaluated against one tool event.
//!
//! Each gate decides whether it applies to an event (`handles`) and, if so,
//! returns a [`Decision`]. Gates are data-driven where possible: rule tables
//! and command lists come from configuration.

/// Rewrites `bundle exec <tool>` and bare tools to project binstubs.
pub mod binstub;
/// Conventional Commits subject grammar and AI attribution check.
pub mod commit;
/// Reference document injection by file type or prompt keyword.
pub mod context;
/// Ordered glob rule tables shared by the table-driven gates.
pub mod matcher;
/// Capability gate: edits require the owning skill to be loaded.
pub mod skill;

use crate::eval::{Decision, GateEnv};
use crate::parse::ToolEvent;

/// Trait for gate policies.
///
/// A gate never fails: anything it cannot interpret is an ALLOW.
pub trait Gate: Send + Sync {
    /// Name used for gate selection and the audit trail.
    fn name(&self) -> &str;
    /// Whether this gate applies to the event's tool.
    fn handles(&self, event: &ToolEvent) -> bool;
    /// Evaluate the event and return a decision.
    fn evaluate(&self, event: &ToolEvent, env: &GateEnv) -> Decision;
}
