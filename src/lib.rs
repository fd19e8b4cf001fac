//! skill-gate: hook gates for Claude Code sessions working on Ruby and Rails code.
//!
//! One binary, invoked once per hook event, reads a JSON event on stdin and
//! answers with an exit code: `0` allows (optionally printing context to
//! inject), `2` denies with a remediation message on stderr. Any internal
//! failure allows.
//!
//! # Architecture
//!
//! - **[`parse`]**: event decoding, shell tokenizing, compound-command splitting, commit message extraction.
//! - **[`ledger`]**: which skills the session has loaded, read from the transcript.
//! - **[`gates`]**: the policies (skill tables, context injection, binstubs, commit validator).
//! - **[`eval`]**: decision types and the gate registry that runs the policies.
//! - **[`config`]**: embedded defaults + user overlay merge.
//! - **[`audit`]**: decision trail through `log`, written by `simplelog`.

/// Audit sinks and the audit log file logger.
pub mod audit;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Failure taxonomy for decoding hook input.
pub mod error;
/// Decision types, gate registry, per-invocation environment.
pub mod eval;
/// Gate trait and the built-in gates.
pub mod gates;
/// Capability ledger over the session transcript.
pub mod ledger;
/// Event decoding and shell command parsing.
pub mod parse;

use std::path::Path;

use eval::{Decision, GateEnv, GateRegistry};

/// Decode a hook payload and evaluate it against the default configuration.
///
/// This is the main entry point for tests and simple usage: the transcript
/// named in the event is the ledger, `cwd` is where binstubs are probed, and
/// nothing is audited. Undecodable input is an ALLOW.
pub fn evaluate(input: &str, cwd: &Path) -> Decision {
    let event = match parse::ToolEvent::decode(input) {
        Ok(event) => event,
        Err(e) => return Decision::allow(format!("fail-open: {e}")),
    };
    let config = config::Config::default_config();
    let registry = GateRegistry::from_config(&config);
    let ledger = ledger::TranscriptLedger::open(event.transcript_path.as_deref());
    let env = GateEnv {
        ledger: &ledger,
        cwd,
        audit: &audit::NullAudit,
    };
    registry.evaluate(&event, &env)
}
