use std::path::Path;

use crate::audit::AuditSink;
use crate::ledger::CapabilityLedger;

/// Per-invocation environment shared by every gate.
pub struct GateEnv<'a> {
    /// Which capabilities the session has loaded.
    pub ledger: &'a dyn CapabilityLedger,
    /// Working directory that `bin/<name>` probes resolve against.
    pub cwd: &'a Path,
    /// Where decision traces go.
    pub audit: &'a dyn AuditSink,
}
