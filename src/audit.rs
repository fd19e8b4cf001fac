//! Audit trail: one line per decision branch, appended to a log file.
//!
//! Best-effort only. The log is never read back as control input, and a
//! failure to open it must never affect the hook's decision.

use std::path::Path;
use std::sync::Mutex;

use log::LevelFilter;

use crate::eval::{Decision, Verdict};

/// `log` target used for audit records.
pub const AUDIT_TARGET: &str = "skill_gate::audit";

/// Destination for decision traces.
pub trait AuditSink {
    /// Record the decision a gate reached for an event subject.
    fn record(&self, gate: &str, decision: &Decision, subject: &str);
}

/// Forwards audit records through the `log` facade.
///
/// Records go wherever the installed logger sends them; see [`init_file_logger`].
pub struct LogAudit;

impl AuditSink for LogAudit {
    fn record(&self, gate: &str, decision: &Decision, subject: &str) {
        // Compact single-line subject for the log
        let subject: String = subject.replace('\n', " ").chars().take(200).collect();
        log::info!(
            target: AUDIT_TARGET,
            "{gate}\t{verdict}\t{reason}\t{subject}",
            verdict = decision.verdict.as_str(),
            reason = decision.reason,
        );
    }
}

/// Discards every record.
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&self, _gate: &str, _decision: &Decision, _subject: &str) {}
}

/// One captured audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub gate: String,
    pub verdict: Verdict,
    pub reason: String,
    pub subject: String,
}

/// Keeps records in memory, for tests and embedding.
#[derive(Default)]
pub struct MemoryAudit {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, gate: &str, decision: &Decision, subject: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(AuditEntry {
                gate: gate.to_string(),
                verdict: decision.verdict,
                reason: decision.reason.clone(),
                subject: subject.to_string(),
            });
        }
    }
}

/// Install a `simplelog` file logger appending to `path`.
///
/// Each line carries an RFC 3339 timestamp. Returns false (and leaves
/// logging disabled) if the file cannot be opened or a logger is already set.
pub fn init_file_logger(path: &Path, debug: bool) -> bool {
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    else {
        return false;
    };

    let config = simplelog::ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off)
        .build();
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    simplelog::WriteLogger::init(level, config, file).is_ok()
}
