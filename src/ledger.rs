//! Capability ledger: which skills the session transcript says were loaded.
//!
//! The transcript is append-only, so a capability is never unloaded: once a
//! loading marker appears anywhere in it, the capability counts as loaded.
//! Nothing is cached across invocations; each hook process scans afresh.

use std::cell::OnceCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Read-only view answering "has this capability been loaded?".
pub trait CapabilityLedger {
    fn is_loaded(&self, capability: &str) -> bool;
}

/// Matches `"skill": "<id>"`, tolerant of whitespace and of the
/// backslash-escaped quotes a re-serialized tool call carries.
fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\\*"skill\\*"\s*:\s*\\*"([^"\\\s]+)\\*""#).expect("valid skill marker regex")
    })
}

/// Collect every capability id named by a loading marker in `text`.
pub fn scan_markers(text: &str) -> HashSet<String> {
    marker_regex()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// True if `loaded` contains `capability`, or its bare name when the
/// capability is namespaced (`ns:name` is satisfied by a `name` load).
fn contains_capability(loaded: &HashSet<String>, capability: &str) -> bool {
    if loaded.contains(capability) {
        return true;
    }
    match capability.split_once(':') {
        Some((_, name)) => loaded.contains(name),
        None => false,
    }
}

/// Ledger backed by a transcript file, scanned lazily at most once.
///
/// A missing path or unreadable file yields an empty ledger: an unreadable
/// transcript must not grant access.
#[derive(Debug, Default)]
pub struct TranscriptLedger {
    path: Option<PathBuf>,
    loaded: OnceCell<HashSet<String>>,
}

impl TranscriptLedger {
    /// Ledger over the transcript at `path` (None or empty means no transcript).
    pub fn open(path: Option<&str>) -> Self {
        Self {
            path: path.filter(|p| !p.is_empty()).map(PathBuf::from),
            loaded: OnceCell::new(),
        }
    }

    /// Ledger over transcript text already in memory.
    pub fn from_text(text: &str) -> Self {
        let loaded = OnceCell::new();
        let _ = loaded.set(scan_markers(text));
        Self { path: None, loaded }
    }

    /// The set of loaded capability ids.
    pub fn loaded(&self) -> &HashSet<String> {
        self.loaded.get_or_init(|| match &self.path {
            Some(path) => read_markers(path),
            None => HashSet::new(),
        })
    }
}

fn read_markers(path: &Path) -> HashSet<String> {
    match std::fs::read(path) {
        Ok(bytes) => scan_markers(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            log::debug!("transcript {} unreadable: {e}", path.display());
            HashSet::new()
        }
    }
}

impl CapabilityLedger for TranscriptLedger {
    fn is_loaded(&self, capability: &str) -> bool {
        contains_capability(self.loaded(), capability)
    }
}

impl CapabilityLedger for HashSet<String> {
    fn is_loaded(&self, capability: &str) -> bool {
        contains_capability(self, capability)
    }
}

/// One-shot query: is `capability` loaded according to the transcript at
/// `transcript_path`? False when the path is empty or the file is missing.
pub fn is_loaded(capability: &str, transcript_path: &str) -> bool {
    TranscriptLedger::open(Some(transcript_path)).is_loaded(capability)
}
