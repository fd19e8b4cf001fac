//! Command Rewriter: prefer project binstubs over `bundle exec` and bare tools.
//!
//! For each segment of a (possibly compound) Bash command:
//! - `bundle exec <name> <args>` with an executable `bin/<name>` → DENY,
//!   suggest `bin/<name> <args>`. No binstub → ALLOW.
//! - bare `<name> <args>` with an executable `bin/<name>` → DENY, same
//!   suggestion.
//!
//! Tokens containing `/` (e.g. `bin/rspec`, `./bin/rails`) are never
//! rewritten, so an already-correct command is never flagged again.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::Gate;
use crate::config::BinstubConfig;
use crate::eval::{Decision, GateEnv};
use crate::parse::{ToolEvent, split_commands, split_env_prefix, try_tokenize};

/// Leading assignments, optional `bundle exec`, the command word, the rest.
fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?s)\s*((?:[A-Za-z_][A-Za-z0-9_]*=\S*\s+)*)(bundle\s+exec\s+)?(\S+)(.*)$")
            .expect("static regex")
    })
}

/// A segment that should run through a binstub instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub name: String,
    pub original: String,
    pub suggestion: String,
}

pub struct BinstubGate {
    dir: String,
    ignore: Vec<String>,
}

impl BinstubGate {
    pub fn from_config(config: &BinstubConfig) -> Self {
        let dir = config.dir.trim_end_matches('/');
        Self {
            dir: if dir.is_empty() { "bin" } else { dir }.to_string(),
            ignore: config.ignore.clone(),
        }
    }

    fn binstub_path(&self, cwd: &Path, name: &str) -> PathBuf {
        cwd.join(&self.dir).join(name)
    }

    /// Check one command segment.
    pub fn check_segment(&self, segment: &str, cwd: &Path) -> Option<Rewrite> {
        let words = try_tokenize(segment)?;
        let (env, rest) = split_env_prefix(&words);
        let (name, args) = match rest {
            [bundle, exec, name, args @ ..] if bundle == "bundle" && exec == "exec" => {
                (name, args)
            }
            [bundle, exec] if bundle == "bundle" && exec == "exec" => return None,
            [name, args @ ..] => (name, args),
            [] => return None,
        };

        if name.contains('/') || self.ignore.iter().any(|i| i == name) {
            return None;
        }
        if !is_executable(&self.binstub_path(cwd, name)) {
            return None;
        }

        let binstub = format!("{}/{name}", self.dir);
        let suggestion = rewrite_text(segment, name, &binstub).unwrap_or_else(|| {
            let mut parts: Vec<&str> = env.iter().map(String::as_str).collect();
            parts.push(&binstub);
            parts.extend(args.iter().map(String::as_str));
            parts.join(" ")
        });

        Some(Rewrite {
            name: name.clone(),
            original: segment.trim().to_string(),
            suggestion,
        })
    }
}

/// Rewrite the segment text in place so quoting in the arguments survives.
fn rewrite_text(segment: &str, name: &str, binstub: &str) -> Option<String> {
    let caps = segment_regex().captures(segment)?;
    if &caps[3] != name {
        return None;
    }
    let env = caps.get(1).map_or("", |m| m.as_str());
    let rest = caps.get(4).map_or("", |m| m.as_str());
    Some(format!("{env}{binstub}{}", rest.trim_end()))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn message(rewrite: &Rewrite) -> String {
    format!(
        "BLOCKED: this project ships a binstub for `{name}`.\n\
         \n\
         Instead of:\n  {original}\n\
         \n\
         Run instead:\n  {suggestion}\n\
         \n\
         Binstubs pin the tool to the project's dependency versions.",
        name = rewrite.name,
        original = rewrite.original,
        suggestion = rewrite.suggestion,
    )
}

impl Gate for BinstubGate {
    fn name(&self) -> &str {
        "binstubs"
    }

    fn handles(&self, event: &ToolEvent) -> bool {
        event.tool_name == "Bash"
    }

    fn evaluate(&self, event: &ToolEvent, env: &GateEnv) -> Decision {
        let Some(command) = event.command.as_deref() else {
            return Decision::allow("no-command");
        };
        let chain = split_commands(command);
        if chain.is_compound() {
            log::debug!("binstub check over {}", chain.describe());
        }
        match chain
            .segments
            .iter()
            .find_map(|segment| self.check_segment(segment, env.cwd))
        {
            Some(rewrite) => Decision::deny(format!("binstub:{}", rewrite.name), message(&rewrite)),
            None => Decision::allow("no-binstub"),
        }
    }
}
