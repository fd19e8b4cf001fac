use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::eval::ContextFormat;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub skill_tables: Vec<SkillTableConfig>,
    #[serde(default)]
    pub context_tables: Vec<ContextTableConfig>,
    #[serde(default)]
    pub binstubs: BinstubConfig,
    #[serde(default)]
    pub commit: CommitConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Append decision traces to `audit_log`.
    #[serde(default)]
    pub audit: bool,
    #[serde(default)]
    pub audit_log: String,
    /// Also log debug diagnostics to the audit log.
    #[serde(default)]
    pub debug: bool,
    /// Directory that relative reference documents resolve against.
    #[serde(default)]
    pub reference_root: String,
    #[serde(default)]
    pub context_format: ContextFormat,
}

/// An ordered rule table gating file edits on loaded capabilities.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SkillTableConfig {
    pub name: String,
    /// Tool names this table applies to.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Paths owned by another table: always allowed here.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub rules: Vec<SkillRuleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SkillRuleConfig {
    pub category: String,
    pub patterns: Vec<String>,
    pub capability: String,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// An ordered rule table injecting reference documents as context.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ContextTableConfig {
    pub name: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub rules: Vec<ContextRuleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ContextRuleConfig {
    pub category: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Case-insensitive prompt keywords that also trigger this rule.
    #[serde(default)]
    pub keywords: Vec<String>,
    pub documents: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct BinstubConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Directory (relative to the working directory) holding binstubs.
    #[serde(default)]
    pub dir: String,
    /// Commands never rewritten even when a binstub exists.
    #[serde(default)]
    pub ignore: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct CommitConfig {
    #[serde(default)]
    pub enabled: bool,
    /// The closed set of Conventional Commits type tokens.
    #[serde(default)]
    pub types: Vec<String>,
    /// Case-insensitive substrings that mark AI attribution.
    #[serde(default)]
    pub attribution_markers: Vec<String>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    skill_tables: Vec<SkillTableConfig>,
    #[serde(default)]
    context_tables: Vec<ContextTableConfig>,
    /// Drop default tables (skill or context) by name.
    #[serde(default)]
    remove_tables: Vec<String>,
    #[serde(default)]
    binstubs: BinstubOverlay,
    #[serde(default)]
    commit: CommitOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    audit: Option<bool>,
    audit_log: Option<String>,
    debug: Option<bool>,
    reference_root: Option<String>,
    context_format: Option<ContextFormat>,
}

#[derive(Debug, Deserialize, Default)]
struct BinstubOverlay {
    enabled: Option<bool>,
    dir: Option<String>,
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    ignore: Vec<String>,
    #[serde(default)]
    remove_ignore: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CommitOverlay {
    enabled: Option<bool>,
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    attribution_markers: Vec<String>,
    #[serde(default)]
    remove_types: Vec<String>,
    #[serde(default)]
    remove_attribution_markers: Vec<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

/// Tables addressed by name in an overlay.
trait Named {
    fn name(&self) -> &str;
}

impl Named for SkillTableConfig {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ContextTableConfig {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Drop removed tables, then replace same-named tables in place or append.
fn merge_tables<T: Named>(base: &mut Vec<T>, add: Vec<T>, remove: &[String]) {
    base.retain(|t| !remove.iter().any(|r| r == t.name()));
    for table in add {
        match base.iter_mut().find(|t| t.name() == table.name()) {
            Some(existing) => *existing = table,
            None => base.push(table),
        }
    }
}

/// Expand `~`, `$VAR` and `${VAR}` in a configured path.
///
/// Returns `None` for an empty value or an undefined variable.
pub fn expand_path(raw: &str) -> Option<PathBuf> {
    if raw.trim().is_empty() {
        return None;
    }
    match shellexpand::full(raw) {
        Ok(expanded) if !expanded.trim().is_empty() => Some(PathBuf::from(expanded.as_ref())),
        Ok(_) => None,
        Err(e) => {
            log::debug!("cannot expand {raw:?}: {e}");
            None
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/skill-gate/config.toml (if exists)
    ///
    /// A malformed overlay is skipped; its parse error is returned alongside
    /// the defaults so the caller can log it once logging is up.
    pub fn load() -> (Self, Option<String>) {
        let mut config = Self::default_config();
        let Some(path) = Self::overlay_path() else {
            return (config, None);
        };
        let Ok(content) = std::fs::read_to_string(&path) else {
            return (config, None);
        };
        match toml::from_str::<ConfigOverlay>(&content) {
            Ok(overlay) => {
                config.apply_overlay(overlay);
                (config, None)
            }
            Err(e) => (
                config,
                Some(format!("config parse error in {}: {e}", path.display())),
            ),
        }
    }

    /// ~/.config/skill-gate/config.toml
    fn overlay_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(std::path::Path::new(&home).join(".config/skill-gate/config.toml"))
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        let s = overlay.settings;
        if let Some(v) = s.audit {
            self.settings.audit = v;
        }
        if let Some(v) = s.audit_log {
            self.settings.audit_log = v;
        }
        if let Some(v) = s.debug {
            self.settings.debug = v;
        }
        if let Some(v) = s.reference_root {
            self.settings.reference_root = v;
        }
        if let Some(v) = s.context_format {
            self.settings.context_format = v;
        }

        // Rule tables
        merge_tables(
            &mut self.skill_tables,
            overlay.skill_tables,
            &overlay.remove_tables,
        );
        merge_tables(
            &mut self.context_tables,
            overlay.context_tables,
            &overlay.remove_tables,
        );

        // Binstubs
        let b = overlay.binstubs;
        if let Some(v) = b.enabled {
            self.binstubs.enabled = v;
        }
        if let Some(v) = b.dir {
            self.binstubs.dir = v;
        }
        merge_list(&mut self.binstubs.ignore, b.ignore, &b.remove_ignore, b.replace);

        // Commit
        let c = overlay.commit;
        if let Some(v) = c.enabled {
            self.commit.enabled = v;
        }
        merge_list(&mut self.commit.types, c.types, &c.remove_types, c.replace);
        merge_list(
            &mut self.commit.attribution_markers,
            c.attribution_markers,
            &c.remove_attribution_markers,
            c.replace,
        );
    }

    /// Render the merged configuration as TOML (for `--dump-config`).
    pub fn dump(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
