use std::io::Write;
use std::path::Path;

use skill_gate::audit::{MemoryAudit, NullAudit};
use skill_gate::config::Config;
use skill_gate::eval::{Decision, GateEnv, GateRegistry, Verdict};
use skill_gate::ledger::TranscriptLedger;
use skill_gate::parse::ToolEvent;

fn decision_for(input: &str) -> Decision {
    skill_gate::evaluate(input, Path::new("/nonexistent"))
}

fn edit_json(path: &str, transcript: &Path) -> String {
    serde_json::json!({
        "tool_name": "Edit",
        "tool_input": { "file_path": path },
        "transcript_path": transcript,
    })
    .to_string()
}

fn bash_json(command: &str) -> String {
    serde_json::json!({
        "tool_name": "Bash",
        "tool_input": { "command": command },
    })
    .to_string()
}

fn transcript(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

macro_rules! decision_test {
    ($name:ident, $input:expr, $verdict:ident) => {
        #[test]
        fn $name() {
            let input = $input;
            assert_eq!(decision_for(&input).verdict, Verdict::$verdict, "input: {input}");
        }
    };
}

// ── Fail-open: malformed input is always ALLOW ──

decision_test!(failopen_empty, "", Allow);
decision_test!(failopen_whitespace, "  \n ", Allow);
decision_test!(failopen_not_json, "not json at all", Allow);
decision_test!(failopen_truncated, r#"{"tool_name":"Edit","tool_input":{"#, Allow);
decision_test!(failopen_array, "[1, 2, 3]", Allow);
decision_test!(failopen_missing_tool, r#"{"tool_input":{"file_path":"spec/a_spec.rb"}}"#, Allow);
decision_test!(failopen_wrong_types, r#"{"tool_name":42}"#, Allow);

// ── Unclassified events are not our concern ──

decision_test!(allow_read_tool, r#"{"tool_name":"Read","tool_input":{"file_path":"spec/a_spec.rb"}}"#, Allow);
decision_test!(allow_markdown, r#"{"tool_name":"Edit","tool_input":{"file_path":"README.md"}}"#, Allow);
decision_test!(allow_no_file, r#"{"tool_name":"Edit","tool_input":{}}"#, Allow);
decision_test!(allow_plain_bash, bash_json("ls -la"), Allow);
decision_test!(allow_skill_event, r#"{"tool_name":"Skill","tool_input":{"skill":"ruby-conventions:ruby-testing"}}"#, Allow);

// ── Capability gating without a transcript ──

decision_test!(deny_spec_no_transcript, r#"{"tool_name":"Edit","tool_input":{"file_path":"spec/user_spec.rb"}}"#, Deny);
decision_test!(deny_gemfile_no_transcript, r#"{"tool_name":"Write","tool_input":{"file_path":"/p/Gemfile"}}"#, Deny);
decision_test!(deny_controller_no_transcript, r#"{"tool_name":"MultiEdit","tool_input":{"file_path":"app/controllers/users_controller.rb"}}"#, Deny);
decision_test!(deny_missing_transcript_file, r#"{"tool_name":"Edit","tool_input":{"file_path":"lib/x.rb"},"transcript_path":"/nonexistent/t.jsonl"}"#, Deny);

// ── Commit grammar ──

decision_test!(commit_feat, bash_json(r#"git commit -m "feat: Add x""#), Allow);
decision_test!(commit_scoped_fix, bash_json(r#"git commit -m "fix(api): Handle y""#), Allow);
decision_test!(commit_breaking, bash_json(r#"git commit -m "refactor!: Drop z""#), Allow);
decision_test!(commit_missing_colon, bash_json(r#"git commit -m "feat Add x""#), Deny);
decision_test!(commit_bad_type, bash_json(r#"git commit -m "feature: Add x""#), Deny);
decision_test!(commit_no_description, bash_json(r#"git commit -m "feat: ""#), Deny);
decision_test!(commit_after_add, bash_json(r#"git add -A && git commit -m "Added user login""#), Deny);
decision_test!(commit_editor, bash_json("git commit"), Allow);
decision_test!(commit_amend_no_edit, bash_json("git commit --amend --no-edit"), Allow);
decision_test!(commit_signing_key_cluster, bash_json("git commit -Smykey -m 'feat: Add x'"), Allow);
decision_test!(commit_signing_key_bad_subject, bash_json("git commit -Smykey -m 'Added x'"), Deny);
decision_test!(
    commit_heredoc_after_scratch_heredoc,
    bash_json("cat > notes.txt <<EOF\nscratch notes\nEOF\ngit commit -m \"$(cat <<'MSG'\nfeat: Add login\nMSG\n)\""),
    Allow
);
decision_test!(
    commit_heredoc_bad_subject_after_scratch_heredoc,
    bash_json("cat > notes.txt <<EOF\nfeat: Add notes\nEOF\ngit commit -m \"$(cat <<'MSG'\nAdded login\nMSG\n)\""),
    Deny
);

// ── Concrete scenarios ──

#[test]
fn scenario_spec_edit_without_testing_skill() {
    let t = transcript(r#"{"type":"user","message":"hello"}"#);
    let d = decision_for(&edit_json("spec/user_spec.rb", t.path()));
    assert_eq!(d.exit_code(), 2);
    assert!(d.message.unwrap().contains("ruby-conventions:ruby-testing"));
}

#[test]
fn scenario_spec_edit_with_testing_skill() {
    let t = transcript(r#"{"input": {"skill": "ruby-conventions:ruby-testing"}}"#);
    let d = decision_for(&edit_json("spec/user_spec.rb", t.path()));
    assert_eq!(d.exit_code(), 0);
}

#[test]
fn scenario_bundle_exec_with_binstub() {
    let dir = rails_project();
    let d = skill_gate::evaluate(&bash_json("bundle exec rspec spec/models"), dir.path());
    assert_eq!(d.exit_code(), 2);
    assert!(d.message.unwrap().contains("bin/rspec spec/models"));
}

#[test]
fn scenario_bundle_exec_without_binstub() {
    let dir = tempfile::tempdir().unwrap();
    let d = skill_gate::evaluate(&bash_json("bundle exec rspec spec/models"), dir.path());
    assert_eq!(d.exit_code(), 0);
}

#[test]
fn scenario_commit_wrong_type() {
    assert_eq!(decision_for(&bash_json(r#"git commit -m "Added user login""#)).exit_code(), 2);
}

#[test]
fn scenario_commit_valid() {
    assert_eq!(decision_for(&bash_json(r#"git commit -m "feat(auth): Add login flow""#)).exit_code(), 0);
}

// ── Properties ──

#[test]
fn exclusion_precedence_for_rails_paths() {
    // The Ruby table never claims Rails-owned paths, whatever is loaded
    let t = transcript(r#""skill": "rails-conventions:rails-models""#);
    let d = decision_for(&edit_json("app/models/user.rb", t.path()));
    assert_eq!(d.verdict, Verdict::Allow);
}

#[test]
fn rails_path_needs_rails_skill_not_ruby_skill() {
    let t = transcript(r#""skill": "ruby-conventions:ruby-style""#);
    let d = decision_for(&edit_json("app/models/user.rb", t.path()));
    assert!(d.is_deny());
    assert!(d.message.unwrap().contains("rails-conventions:rails-models"));
}

#[test]
fn capability_state_is_monotonic() {
    let t = transcript(
        "{\"skill\": \"ruby-conventions:ruby-testing\"}\n{\"type\":\"assistant\",\"text\":\"later\"}\n",
    );
    let ledger = TranscriptLedger::open(t.path().to_str());
    for _ in 0..10 {
        assert!(skill_gate::ledger::CapabilityLedger::is_loaded(
            &ledger,
            "ruby-conventions:ruby-testing"
        ));
    }
    assert!(skill_gate::ledger::is_loaded(
        "ruby-conventions:ruby-testing",
        t.path().to_str().unwrap()
    ));
}

#[test]
fn escaped_marker_in_transcript() {
    let t = transcript(r#"{"content":"{\"skill\":\"ruby-conventions:ruby-gems\"}"}"#);
    let d = decision_for(&edit_json("Gemfile", t.path()));
    assert_eq!(d.verdict, Verdict::Allow);
}

#[test]
fn rewrite_never_recurses() {
    let dir = rails_project();
    for cmd in ["bin/rspec spec/models", "./bin/rspec", "bin/rails db:migrate"] {
        let d = skill_gate::evaluate(&bash_json(cmd), dir.path());
        assert!(!d.is_deny(), "{cmd}");
    }
}

#[test]
fn commit_and_binstub_in_one_command() {
    let dir = rails_project();
    let d = skill_gate::evaluate(
        &bash_json(r#"bundle exec rspec && git commit -m "feat: Add specs""#),
        dir.path(),
    );
    assert_eq!(d.reason, "binstub:rspec");
}

#[test]
fn heredoc_commit_with_attribution() {
    let cmd = "git commit -m \"$(cat <<'EOF'\nfeat: Add login\n\nGenerated with an assistant\nEOF\n)\"";
    let d = decision_for(&bash_json(cmd));
    assert_eq!(d.reason, "ai-attribution");
}

// ── Context injection through a configured registry ──

fn rails_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    for name in ["rspec", "rails"] {
        let path = bin.join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }
    dir
}

fn context_registry(root: &Path) -> GateRegistry {
    let refs = root.join("references");
    std::fs::create_dir_all(&refs).unwrap();
    std::fs::write(refs.join("stimulus.md"), "Stimulus reference\n").unwrap();
    std::fs::write(refs.join("turbo.md"), "Turbo reference\n").unwrap();
    std::fs::write(refs.join("view-component.md"), "ViewComponent reference\n").unwrap();

    let mut config = Config::default_config();
    config.settings.reference_root = root.to_string_lossy().into_owned();
    GateRegistry::from_config(&config)
}

#[test]
fn prompt_submission_injects_matching_references() {
    let root = tempfile::tempdir().unwrap();
    let registry = context_registry(root.path());
    let event = ToolEvent::decode(
        r#"{"hook_event_name":"UserPromptSubmit","prompt":"Build a ViewComponent with a stimulus controller"}"#,
    )
    .unwrap();
    let ledger = TranscriptLedger::from_text("");
    let audit = MemoryAudit::new();
    let env = GateEnv {
        ledger: &ledger,
        cwd: root.path(),
        audit: &audit,
    };
    let d = registry.evaluate(&event, &env);
    assert_eq!(d.verdict, Verdict::AllowWithContext);
    assert_eq!(d.exit_code(), 0);
    let ctx = d.context.unwrap();
    assert!(ctx.contains("ViewComponent reference"));
    assert!(ctx.contains("Stimulus reference"));
    assert!(!ctx.contains("Turbo reference"));
    assert_eq!(audit.entries()[0].gate, "rails-context");
}

#[test]
fn component_edit_gets_context_and_is_not_gated() {
    let root = tempfile::tempdir().unwrap();
    let registry = context_registry(root.path());
    let event = ToolEvent {
        tool_name: "Edit".into(),
        file_path: Some("app/components/card_component.rb".into()),
        ..Default::default()
    };
    let ledger = TranscriptLedger::from_text("");
    let env = GateEnv {
        ledger: &ledger,
        cwd: root.path(),
        audit: &NullAudit,
    };
    let d = registry.evaluate(&event, &env);
    assert_eq!(d.verdict, Verdict::AllowWithContext);
    assert_eq!(d.context.as_deref(), Some("ViewComponent reference"));
}

#[test]
fn json_context_format() {
    let rendered = skill_gate::eval::ContextFormat::Json.render("hello");
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["additionalContext"], "hello");
}
