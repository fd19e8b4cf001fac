use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn run_in(cwd: &Path, home: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_skill-gate"))
        .args(args)
        .current_dir(cwd)
        .env("HOME", home)
        .env_remove("CLAUDE_PLUGIN_ROOT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(stdin.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

fn run(stdin: &str) -> Output {
    let dir = tempfile::tempdir().unwrap();
    run_in(dir.path(), dir.path(), &[], stdin)
}

#[test]
fn malformed_input_exits_zero_silently() {
    for input in ["", "not json", "{", r#"{"tool_input":{}}"#, "[]"] {
        let out = run(input);
        assert_eq!(out.status.code(), Some(0), "input: {input:?}");
        assert!(out.stderr.is_empty(), "input: {input:?}");
        assert!(out.stdout.is_empty(), "input: {input:?}");
    }
}

#[test]
fn malformed_input_leaves_audit_line() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_in(dir.path(), dir.path(), &[], "not json");
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stderr.is_empty());
    let log = std::fs::read_to_string(dir.path().join(".local/share/skill-gate/audit.log")).unwrap();
    assert!(log.contains("engine\tallow\tfail-open\t"), "{log}");
    assert!(log.contains("malformed hook input"), "{log}");
}

#[test]
fn deny_exits_two_with_remediation() {
    let out = run(r#"{"tool_name":"Edit","tool_input":{"file_path":"spec/user_spec.rb"},"transcript_path":"/tmp/does-not-exist.json"}"#);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("ruby-conventions:ruby-testing"), "{stderr}");
}

#[test]
fn loaded_skill_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let transcript = dir.path().join("t.jsonl");
    std::fs::write(&transcript, r#"{"skill": "ruby-conventions:ruby-testing"}"#).unwrap();
    let input = serde_json::json!({
        "tool_name": "Edit",
        "tool_input": { "file_path": "spec/user_spec.rb" },
        "transcript_path": transcript,
    });
    let out = run_in(dir.path(), dir.path(), &[], &input.to_string());
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stderr.is_empty());
}

#[cfg(unix)]
#[test]
fn binstub_lookup_uses_working_directory() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let input = r#"{"tool_name":"Bash","tool_input":{"command":"bundle exec rspec spec/models"}}"#;

    let out = run_in(dir.path(), dir.path(), &[], input);
    assert_eq!(out.status.code(), Some(0));

    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    std::fs::write(bin.join("rspec"), "#!/bin/sh\n").unwrap();
    std::fs::set_permissions(bin.join("rspec"), std::fs::Permissions::from_mode(0o755)).unwrap();

    let out = run_in(dir.path(), dir.path(), &[], input);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("bin/rspec spec/models"), "{stderr}");
}

#[test]
fn gate_selection_limits_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let input = r#"{"tool_name":"Edit","tool_input":{"file_path":"spec/user_spec.rb"}}"#;
    let out = run_in(dir.path(), dir.path(), &["commit-validator"], input);
    assert_eq!(out.status.code(), Some(0));

    let out = run_in(dir.path(), dir.path(), &["ruby-conventions"], input);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn commit_grammar_via_binary() {
    let bad = r#"{"tool_name":"Bash","tool_input":{"command":"git commit -m \"Added user login\""}}"#;
    let out = run(bad);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("type(scope)!: description"));

    let good = r#"{"tool_name":"Bash","tool_input":{"command":"git commit -m \"feat(auth): Add login flow\""}}"#;
    assert_eq!(run(good).status.code(), Some(0));
}

#[test]
fn audit_log_written_under_home() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_in(
        dir.path(),
        dir.path(),
        &[],
        r#"{"tool_name":"Edit","tool_input":{"file_path":"README.md"}}"#,
    );
    assert_eq!(out.status.code(), Some(0));
    let log = std::fs::read_to_string(dir.path().join(".local/share/skill-gate/audit.log")).unwrap();
    assert!(log.contains("README.md"), "{log}");
}

#[test]
fn overlay_context_format_and_reference_root() {
    let dir = tempfile::tempdir().unwrap();
    let refs = dir.path().join("refs/references");
    std::fs::create_dir_all(&refs).unwrap();
    std::fs::write(refs.join("stimulus.md"), "Use data-controller.\n").unwrap();

    let config_dir = dir.path().join(".config/skill-gate");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!(
            "[settings]\ncontext_format = \"json\"\nreference_root = {:?}\n",
            dir.path().join("refs").to_string_lossy()
        ),
    )
    .unwrap();

    let out = run_in(
        dir.path(),
        dir.path(),
        &["rails-context"],
        r#"{"hook_event_name":"UserPromptSubmit","prompt":"add a Stimulus controller"}"#,
    );
    assert_eq!(out.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["additionalContext"], "Use data-controller.");
}

#[test]
fn malformed_overlay_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join(".config/skill-gate");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "this is [not toml").unwrap();

    let out = run_in(
        dir.path(),
        dir.path(),
        &[],
        r#"{"tool_name":"Edit","tool_input":{"file_path":"spec/user_spec.rb"}}"#,
    );
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn dump_config_prints_toml() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_in(dir.path(), dir.path(), &["--dump-config"], "");
    assert_eq!(out.status.code(), Some(0));
    let text = String::from_utf8_lossy(&out.stdout);
    let parsed: toml::Value = toml::from_str(&text).unwrap();
    assert!(parsed.get("skill_tables").is_some());
    assert!(text.contains("ruby-conventions:ruby-testing"));
}
