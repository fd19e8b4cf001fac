//! skill-gate: Claude Code hook entry point.
//!
//! Reads one JSON event from stdin and exits:
//!   - 0: allow (stdout, if any, is context to inject)
//!   - 2: deny (stderr carries the remediation message)
//!
//! Usage:
//!   skill-gate [GATE...]      run the named gates (all when none given)
//!   skill-gate --dump-config  print the merged configuration as TOML
//!
//! Every failure path, including a panic, exits 0 with no output.

use std::io::Read;
use std::panic::{self, AssertUnwindSafe};

use skill_gate::audit::{AuditSink, LogAudit, init_file_logger};
use skill_gate::config::{Config, expand_path};
use skill_gate::error::GateError;
use skill_gate::eval::{Decision, GateEnv, GateRegistry};
use skill_gate::ledger::TranscriptLedger;
use skill_gate::parse::ToolEvent;

fn main() {
    // Route panics to the audit log instead of stderr
    panic::set_hook(Box::new(|info| {
        log::error!("panic: {info}");
    }));

    let code = match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            LogAudit.record("engine", &Decision::allow("fail-open"), &e.to_string());
            0
        }
        Err(_) => 0,
    };
    std::process::exit(code);
}

fn run() -> Result<i32, GateError> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--dump-config") {
        let (config, warning) = Config::load();
        if let Some(warning) = warning {
            eprintln!("warning: {warning}");
        }
        match config.dump() {
            Ok(toml) => print!("{toml}"),
            Err(e) => eprintln!("failed to render config: {e}"),
        }
        return Ok(0);
    }

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    let (config, warning) = Config::load();
    if config.settings.audit
        && let Some(path) = expand_path(&config.settings.audit_log)
    {
        init_file_logger(&path, config.settings.debug);
    }
    if let Some(warning) = warning {
        log::warn!("{warning}");
    }

    let event = ToolEvent::decode(&input)?;

    let mut registry = GateRegistry::from_config(&config);
    let gates: Vec<String> = args.into_iter().filter(|a| !a.starts_with("--")).collect();
    registry.select(&gates);

    let cwd = std::env::current_dir().map_err(GateError::Cwd)?;
    let ledger = TranscriptLedger::open(event.transcript_path.as_deref());
    let env = GateEnv {
        ledger: &ledger,
        cwd: &cwd,
        audit: &LogAudit,
    };

    let decision = registry.evaluate(&event, &env);
    log::debug!("{} {}", decision.verdict.label(), decision.reason);
    if decision.is_deny() {
        if let Some(message) = &decision.message {
            eprintln!("{message}");
        }
        return Ok(decision.exit_code());
    }
    if let Some(context) = &decision.context {
        println!("{}", registry.context_format().render(context));
    }
    Ok(0)
}
