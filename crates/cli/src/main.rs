// Linkproof - Cross-Toolchain Smoke Kit
// Copyright (C) 2026 The Linkproof Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use clap::{Parser, Subcommand};
use linkproof_config::{CheckSpec, InspectCheck, MachineExpect, RunCheck, RunStop, SmokeManifest};
use linkproof_inspect::Machine;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitCode, Stdio};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const EXIT_PASS: u8 = 0;
const EXIT_ASSERT_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const RESULT_SCHEMA_VERSION: &str = "1.0";

// Pipe EOF needs every inherited copy of the write end closed, and a
// grandchild can keep one open past the child's death. Stop waiting for
// stdout this long after the child has been reaped.
const STDOUT_EOF_GRACE_MS: u64 = 500;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Linkproof cross-toolchain smoke runner",
    long_about = None
)]
struct Cli {
    /// Enable verbose diagnostic output
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deterministic, CI-friendly runner mode driven by a smoke manifest (YAML).
    Check(CheckArgs),

    /// Summarize one ELF artifact and query its symbol table.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Path to the smoke manifest (YAML)
    #[arg(short, long)]
    manifest: PathBuf,

    /// Directory to write machine-readable artifacts (result.json)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the wall-time budget of every run check (milliseconds)
    #[arg(long)]
    wall_time_ms: Option<u64>,

    /// Run only checks whose name contains this substring (repeatable)
    #[arg(long)]
    only: Vec<String>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Path to the ELF artifact
    artifact: PathBuf,

    /// Fail unless this symbol is defined in the artifact (repeatable)
    #[arg(long)]
    require_defined: Vec<String>,

    /// Fail if this symbol is defined in the artifact (repeatable)
    #[arg(long)]
    forbid_defined: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RunReport {
    result_schema_version: String,
    manifest: PathBuf,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    checks: Vec<CheckReport>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckReport {
    name: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_reason: Option<RunStop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    assertions: Vec<AssertionReport>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionReport {
    assertion: String,
    passed: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level based on --trace flag
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}

fn run_check(args: CheckArgs) -> ExitCode {
    let manifest = match SmokeManifest::from_file(&args.manifest) {
        Ok(manifest) => manifest,
        Err(e) => {
            let msg = format!("{:#}", e);
            error!("{}", msg);
            if let Some(output_dir) = &args.output_dir {
                let report = RunReport {
                    result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
                    manifest: args.manifest.clone(),
                    status: "error".to_string(),
                    message: Some(msg),
                    checks: vec![],
                };
                write_report(output_dir, &report);
            }
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let selected: Vec<&CheckSpec> = manifest
        .checks
        .iter()
        .filter(|check| {
            args.only.is_empty()
                || args
                    .only
                    .iter()
                    .any(|needle| check.name().contains(needle.as_str()))
        })
        .collect();

    if selected.is_empty() {
        error!("No checks match the --only filter");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    info!(
        "Running manifest '{}' ({} of {} checks)",
        manifest.name,
        selected.len(),
        manifest.checks.len()
    );

    let mut reports = Vec::new();
    for check in selected {
        let report = match check {
            CheckSpec::Run(spec) => {
                run_one(&spec.name, &spec.run, &args.manifest, args.wall_time_ms)
            }
            CheckSpec::Inspect(spec) => inspect_one(&spec.name, &spec.inspect, &args.manifest),
        };
        match report.status.as_str() {
            "pass" => info!("Check '{}': pass", report.name),
            other => error!("Check '{}': {}", report.name, other),
        }
        reports.push(report);
    }

    let failed = reports.iter().filter(|r| r.status == "fail").count();
    let errored = reports.iter().filter(|r| r.status == "error").count();
    let passed = reports.len() - failed - errored;

    let status = if failed > 0 {
        "fail"
    } else if errored > 0 {
        "error"
    } else {
        "pass"
    };

    info!(
        "{} checks: {} passed, {} failed, {} errored",
        reports.len(),
        passed,
        failed,
        errored
    );

    if let Some(output_dir) = &args.output_dir {
        let report = RunReport {
            result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
            manifest: args.manifest.clone(),
            status: status.to_string(),
            message: None,
            checks: reports,
        };
        write_report(output_dir, &report);
    }

    if failed > 0 {
        ExitCode::from(EXIT_ASSERT_FAIL)
    } else if errored > 0 {
        ExitCode::from(EXIT_RUNTIME_ERROR)
    } else {
        ExitCode::from(EXIT_PASS)
    }
}

struct RunOutcome {
    stop: RunStop,
    exit_code: Option<i32>,
    stdout: Vec<u8>,
    message: Option<String>,
}

fn run_one(
    name: &str,
    check: &RunCheck,
    manifest_path: &Path,
    wall_override: Option<u64>,
) -> CheckReport {
    let program = resolve_manifest_path(manifest_path, &check.program);
    let wall_time_ms = wall_override.unwrap_or(check.limits.wall_time_ms);

    debug!(
        "Launching {:?} with args {:?} (budget {} ms)",
        program, check.args, wall_time_ms
    );
    let outcome = launch_and_wait(&program, &check.args, wall_time_ms);

    let mut assertions = Vec::new();

    let expected_stop = check.expect.stop_reason.unwrap_or(RunStop::Exited);
    assertions.push(AssertionReport {
        assertion: format!("expected_stop_reason: {:?}", expected_stop),
        passed: outcome.stop == expected_stop,
    });

    if let Some(expected) = check.expect.exit_code {
        assertions.push(AssertionReport {
            assertion: format!("exit_code: {}", expected),
            passed: outcome.exit_code == Some(expected),
        });
    }

    if let Some(expected) = &check.expect.stdout {
        assertions.push(AssertionReport {
            assertion: "stdout: exact transcript".to_string(),
            passed: outcome.stdout == expected.as_bytes(),
        });
    }

    let stdout_text = String::from_utf8_lossy(&outcome.stdout).to_string();
    for needle in &check.expect.stdout_contains {
        assertions.push(AssertionReport {
            assertion: format!("stdout_contains: {}", needle),
            passed: stdout_text.contains(needle.as_str()),
        });
    }

    for a in &assertions {
        if !a.passed {
            error!(
                "Check '{}': assertion failed: {} (captured {} stdout bytes, stop {:?}, exit {:?})",
                name,
                a.assertion,
                outcome.stdout.len(),
                outcome.stop,
                outcome.exit_code
            );
        }
    }

    let all_passed = assertions.iter().all(|a| a.passed);
    let status = if outcome.stop == RunStop::LaunchError && expected_stop != RunStop::LaunchError {
        "error"
    } else if all_passed {
        "pass"
    } else {
        "fail"
    };

    CheckReport {
        name: name.to_string(),
        status: status.to_string(),
        stop_reason: Some(outcome.stop),
        exit_code: outcome.exit_code,
        message: outcome.message,
        assertions,
    }
}

fn launch_and_wait(program: &Path, args: &[String], wall_time_ms: u64) -> RunOutcome {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    // The child leads its own process group, so the watchdog can take down
    // anything it forked along with it.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            return RunOutcome {
                stop: RunStop::LaunchError,
                exit_code: None,
                stdout: Vec::new(),
                message: Some(format!("Failed to launch {:?}: {}", program, e)),
            };
        }
    };

    // Drain stdout on its own thread so a chatty child cannot block on a full
    // pipe while the watchdog is polling.
    let stdout_drain = drain(child.stdout.take());

    let deadline = Instant::now() + Duration::from_millis(wall_time_ms);
    let mut stop = RunStop::Exited;
    let mut exit_code = None;
    let mut message = None;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                exit_code = status.code();
                break;
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    stop = RunStop::WallTime;
                    if let Err(e) = kill_child(&mut child) {
                        warn!("Failed to kill child after wall-time limit: {}", e);
                    }
                    let _ = child.wait();
                    break;
                }
                thread::sleep(Duration::from_millis(5));
            }
            Err(e) => {
                message = Some(format!("Failed to poll child: {}", e));
                let _ = kill_child(&mut child);
                let _ = child.wait();
                break;
            }
        }
    }

    let stdout = stdout_drain.collect(Duration::from_millis(STDOUT_EOF_GRACE_MS));

    RunOutcome {
        stop,
        exit_code,
        stdout,
        message,
    }
}

// Signaling only the direct child would leave anything it forked running,
// still holding the write end of the stdout pipe. On Unix the whole process
// group goes down with it (the child leads its own, set at spawn).
fn kill_child(child: &mut Child) -> std::io::Result<()> {
    #[cfg(unix)]
    unsafe {
        libc::kill(-(child.id() as libc::pid_t), libc::SIGKILL);
    }
    child.kill()
}

struct PipeDrain {
    buffer: Arc<Mutex<Vec<u8>>>,
    eof: mpsc::Receiver<()>,
}

impl PipeDrain {
    // Waits for EOF at most `grace`, then takes whatever has arrived. A
    // backgrounded grandchild can hold the pipe open long after the child
    // has been reaped; in that case the reader thread is left parked in
    // `read` and exits with the process.
    fn collect(self, grace: Duration) -> Vec<u8> {
        let _ = self.eof.recv_timeout(grace);
        self.buffer
            .lock()
            .map(|buffer| buffer.clone())
            .unwrap_or_default()
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> PipeDrain {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let (eof_tx, eof_rx) = mpsc::channel();
    let sink = Arc::clone(&buffer);
    thread::spawn(move || {
        if let Some(mut pipe) = pipe {
            let mut chunk = [0u8; 4096];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if let Ok(mut buffer) = sink.lock() {
                            buffer.extend_from_slice(&chunk[..n]);
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        }
        let _ = eof_tx.send(());
    });
    PipeDrain {
        buffer,
        eof: eof_rx,
    }
}

fn inspect_one(name: &str, check: &InspectCheck, manifest_path: &Path) -> CheckReport {
    let artifact = resolve_manifest_path(manifest_path, &check.artifact);
    debug!("Inspecting {:?}", artifact);

    let summary = match linkproof_inspect::summarize(&artifact) {
        Ok(summary) => summary,
        Err(e) => {
            error!("Check '{}': {}", name, e);
            return CheckReport {
                name: name.to_string(),
                status: "error".to_string(),
                stop_reason: None,
                exit_code: None,
                message: Some(e.to_string()),
                assertions: vec![],
            };
        }
    };

    let mut assertions = Vec::new();

    if let Some(expected) = check.expect.machine {
        assertions.push(AssertionReport {
            assertion: format!("machine: {:?}", expected),
            passed: machine_matches(expected, summary.machine),
        });
    }

    for symbol in &check.expect.defined_symbols {
        assertions.push(AssertionReport {
            assertion: format!("defines: {}", symbol),
            passed: summary.has_defined(symbol),
        });
    }

    for symbol in &check.expect.absent_symbols {
        assertions.push(AssertionReport {
            assertion: format!("does_not_define: {}", symbol),
            passed: !summary.has_defined(symbol),
        });
    }

    for a in &assertions {
        if !a.passed {
            error!(
                "Check '{}': assertion failed: {} (machine {}, {} defined symbols)",
                name,
                a.assertion,
                summary.machine,
                summary.defined.len()
            );
        }
    }

    let status = if assertions.iter().all(|a| a.passed) {
        "pass"
    } else {
        "fail"
    };

    CheckReport {
        name: name.to_string(),
        status: status.to_string(),
        stop_reason: None,
        exit_code: None,
        message: None,
        assertions,
    }
}

fn machine_matches(expected: MachineExpect, actual: Machine) -> bool {
    matches!(
        (expected, actual),
        (MachineExpect::Arm, Machine::Arm)
            | (MachineExpect::RiscV, Machine::RiscV)
            | (MachineExpect::X86_64, Machine::X86_64)
            | (MachineExpect::Aarch64, Machine::Aarch64)
    )
}

fn run_inspect(args: InspectArgs) -> ExitCode {
    let summary = match linkproof_inspect::summarize(&args.artifact) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    println!("artifact: {}", args.artifact.display());
    println!("machine: {}", summary.machine);
    println!("entry: {:#x}", summary.entry);
    println!("class: {}", if summary.is_64 { "elf64" } else { "elf32" });
    println!(
        "endianness: {}",
        if summary.little_endian { "little" } else { "big" }
    );
    println!("defined_symbols: {}", summary.defined.len());
    println!("undefined_symbols: {}", summary.undefined.len());

    let mut ok = true;
    for symbol in &args.require_defined {
        if summary.has_defined(symbol) {
            info!("Required symbol '{}' is defined", symbol);
        } else {
            error!("Required symbol '{}' is not defined", symbol);
            ok = false;
        }
    }
    for symbol in &args.forbid_defined {
        if summary.has_defined(symbol) {
            error!("Forbidden symbol '{}' is defined", symbol);
            ok = false;
        } else {
            info!("Forbidden symbol '{}' is absent", symbol);
        }
    }

    if ok {
        ExitCode::from(EXIT_PASS)
    } else {
        ExitCode::from(EXIT_ASSERT_FAIL)
    }
}

fn write_report(output_dir: &Path, report: &RunReport) {
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        error!("Failed to create output directory {:?}: {}", output_dir, e);
        return;
    }

    let result_path = output_dir.join("result.json");
    match std::fs::File::create(&result_path) {
        Ok(f) => {
            if let Err(e) = serde_json::to_writer_pretty(f, report) {
                error!("Failed to write result.json: {}", e);
            }
        }
        Err(e) => error!("Failed to create result.json: {}", e),
    }
}

fn resolve_manifest_path(manifest_path: &Path, value: &str) -> PathBuf {
    let p = PathBuf::from(value);
    if p.is_absolute() {
        return p;
    }
    manifest_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(p)
}
