//! Iterative code review mentor CLI.
//!
//! Runs the five-stage review loop over a code snippet and renders the
//! transcript incrementally to stdout. The generation backend credential is
//! read from `GOOGLE_API_KEY` and never stored.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use mentor::core::controller::IterationController;
use mentor::core::state::Message;
use mentor::exit_codes;
use mentor::io::config::{MAX_CYCLES_CAP, MentorConfig, load_config};
use mentor::io::generate::HttpGenerator;
use mentor::io::transcript_log::{SessionLog, SessionMeta};
use mentor::samples;
use mentor::session::{
    CancelToken, SessionError, SessionErrorKind, SessionRequest, StopReason, run_session,
};
use mentor::stages::default_stages;

#[derive(Parser)]
#[command(name = "mentor", version, about = "Iterative multi-stage code review mentor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Review a code snippet through the full stage pipeline.
    Run {
        /// File containing the code to review.
        #[arg(long, conflicts_with = "sample")]
        file: Option<PathBuf>,
        /// Name of a built-in sample subject (see `mentor samples`).
        #[arg(long)]
        sample: Option<String>,
        /// Review cycles to run (1 to 5). Defaults to the configured value.
        #[arg(long)]
        cycles: Option<u32>,
        /// Path to mentor.toml.
        #[arg(long, default_value = "mentor.toml")]
        config: PathBuf,
        /// Directory to write transcript.jsonl and meta.json into.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the built-in sample subjects.
    Samples,
}

fn main() {
    mentor::logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            file,
            sample,
            cycles,
            config,
            out,
        } => cmd_run(file, sample, cycles, &config, out),
        Command::Samples => cmd_samples(),
    }
}

fn cmd_samples() -> Result<i32> {
    for sample in samples::SAMPLES {
        println!("{:<16} {}", sample.name, sample.description);
    }
    Ok(exit_codes::OK)
}

fn cmd_run(
    file: Option<PathBuf>,
    sample: Option<String>,
    cycles: Option<u32>,
    config_path: &Path,
    out: Option<PathBuf>,
) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let subject_text = resolve_subject(file, sample)?;
    let iteration_limit = resolve_cycles(cycles, &cfg)?;
    let api_key = std::env::var("GOOGLE_API_KEY")
        .map_err(|_| anyhow!("GOOGLE_API_KEY is not set (required for the generation backend)"))?;

    let generator = HttpGenerator::new(
        &cfg.endpoint,
        &cfg.model,
        api_key,
        Duration::from_secs(cfg.stage_timeout_secs),
    )?;
    let stages = default_stages(&generator);

    let log = match &out {
        Some(dir) => Some(SessionLog::create(dir)?),
        None => None,
    };

    let request = SessionRequest {
        subject_text,
        iteration_limit,
        max_stage_retries: cfg.stage_retries,
    };
    let started = Instant::now();
    let mut log_error: Option<anyhow::Error> = None;

    let result = run_session(
        &stages,
        &IterationController,
        &request,
        &CancelToken::new(),
        |message| {
            render_message(message);
            if let Some(log) = &log {
                if let Err(err) = log.append(message) {
                    log_error.get_or_insert(err);
                }
            }
        },
    );

    if let Some(err) = log_error {
        return Err(err.context("write transcript artifact"));
    }

    let duration_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(outcome) => {
            let result_label = match outcome.stop {
                StopReason::LimitReached => "complete",
                StopReason::Cancelled => "cancelled",
            };
            write_meta(&log, outcome.iterations, outcome.transcript.len(), result_label, duration_ms)?;
            println!(
                "\nreview {result_label}: {} cycles, {} messages",
                outcome.iterations,
                outcome.transcript.len()
            );
            Ok(match outcome.stop {
                StopReason::LimitReached => exit_codes::OK,
                StopReason::Cancelled => exit_codes::CANCELLED,
            })
        }
        Err(err) => {
            let (label, code) = classify_error(&err);
            write_meta(&log, err.iterations, err.transcript.len(), label, duration_ms)?;
            eprintln!("{err}");
            Ok(code)
        }
    }
}

fn resolve_subject(file: Option<PathBuf>, sample: Option<String>) -> Result<String> {
    match (file, sample) {
        (Some(path), None) => {
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
        }
        (None, Some(name)) => samples::find(&name)
            .map(|s| s.code.to_string())
            .ok_or_else(|| anyhow!("unknown sample '{name}' (see `mentor samples`)")),
        (None, None) => Err(anyhow!("pass --file or --sample")),
        (Some(_), Some(_)) => unreachable!("clap rejects --file with --sample"),
    }
}

/// Boundary validation of the cycle count: [1, 5], independent of the core's
/// own `>= 1` requirement.
fn resolve_cycles(cycles: Option<u32>, cfg: &MentorConfig) -> Result<u32> {
    let cycles = cycles.unwrap_or(cfg.max_cycles);
    if cycles < 1 || cycles > MAX_CYCLES_CAP {
        return Err(anyhow!("--cycles must be in [1, {MAX_CYCLES_CAP}]"));
    }
    Ok(cycles)
}

fn classify_error(err: &SessionError) -> (&'static str, i32) {
    match &err.kind {
        SessionErrorKind::InvalidConfiguration { .. } => {
            ("invalid-configuration", exit_codes::INVALID)
        }
        SessionErrorKind::StageUnavailable { .. } => ("stage-unavailable", exit_codes::STAGE_FAILED),
        SessionErrorKind::InvariantViolation { .. } => ("invariant-violation", exit_codes::INVALID),
    }
}

fn write_meta(
    log: &Option<SessionLog>,
    iterations: u32,
    message_count: usize,
    result: &str,
    duration_ms: u64,
) -> Result<()> {
    if let Some(log) = log {
        log.write_meta(&SessionMeta {
            iterations,
            message_count,
            result: result.to_string(),
            duration_ms,
        })?;
    }
    Ok(())
}

fn render_message(message: &Message) {
    println!("== {} ==", message.role);
    println!("{}\n", message.content.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_with_sample() {
        let cli = Cli::parse_from(["mentor", "run", "--sample", "division-error"]);
        match cli.command {
            Command::Run { sample, cycles, .. } => {
                assert_eq!(sample.as_deref(), Some("division-error"));
                assert_eq!(cycles, None);
            }
            Command::Samples => panic!("expected run command"),
        }
    }

    #[test]
    fn parse_samples() {
        let cli = Cli::parse_from(["mentor", "samples"]);
        assert!(matches!(cli.command, Command::Samples));
    }

    #[test]
    fn file_and_sample_conflict() {
        let parsed = Cli::try_parse_from([
            "mentor", "run", "--file", "a.py", "--sample", "division-error",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn resolve_cycles_enforces_boundary_cap() {
        let cfg = MentorConfig::default();
        assert_eq!(resolve_cycles(None, &cfg).expect("default"), cfg.max_cycles);
        assert!(resolve_cycles(Some(0), &cfg).is_err());
        assert!(resolve_cycles(Some(6), &cfg).is_err());
        assert_eq!(resolve_cycles(Some(5), &cfg).expect("cap"), 5);
    }

    #[test]
    fn resolve_subject_rejects_unknown_sample() {
        let err = resolve_subject(None, Some("nope".to_string())).unwrap_err();
        assert!(err.to_string().contains("unknown sample"));
    }
}
