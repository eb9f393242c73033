//! # threadlens
//!
//! Command-line front end: load one or more thread dumps, analyze each
//! snapshot independently and print a report.
//!
//! ```bash
//! threadlens dump.txt
//! threadlens dumps/ --pools pools.json --json
//! ```

use std::any::Any;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};

use threadlens::analyzer::Severity;
use threadlens::config::PoolConfig;
use threadlens::report::render_human;
use threadlens::snapshots::{SnapshotSet, discover_dump_files};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Parser, Debug)]
#[command(name = "threadlens")]
#[command(about = "Analyze JVM thread dumps: states, pools, locks and deadlocks")]
#[command(version)]
struct Args {
    /// Thread dump files, or a single directory holding threaddump-<N>-<millis>.txt files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Pool configuration (.json with threadGroups/poolName, or .toml)
    #[arg(long, value_name = "FILE")]
    pools: Option<PathBuf>,

    /// Emit JSON summaries instead of the terminal report
    #[arg(long, conflicts_with = "text")]
    json: bool,

    /// Emit the plain indented summary text
    #[arg(long)]
    text: bool,

    /// Print the stack trace of the named thread (first snapshot that has it)
    #[arg(long, value_name = "NAME")]
    thread: Option<String>,

    /// Exit with status 2 when any snapshot is deadlocked
    #[arg(long)]
    fail_on_deadlock: bool,

    /// Colorize output
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn install_broken_pipe_handler() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let is_broken = <dyn Any>::downcast_ref::<&str>(payload)
            .is_some_and(|s| s.contains("Broken pipe"))
            || <dyn Any>::downcast_ref::<String>(payload)
                .is_some_and(|s| s.contains("Broken pipe"));

        if is_broken {
            // Quietly exit when downstream closes the pipe (e.g. piping to `head`).
            std::process::exit(0);
        }

        default_hook(info);
    }));
}

fn load_pools(path: Option<&PathBuf>) -> Result<PoolConfig> {
    match path {
        Some(path) => PoolConfig::load_from_path(path)
            .with_context(|| format!("loading pools from {}", path.display())),
        None => Ok(PoolConfig::default()),
    }
}

fn load_snapshots(inputs: &[PathBuf], pools: &PoolConfig) -> Result<SnapshotSet> {
    let files = match inputs {
        [dir] if dir.is_dir() => discover_dump_files(dir)?,
        _ => inputs
            .iter()
            .enumerate()
            .map(|(i, path)| (i + 1, path.clone()))
            .collect(),
    };
    debug!(files = files.len(), "resolved dump files");

    let set = SnapshotSet::analyze_files(&files, pools);
    if set.is_empty() {
        bail!("none of the given thread dumps could be read");
    }
    Ok(set)
}

fn run(args: Args) -> Result<ExitCode> {
    match args.color {
        ColorMode::Always => console::set_colors_enabled(true),
        ColorMode::Never => console::set_colors_enabled(false),
        ColorMode::Auto => {}
    }

    let pools = load_pools(args.pools.as_ref())?;
    let set = load_snapshots(&args.inputs, &pools)?;
    info!(snapshots = set.len(), "analysis finished");

    if let Some(name) = &args.thread {
        match set.stack_trace(name) {
            Some(frames) => {
                println!("\"{name}\"");
                for frame in frames {
                    println!("\tat {frame}");
                }
            }
            None => bail!("no thread named {name:?} in any snapshot"),
        }
    } else if args.json {
        let json = serde_json::to_string_pretty(&set.summaries())
            .context("serializing summaries")?;
        println!("{json}");
    } else if args.text {
        println!("{}", set.combined_text());
    } else {
        let reports: Vec<String> = set.iter().map(render_human).collect();
        print!("{}", reports.join("\n"));
    }

    let deadlocked = set
        .iter()
        .any(|analysis| analysis.deadlock_status.severity == Severity::Deadlocked);
    if args.fail_on_deadlock && deadlocked {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    install_broken_pipe_handler();
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.parse().unwrap_or_default()),
        )
        .init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[threadlens] Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
