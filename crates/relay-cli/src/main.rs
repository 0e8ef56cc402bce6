mod cmd_config;
mod cmd_pending;
mod cmd_report;
mod cmd_resolve;
mod cmd_show;
mod cmd_wait;
mod exit;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "relay",
    version,
    about = "Cross-repository error handoff for coding agents"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an error report, optionally handing it to a sibling repository
    ReportError {
        /// Target repository name (a sibling directory); defaults to this repo
        #[arg(long)]
        target: Option<String>,
        /// Short description of the failure
        #[arg(long)]
        message: String,
        /// Category: build, runtime, test, dependency, configuration
        #[arg(long, default_value = "runtime")]
        category: String,
        /// Severity: critical, high, medium, low
        #[arg(long, default_value = "medium")]
        severity: String,
        /// Stack trace text ("-" reads stdin)
        #[arg(long)]
        stack_trace: Option<String>,
        /// Read the stack trace from a file
        #[arg(long, conflicts_with = "stack_trace")]
        stack_trace_file: Option<PathBuf>,
        /// Affected file path (repeatable)
        #[arg(long = "file")]
        files: Vec<String>,
        /// Affected module name (repeatable)
        #[arg(long = "module")]
        modules: Vec<String>,
        /// Task context in key=value form (repeatable)
        #[arg(long = "context")]
        context: Vec<String>,
        /// Block until the report is resolved or the timeout elapses
        #[arg(long)]
        wait: bool,
        /// Wait timeout in seconds (default from config)
        #[arg(long)]
        timeout: Option<u64>,
        /// Seconds between status polls (default from config)
        #[arg(long)]
        poll_interval: Option<u64>,
    },
    /// Print a repository's pending queue, highest priority first
    ListPending {
        /// Repository name (a sibling directory); defaults to this repo
        repo: Option<String>,
        /// Print entries only, without the resolve hint
        #[arg(long)]
        list_only: bool,
        /// Output entries as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Claim a report and record its terminal resolution
    Resolve {
        /// Report id (err_...)
        id: String,
        /// Terminal status: resolved or failed
        #[arg(long)]
        status: String,
        /// Resolution notes for the audit trail
        #[arg(long)]
        notes: String,
        /// Repository owning the report; defaults to this repo
        #[arg(long)]
        target: Option<String>,
    },
    /// Print one report (pending or archived) as JSON
    Show {
        /// Report id
        id: String,
        /// Repository owning the report; defaults to this repo
        #[arg(long)]
        target: Option<String>,
    },
    /// Block until an existing report reaches a terminal state
    Wait {
        /// Report id
        id: String,
        /// Repository owning the report; defaults to this repo
        #[arg(long)]
        target: Option<String>,
        /// Timeout in seconds (default from config)
        #[arg(long)]
        timeout: Option<u64>,
        /// Seconds between status polls (default from config)
        #[arg(long)]
        poll_interval: Option<u64>,
    },
    /// Read or write per-repository configuration
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("RELAY_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            exit::code_for(&e)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let repo_root = std::env::current_dir()?;

    match cli.cmd {
        Command::ReportError {
            target,
            message,
            category,
            severity,
            stack_trace,
            stack_trace_file,
            files,
            modules,
            context,
            wait,
            timeout,
            poll_interval,
        } => cmd_report::execute(cmd_report::ReportParams {
            repo_root: &repo_root,
            target: target.as_deref(),
            message: &message,
            category: &category,
            severity: &severity,
            stack_trace: stack_trace.as_deref(),
            stack_trace_file: stack_trace_file.as_deref(),
            files,
            modules,
            context: &context,
            wait,
            timeout,
            poll_interval,
        }),
        Command::ListPending {
            repo,
            list_only,
            json,
        } => cmd_pending::execute(&repo_root, repo.as_deref(), list_only, json),
        Command::Resolve {
            id,
            status,
            notes,
            target,
        } => cmd_resolve::execute(&repo_root, &id, &status, &notes, target.as_deref()),
        Command::Show { id, target } => cmd_show::execute(&repo_root, &id, target.as_deref()),
        Command::Wait {
            id,
            target,
            timeout,
            poll_interval,
        } => cmd_wait::execute(&repo_root, &id, target.as_deref(), timeout, poll_interval),
        Command::Config { cmd } => cmd_config::run(cmd, &repo_root),
    }
}
