use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Crates whose events the default filter lets through.
const LOG_TARGETS: &[&str] = &[
    "slotgrid",
    "slotgrid_core",
    "slotgrid_lock",
    "slotgrid_selector",
    "slotgrid_metrics",
];

#[derive(Parser)]
#[command(
    name = "slotgrid",
    about = "SlotGrid — claim a weighted role across a fleet of processes",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every subcommand. Anything set here overrides the
/// config file.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Path to slotgrid.toml.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Roster file (JSON array or TOML with [[roles]]).
    #[arg(short, long, global = true)]
    pub roster: Option<PathBuf>,
    /// Load the roster stored in the lock store under this name.
    #[arg(long, global = true, conflicts_with = "roster")]
    pub stored_roster: Option<String>,
    /// redb file holding the shared claims.
    #[arg(long, global = true)]
    pub lock_path: Option<PathBuf>,
    /// Name of the current application.
    #[arg(long, global = true)]
    pub app_name: Option<String>,
    /// ID of the current selection round.
    #[arg(long, global = true)]
    pub selection_id: Option<String>,
    /// Delay between lock attempts, e.g. "250ms" or "1s".
    #[arg(long, global = true)]
    pub lock_delay: Option<String>,
    /// Trace every lock attempt.
    #[arg(long, global = true)]
    pub debug: bool,
    /// Seed the random source for a reproducible claim order.
    #[arg(long, global = true)]
    pub seed: Option<u64>,
    /// Prometheus textfile written when the command finishes.
    #[arg(long, global = true)]
    pub metrics_textfile: Option<PathBuf>,
    /// Metric name prefix.
    #[arg(long, global = true)]
    pub metrics_namespace: Option<String>,
    /// Comma-delimited `key=value` metric labels.
    #[arg(long, global = true)]
    pub metrics_tags: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Claim a role, falling back to a weighted random role when every
    /// slot is taken or the lock store is unusable.
    Select {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Pick a weighted random role without touching the lock store.
    Random {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// List claims held in the current selection round.
    Claims,
    /// Release every claim in the current selection round.
    Reset,
    /// Store the roster file in the lock store under NAME.
    PutRoster {
        name: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let debug = debug_mode(&cli.opts);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_directives(debug))),
        )
        .init();

    match cli.command {
        Commands::Select { format } => commands::select::select(&cli.opts, &format),
        Commands::Random { format } => commands::select::random(&cli.opts, &format),
        Commands::Claims => commands::claims::list(&cli.opts),
        Commands::Reset => commands::claims::reset(&cli.opts),
        Commands::PutRoster { name } => commands::roster::put(&cli.opts, &name),
    }
}

/// Debug mode from the config file and `--debug`. A config that fails to
/// load is reported by the command itself, so only the flag counts here.
fn debug_mode(opts: &GlobalOpts) -> bool {
    commands::Context::load(opts)
        .map(|ctx| ctx.selector.debug_mode)
        .unwrap_or(opts.debug)
}

/// Default `EnvFilter` directives when `RUST_LOG` is unset: workspace crates
/// at `info`, or `debug` when debug mode is on, and nothing from dependencies.
fn log_directives(debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
