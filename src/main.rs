use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use trail::config::{Config, StartAt};
use trail::{tail_records, CanonicalRecord, ParsedLogCache, RecordNormalizer};

#[derive(Parser)]
#[command(name = "trail", about = "trail — follow and normalise Traefik JSON access logs")]
struct Cli {
    /// Write debug logs to /tmp/trail-debug.log (tail -f to inspect).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow a log file and print each record as one JSON line.
    Tail {
        path: PathBuf,
        /// Read the existing contents first instead of starting at the end.
        #[arg(long)]
        from_start: bool,
    },
    /// Read a whole log file once and print its records.
    Read {
        path: PathBuf,
        /// Pretty-print the JSON array.
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let config = Config::load().context("loading trail config")?;
    match cli.command {
        Command::Tail { path, from_start } => tail(path, from_start, config).await,
        Command::Read { path, pretty } => read(path, pretty, &config),
    }
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    if debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/trail-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("trail debug log started — tail -f /tmp/trail-debug.log");
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }
    Ok(())
}

async fn tail(path: PathBuf, from_start: bool, config: Config) -> anyhow::Result<()> {
    let mut tail_config = config.tail;
    if from_start {
        tail_config.start_at = StartAt::Beginning;
    }

    let session = tail_records(path, &tail_config, RecordNormalizer::new(), print_record);
    tokio::select! {
        result = session.join() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("interrupted");
        }
    }
    Ok(())
}

fn print_record(record: CanonicalRecord) {
    match serde_json::to_string(&record) {
        Ok(json) => {
            let mut out = std::io::stdout().lock();
            if let Err(err) = writeln!(out, "{json}") {
                tracing::warn!(error = %err, "failed to write record");
            }
        }
        Err(err) => tracing::warn!(error = %err, "failed to encode record"),
    }
}

fn read(path: PathBuf, pretty: bool, config: &Config) -> anyhow::Result<()> {
    let mut cache = ParsedLogCache::new(config.cache.policy());
    let records = cache.get_or_load(&path)?;

    let json = if pretty {
        serde_json::to_string_pretty(&*records)?
    } else {
        serde_json::to_string(&*records)?
    };
    println!("{json}");
    Ok(())
}
