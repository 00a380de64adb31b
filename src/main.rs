use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bee_iotop::events::spawn_input_thread;
use bee_iotop::monitor::open_terminal;
use bee_iotop::ui::init_terminal;
use bee_iotop::{
    duration, Aggregator, Dashboard, Monitor, QuerySource, Settings, StatusSource, StreamSource,
    Theme,
};

/// Shortest refresh interval accepted on the command line, in seconds.
const MIN_INTERVAL_SECS: f64 = 1.0;

#[derive(Parser, Debug)]
#[command(name = "bee-iotop", version)]
#[command(about = "Live terminal dashboard for node and pipe I/O of a SensorBee topology")]
struct Cli {
    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file (nothing is logged otherwise)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch a topology on a SensorBee server
    Monitor {
        /// Server URI [default: http://localhost:15601]
        #[arg(long)]
        uri: Option<String>,

        /// REST API version [default: v1]
        #[arg(long)]
        api_version: Option<String>,

        /// Name of the topology to watch
        #[arg(short, long)]
        topology: Option<String>,

        /// Refresh interval in seconds, at least 1.0 [default: 1.0]
        #[arg(short, long)]
        d: Option<f64>,
    },

    /// Replay newline-delimited JSON node statuses from a file ("-" for stdin)
    Replay {
        file: PathBuf,

        /// Refresh interval in seconds, at least 1.0 [default: 1.0]
        #[arg(short, long)]
        d: Option<f64>,
    },
}

fn setup_tracing(cli: &Cli) -> Option<WorkerGuard> {
    let log_file = cli.log_file.as_deref()?;
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bee_iotop={log_level}")));

    let log_dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("bee-iotop.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Some(guard)
}

/// Validate a refresh interval given in seconds.
fn refresh_interval(secs: f64) -> Result<Duration> {
    if !(secs >= MIN_INTERVAL_SECS) {
        bail!("refresh interval must be at least {MIN_INTERVAL_SECS} second, got {secs}");
    }
    Ok(duration::from_secs(secs)?)
}

/// Build the status source the subcommand asks for.
async fn open_source(
    command: &Command,
    settings: Settings,
) -> Result<(Box<dyn StatusSource>, Duration)> {
    match command {
        Command::Monitor {
            uri,
            api_version,
            topology,
            d,
        } => {
            let interval = refresh_interval(d.unwrap_or(settings.interval))?;
            let uri = uri.clone().unwrap_or(settings.uri);
            let api_version = api_version.clone().unwrap_or(settings.api_version);
            let Some(topology) = topology.clone().or(settings.topology) else {
                bail!("no topology given, use --topology or set it in the settings file");
            };

            let source = QuerySource::connect(&uri, &api_version, &topology)
                .await
                .with_context(|| format!("failed to start monitoring {topology} on {uri}"))?;
            Ok((Box::new(source), interval))
        }
        Command::Replay { file, d } => {
            let interval = refresh_interval(d.unwrap_or(settings.interval))?;
            let source = if file.as_os_str() == "-" {
                StreamSource::spawn(tokio::io::stdin(), "stdin")
            } else {
                let reader = tokio::fs::File::open(file)
                    .await
                    .with_context(|| format!("failed to open {}", file.display()))?;
                StreamSource::spawn(reader, &file.display().to_string())
            };
            Ok((Box::new(source), interval))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = setup_tracing(&cli);

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    let (source, interval) = open_source(&cli.command, settings).await?;
    info!(source = source.description(), ?interval, "starting bee-iotop");

    let aggregator = Arc::new(Aggregator::new());
    let dashboard = Dashboard::new(aggregator, source.description(), Theme::auto_detect());

    let (source, terminal, terminal_guard) = open_terminal(source, init_terminal)
        .await
        .context("failed to set up terminal")?;
    let events = spawn_input_thread();
    let monitor = Monitor::new(terminal, dashboard, interval);
    let result = monitor.run(source, events).await;
    drop(terminal_guard);

    result?;
    info!("bye");
    Ok(())
}
