use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use till::app::App;
use till::clock::SystemClock;
use till::store::DataContext;

/// A terminal point-of-sale console.
///
/// Products, customers and receipts are kept as JSON documents in the data
/// directory and rewritten after every change.
#[derive(Parser, Debug)]
#[command(name = "till")]
struct Cli {
    /// Directory holding products.json, customers.json, receipts.json and
    /// the log file. Defaults to the current working directory.
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Tracing filter directive, e.g. "debug" or "till=trace".
    /// Overrides the TILL_LOG environment variable.
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

fn init_tracing(data: &DataContext, override_filter: Option<&str>) -> anyhow::Result<()> {
    let filter = override_filter
        .map(str::to_owned)
        .or_else(|| std::env::var("TILL_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    // Stdout belongs to the TUI; logs go to a file in the data directory.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data.log_path())
        .with_context(|| format!("cannot open log file {}", data.log_path().display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine working directory")?,
    };
    let data = DataContext::new(data_dir);
    std::fs::create_dir_all(data.data_dir())
        .with_context(|| format!("cannot create data directory {}", data.data_dir().display()))?;

    init_tracing(&data, cli.log_level.as_deref())?;
    tracing::info!(data_dir = %data.data_dir().display(), "starting");

    let mut app = App::load(data, Box::new(SystemClock));

    let terminal = ratatui::init();
    let result = app.run(terminal);
    ratatui::restore();

    result.context("event loop failed")
}
