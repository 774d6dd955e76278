mod core;
mod ui;
mod utils;
mod workers;

use crate::utils::log_buffer::{BufferLayer, LogBuffer};
use crate::utils::sos::SignalOfStop;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use workers::args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::load();

    let filter = match args.verbose {
        0 => "warn,fsman=info",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Only the buffer layer captures logs — an fmt layer writing to stderr
    // would corrupt the Ratatui TUI. Logs are visible in the Logs panel.
    let log_buffer = LogBuffer::new();
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(BufferLayer::new(log_buffer.clone()))
        .init();

    let sos = SignalOfStop::new();

    // Ctrl+C handler
    let sos_clone = sos.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        sos_clone.cancel();
    });

    ui::run(args, sos, log_buffer).await
}
