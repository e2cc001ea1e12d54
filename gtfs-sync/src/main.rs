mod commands;

use std::error::Error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::{Cli, CommandOutcome};

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match commands::run(cli.command).await {
        Ok(CommandOutcome::Reconcile(summary)) => {
            if let Some(path) = &summary.written_to {
                eprintln!("changeset written to {}", path.display());
            }
            eprintln!(
                "{} stops: {} modified, {} created{}",
                summary.stops_total,
                summary.modified,
                summary.created,
                if summary.cancelled {
                    " [cancelled early]"
                } else {
                    ""
                }
            );
            for stop in &summary.fallbacks {
                eprintln!("warning: queries for stop {stop} failed; stop was created fresh");
            }
            for (stop, discarded) in &summary.ambiguous {
                eprintln!(
                    "warning: stop {stop} had {discarded} additional qualifying candidate(s); first match kept"
                );
            }
        }
        Ok(CommandOutcome::Timetable(summary)) => {
            eprintln!(
                "arrivals at stop {} of trip {}:",
                summary.stop, summary.trip
            );
            for time in &summary.times {
                println!("{time}");
            }
            for skipped in &summary.skipped_windows {
                eprintln!("warning: {skipped}");
            }
        }
        Ok(CommandOutcome::Dump(summary)) => {
            println!("{}", summary.json);
        }
        Err(e) => {
            eprintln!("error: {e}");
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            std::process::exit(1);
        }
    }
}
