mod app;
mod cache;
mod command;
mod config;
mod constants;
mod error;
mod mail;
mod undo;

use anyhow::Result;
use std::env;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::config::Config;
use crate::mail::InMemoryMailbox;

const DEFAULT_LOG_FILTER: &str = "info,mailrewind=debug";

fn setup_logging(config: &Config) {
    use std::fs::OpenOptions;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = config.log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .ok()
        .map(|dir| dir.join("mailrewind.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        // Log to file
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"mailrewind - Undoable mailbox actions at the terminal

Usage: mailrewind [command]

Commands:
    (none)      Start the console against a sample mailbox
    init        Write a default config file
    help        Show this help message

Configuration file: ~/.config/mailrewind/config.toml
"#
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some("init") => {
            let path = Config::config_path()?;
            if path.exists() {
                println!("Config already exists at {}", path.display());
            } else {
                Config::default().save()?;
                println!("Wrote default config to {}", path.display());
            }
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
        None => {
            let config = Config::load()?;
            config.ensure_dirs()?;
            setup_logging(&config);
            tracing::info!("mailrewind starting");

            let mailbox = Arc::new(InMemoryMailbox::with_sample_data());
            let mut app = App::new(config, mailbox);
            app.run().await
        }
    }
}
