//! Poet Chat - terminal client for talking about poems
//!
//! Picks a poem from the catalog service and holds a conversation about it
//! with the assistant service, one turn at a time.

mod config;
mod markup;
mod prompt;
mod runtime;
mod service;
mod session;
mod ui;
mod view;

use config::ClientConfig;
use runtime::{ProductionRuntime, SessionRuntime};
use service::{HttpServiceClient, LoggingClient};
use session::SessionContext;
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;

    // Log to a file; stdout belongs to the terminal UI
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "poet_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    let client = Arc::new(LoggingClient::new(HttpServiceClient::new(&config.base_url)?));
    let context = SessionContext::new(uuid::Uuid::new_v4().to_string())
        .with_restore_input(config.restore_input_on_failure);

    tracing::info!(
        session_id = %context.session_id,
        base_url = %config.base_url,
        timeout_secs = ?config.request_timeout.map(|t| t.as_secs()),
        restore_input = config.restore_input_on_failure,
        "Starting session"
    );

    let runtime: ProductionRuntime = SessionRuntime::new(context, Arc::clone(&client), client)
        .with_request_timeout(config.request_timeout);

    ui::run(runtime).await?;
    Ok(())
}
