//! `Bitgarten` - command-line client for the Bitgarten media gallery.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod settings;

use std::process::ExitCode;

use bitgarten_client::{
    CachedSessionStore, Gateway, KeyringSessionStore, ReloadSignal, ReqwestTransport, SessionContext,
};
use bitgarten_core::Loader;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bitgarten=info,bitgarten_core=info,bitgarten_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = settings::load_settings().await?;
    let config = settings.client_config(cli.url.as_deref())?;
    info!("Using gallery at {}", config.base_url);

    let transport = ReqwestTransport::new(&config)?;
    let session = SessionContext::new(CachedSessionStore::new(KeyringSessionStore::new()));
    let reload = ReloadSignal::new();
    let gateway = Gateway::new(transport, config, session).with_reload_handler(reload.clone());
    let loader = Loader::new(gateway, settings.loader_options());

    // A rejected login also fires the reload signal; that is not an expiry.
    let is_login = matches!(cli.command, Command::Login { .. });
    let result = commands::run(&loader, cli.command).await;

    if reload.reload_count() > 0 && !is_login {
        warn!("Server rejected the session");
        eprintln!("session expired, please log in again");
        return Ok(ExitCode::from(2));
    }
    result.map(|()| ExitCode::SUCCESS)
}
