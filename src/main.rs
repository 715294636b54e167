// src/main.rs

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::CliArgs;
use tracing::warn;
use tweakctl::{
    config::Settings, errors::StateStoreError, state::StateStore, utils::elevation::is_elevated,
};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let settings = Settings::resolve(args.tweaks_dir.clone(), args.state_file.clone(), args.verbose)
        .context("Failed to resolve settings")?;

    tracing_subscriber::fmt()
        .with_max_level(settings.level_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    tracing::debug!("Using settings: {:?}", settings);

    if !is_elevated() {
        warn!("Not running as administrator; each tweak will ask for elevation.");
    }

    let mut states = StateStore::new(&settings.state_file);
    match states.load() {
        Ok(()) => {}
        Err(e @ StateStoreError::Parse { .. }) => {
            warn!("Starting with empty tweak state: {}", e);
            states
                .quarantine_corrupt()
                .context("Refusing to overwrite an unreadable state file")?;
        }
        Err(e) => warn!("Starting with empty tweak state: {}", e),
    }

    args.command.run(&settings, states)
}
