use std::time::Duration;

use anyhow::{Context, Result};
use rayengine::{Application, EngineConfig};

use crate::cli::Cli;
use crate::demos;

pub fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    let mut app = Application::new(config);
    app.initialize().context("failed to initialise engine")?;

    demos::install(&mut app, cli.demo)?;
    tracing::info!(
        layers = ?app.layer_stack().names(),
        pending = app.pending_len(),
        "sandbox ready"
    );

    app.run().context("frame loop failed")?;
    Ok(())
}

fn build_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load engine config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(frames) = cli.frames {
        config.frame.max_frames = Some(frames);
    }
    if let Some(ms) = cli.yield_ms {
        config.frame.yield_interval = Duration::from_millis(ms);
    }
    if let Some(filter) = &cli.log_filter {
        config.log.filter = Some(filter.clone());
    }
    if cli.no_color {
        config.log.ansi = false;
    }

    config.validate().context("invalid engine configuration")?;
    Ok(config)
}
