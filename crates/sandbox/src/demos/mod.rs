//! Example layers exercising the engine's synchronous and deferred APIs.

mod direct;
mod example;
mod stop_after;

use anyhow::{Context, Result};
use rayengine::Application;

use crate::cli::Demo;

pub use async_test::ExampleLayerAsync;
pub use example::ExampleLayer;
pub use stop_after::StopAfter;

/// Frames the sandbox runs when no frame limit was configured.
pub const DEFAULT_DEMO_FRAMES: u64 = 8;

pub fn install(app: &mut Application, demo: Demo) -> Result<()> {
    if demo.includes(Demo::Direct) {
        direct::run(app).context("direct layer demo failed")?;
    }
    if demo.includes(Demo::Basic) {
        app.push_layer(Box::new(ExampleLayer::new()))
            .context("failed to push example layer")?;
    }
    if demo.includes(Demo::Async) {
        let layer = ExampleLayerAsync::new(app.handle());
        app.push_layer(Box::new(layer))
            .context("failed to push async example layer")?;
    }
    if app.config().frame.max_frames.is_none() {
        app.push_overlay(Box::new(StopAfter::new(app.handle(), DEFAULT_DEMO_FRAMES)))
            .context("failed to push stop overlay")?;
    }
    Ok(())
}
