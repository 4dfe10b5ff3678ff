use anyhow::Result;
use rayengine::{profile_scope, Layer};
use tracing::info;

/// Logs its lifecycle and every update.
#[derive(Debug, Default)]
pub struct ExampleLayer {
    updates: u64,
}

impl ExampleLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for ExampleLayer {
    fn name(&self) -> &str {
        "Example"
    }

    fn on_attach(&mut self) -> Result<()> {
        info!("ExampleLayer attached");
        Ok(())
    }

    fn on_detach(&mut self) -> Result<()> {
        info!(updates = self.updates, "ExampleLayer detached");
        Ok(())
    }

    fn on_update(&mut self, delta_seconds: f32) -> Result<()> {
        profile_scope!("ExampleLayer::on_update");
        self.updates += 1;
        info!(frame = self.updates, delta_seconds, "application is running");
        Ok(())
    }
}
