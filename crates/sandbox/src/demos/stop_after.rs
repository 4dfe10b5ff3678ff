use anyhow::Result;
use rayengine::{AppHandle, Layer};
use tracing::info;

/// Overlay that stops the application after a fixed number of updates.
pub struct StopAfter {
    handle: AppHandle,
    remaining: u64,
}

impl StopAfter {
    pub fn new(handle: AppHandle, frames: u64) -> Self {
        Self {
            handle,
            remaining: frames,
        }
    }
}

impl Layer for StopAfter {
    fn name(&self) -> &str {
        "StopAfter"
    }

    fn on_update(&mut self, _delta_seconds: f32) -> Result<()> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 && self.handle.is_running() {
            info!("frame budget used up; stopping");
            self.handle.stop();
        }
        Ok(())
    }
}
