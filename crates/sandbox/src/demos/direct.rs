use anyhow::{Context, Result};
use rayengine::{profile_function, Application, Layer};
use tracing::info;

pub struct ExampleChildDirect;

impl Layer for ExampleChildDirect {
    fn name(&self) -> &str {
        "ExampleChildDirect"
    }

    fn on_attach(&mut self) -> Result<()> {
        info!("ExampleChildDirect attached");
        Ok(())
    }

    fn on_detach(&mut self) -> Result<()> {
        info!("ExampleChildDirect detached");
        Ok(())
    }
}

/// Synchronous push and pop through the stack, before the loop starts.
pub fn run(app: &mut Application) -> Result<()> {
    profile_function!();
    info!("ExampleDirect: push_layer(ExampleChildDirect)");
    let id = app
        .push_layer(Box::new(ExampleChildDirect))
        .context("failed to push direct child")?;

    info!(child = %id, "ExampleDirect: pop_layer");
    match app.layer_stack_mut().pop_layer(id) {
        Some(layer) => info!(layer = layer.name(), "ExampleDirect pop result: popped"),
        None => info!("ExampleDirect pop result: nothing to pop"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rayengine::EngineConfig;

    use super::*;

    #[test]
    fn leaves_stack_untouched() {
        let mut config = EngineConfig::default();
        config.log.enabled = false;
        let mut app = Application::new(config);
        run(&mut app).unwrap();
        assert!(app.layer_stack().is_empty());
        assert_eq!(app.layer_stack().insertion_boundary(), 0);
    }
}
