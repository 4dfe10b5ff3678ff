use crate::application::AppState;
use crate::config::ConfigError;
use crate::log::LogError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("layer '{layer}' failed to attach: {source}")]
    Attach {
        layer: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("logging initialization failed: {0}")]
    Logging(#[from] LogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot {operation} while application is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: AppState,
    },
}

impl EngineError {
    pub fn is_attach_failure(&self) -> bool {
        matches!(self, Self::Attach { .. })
    }
}
