//! Layer lifecycle and deferred layer mutation for RayEngine.
//!
//! An [`Application`] owns an ordered [`LayerStack`] and drives it once per
//! frame from a single thread. Any thread, including a layer's own
//! `on_update`, can request structural changes through an [`AppHandle`];
//! those requests are queued and applied at the start of the next frame so
//! the stack is never mutated mid-iteration.
//!
//! ```text
//!   host (sandbox)
//!        │ EngineConfig
//!        ▼
//!   Application::run ──▶ run_frame() ──▶ apply_pending() ──▶ LayerStack
//!        ▲                    │
//!        │                    └─▶ FrameTimer::tick ──▶ Layer::on_update(dt)
//!   AppHandle::*_async (any thread) ──▶ PendingQueue
//! ```

pub mod application;
pub mod clock;
pub mod config;
pub mod error;
pub mod layer;
pub mod layer_stack;
pub mod log;
mod pending;
pub mod profiler;

pub use application::{AppHandle, AppState, Application, FrameStats};
pub use clock::{BoxedTimeSource, FrameTimer, ManualClock, SystemClock, TimeSource};
pub use config::{ConfigError, EngineConfig, FrameConfig, LogConfig};
pub use error::EngineError;
pub use layer::{Layer, LayerId, LayerKey};
pub use layer_stack::{LayerStack, Segment};
pub use log::{LogError, Logging};
pub use pending::PopCallback;
pub use profiler::ProfileScope;
