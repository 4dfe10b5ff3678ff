//! The frame loop and the thread-safe front door for layer mutation.
//!
//! ```text
//!   any thread ── AppHandle::*_async ──▶ PendingQueue (mutex)
//!                                             │ take_batch (swap)
//!                                             ▼
//!   main thread:  run_frame ──▶ apply ops ──▶ timer.tick ──▶ on_update(dt) per layer
//! ```
//!
//! `Application` owns the [`LayerStack`] and must stay on the thread that
//! runs the loop. [`AppHandle`] clones can live anywhere; they only append
//! to the queue or flip the running flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info, warn};

use crate::clock::{BoxedTimeSource, FrameTimer, SystemClock};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::layer::{Layer, LayerId, LayerKey};
use crate::layer_stack::LayerStack;
use crate::log::Logging;
use crate::pending::{PendingOp, PendingQueue};
use crate::profile_scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Created,
    Initializing,
    Initialized,
    Running,
    Stopping,
    Shutdown,
}

#[derive(Debug, Default)]
struct Shared {
    running: AtomicBool,
    queue: PendingQueue,
}

/// Cloneable, thread-safe access to the deferred layer API and `stop`.
///
/// Requests are applied in enqueue order at the start of the next frame,
/// on the main thread.
#[derive(Debug, Clone, Default)]
pub struct AppHandle {
    shared: Arc<Shared>,
}

impl AppHandle {
    /// Queues a push into the layers segment. Ownership moves now; the
    /// returned id can target the layer in later requests.
    pub fn push_layer_async(&self, layer: Box<dyn Layer>) -> LayerId {
        let id = LayerId::next();
        self.shared.queue.push(PendingOp::Push { id, layer });
        id
    }

    /// Queues a push onto the end of the overlays segment.
    pub fn push_overlay_async(&self, overlay: Box<dyn Layer>) -> LayerId {
        let id = LayerId::next();
        self.shared.queue.push(PendingOp::PushOverlay { id, layer: overlay });
        id
    }

    /// Queues a removal. The key is resolved when the request runs, so a
    /// layer that is already gone by then is simply skipped.
    pub fn remove_layer_async(&self, key: impl Into<LayerKey>) {
        self.shared
            .queue
            .push(PendingOp::Remove { key: key.into() });
    }

    /// Queues a pop; `callback` receives the layer (or `None`) on the main
    /// thread while pending requests are applied.
    ///
    /// A key that can never match (null id, empty name) short-circuits: the
    /// callback runs right away with `None` and nothing is queued.
    pub fn pop_layer_async<F>(&self, key: impl Into<LayerKey>, callback: F)
    where
        F: FnOnce(Option<Box<dyn Layer>>) + Send + 'static,
    {
        let key = key.into();
        if !key.is_valid() {
            debug!(%key, "pop request with invalid key; answering immediately");
            callback(None);
            return;
        }
        self.shared.queue.push(PendingOp::Pop {
            key,
            callback: Box::new(callback),
        });
    }

    /// Asks the loop to exit after the current frame. Idempotent.
    pub fn stop(&self) {
        if self.shared.running.swap(false, Ordering::AcqRel) {
            info!("stop requested");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Number of requests waiting for the next drain.
    pub fn pending_len(&self) -> usize {
        self.shared.queue.len()
    }
}

/// What a single frame did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame_index: u64,
    pub applied_ops: usize,
    pub updated_layers: usize,
    pub failed_updates: usize,
    pub delta_seconds: f32,
}

pub struct Application {
    config: EngineConfig,
    layers: LayerStack,
    timer: FrameTimer,
    logging: Logging,
    state: AppState,
    handle: AppHandle,
    frame_index: u64,
}

impl Application {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_time_source(config, Box::new(SystemClock))
    }

    pub fn with_time_source(config: EngineConfig, source: BoxedTimeSource) -> Self {
        let logging = Logging::new(config.log.clone());
        Self {
            config,
            layers: LayerStack::new(),
            timer: FrameTimer::new(source),
            logging,
            state: AppState::Created,
            handle: AppHandle::default(),
            frame_index: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn handle(&self) -> AppHandle {
        self.handle.clone()
    }

    /// Validates the configuration and brings logging up.
    ///
    /// On failure the error is also written to stderr, since the logger may
    /// be the thing that failed.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.state != AppState::Created {
            return Err(EngineError::InvalidState {
                operation: "initialize",
                state: self.state,
            });
        }
        self.state = AppState::Initializing;
        profile_scope!("Application::initialize");

        let result = self
            .config
            .validate()
            .map_err(EngineError::from)
            .and_then(|()| self.logging.init().map_err(EngineError::from));
        if let Err(err) = result {
            eprintln!("rayengine: initialization failed: {err}");
            return Err(err);
        }

        self.state = AppState::Initialized;
        info!("application initialised");
        Ok(())
    }

    /// Runs frames until [`stop`](Self::stop) is observed, then shuts down.
    ///
    /// Initializes first when that has not happened yet; if initialization
    /// fails the loop never starts, shutdown still runs, and the error is
    /// returned.
    pub fn run(&mut self) -> Result<(), EngineError> {
        match self.state {
            AppState::Created => {
                if let Err(err) = self.initialize() {
                    self.shutdown();
                    return Err(err);
                }
            }
            AppState::Initialized => {}
            state => {
                return Err(EngineError::InvalidState {
                    operation: "run",
                    state,
                })
            }
        }

        self.state = AppState::Running;
        self.handle.shared.running.store(true, Ordering::Release);
        self.timer.reset();
        info!(
            layers = self.layers.len(),
            pending = self.handle.pending_len(),
            "entering frame loop"
        );

        while self.handle.is_running() {
            self.run_frame();
            if let Some(max_frames) = self.config.frame.max_frames {
                if self.frame_index >= max_frames {
                    debug!(max_frames, "frame limit reached");
                    self.handle.stop();
                }
            }
            self.pause();
        }

        self.state = AppState::Stopping;
        info!(frames = self.frame_index, "frame loop exited");
        self.shutdown();
        Ok(())
    }

    /// One frame: apply pending requests, advance the timer, update every
    /// live layer. Update failures are logged and never stop the frame.
    pub fn run_frame(&mut self) -> FrameStats {
        let applied_ops = self.apply_pending();
        let delta_seconds = self.timer.tick().as_secs_f32();

        let mut updated_layers = 0;
        let mut failed_updates = 0;
        for layer in self.layers.iter_mut() {
            updated_layers += 1;
            if let Err(err) = layer.on_update(delta_seconds) {
                failed_updates += 1;
                error!(layer = %layer.name(), error = %err, "on_update failed");
            }
        }

        let stats = FrameStats {
            frame_index: self.frame_index,
            applied_ops,
            updated_layers,
            failed_updates,
            delta_seconds,
        };
        self.frame_index += 1;
        stats
    }

    /// Drains the queue and applies the batch in enqueue order. Requests
    /// queued while the batch runs wait for the next call.
    pub fn apply_pending(&mut self) -> usize {
        let batch = self.handle.shared.queue.take_batch();
        let count = batch.len();
        if count > 0 {
            debug!(count, "applying pending layer requests");
        }
        for op in batch {
            op.apply(&mut self.layers);
        }
        count
    }

    fn pause(&self) {
        let interval = self.config.frame.yield_interval;
        if interval.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(interval);
        }
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Closes the request queue, discarding anything still in it, and
    /// releases logging. Layers are cleared when the application is dropped.
    pub fn shutdown(&mut self) {
        if self.state == AppState::Shutdown {
            return;
        }
        self.handle.shared.running.store(false, Ordering::Release);
        let discarded = self.handle.shared.queue.close();
        if !discarded.is_empty() {
            warn!(
                count = discarded.len(),
                "discarding pending layer requests at shutdown"
            );
        }
        drop(discarded);
        info!(
            frames = self.frame_index,
            layers = self.layers.len(),
            "application shut down"
        );
        self.logging.shutdown();
        self.state = AppState::Shutdown;
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.timer.elapsed_seconds()
    }

    /// Main thread only; takes effect immediately.
    pub fn push_layer(&mut self, layer: Box<dyn Layer>) -> Result<LayerId, EngineError> {
        self.layers.push_layer(layer)
    }

    /// Main thread only; takes effect immediately.
    pub fn push_overlay(&mut self, overlay: Box<dyn Layer>) -> Result<LayerId, EngineError> {
        self.layers.push_overlay(overlay)
    }

    pub fn layer_stack(&self) -> &LayerStack {
        &self.layers
    }

    pub fn layer_stack_mut(&mut self) -> &mut LayerStack {
        &mut self.layers
    }

    pub fn push_layer_async(&self, layer: Box<dyn Layer>) -> LayerId {
        self.handle.push_layer_async(layer)
    }

    pub fn push_overlay_async(&self, overlay: Box<dyn Layer>) -> LayerId {
        self.handle.push_overlay_async(overlay)
    }

    pub fn remove_layer_async(&self, key: impl Into<LayerKey>) {
        self.handle.remove_layer_async(key);
    }

    pub fn pop_layer_async<F>(&self, key: impl Into<LayerKey>, callback: F)
    where
        F: FnOnce(Option<Box<dyn Layer>>) + Send + 'static,
    {
        self.handle.pop_layer_async(key, callback);
    }

    pub fn pending_len(&self) -> usize {
        self.handle.pending_len()
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("state", &self.state)
            .field("frame_index", &self.frame_index)
            .field("layers", &self.layers)
            .field("pending", &self.handle.pending_len())
            .finish()
    }
}
