use std::fmt;
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{error, trace, warn};

use crate::layer::{Layer, LayerId, LayerKey};
use crate::layer_stack::LayerStack;

/// Receives the popped layer, or `None` when nothing matched.
pub type PopCallback = Box<dyn FnOnce(Option<Box<dyn Layer>>) + Send>;

/// One requested mutation of the layer stack, executed later on the main
/// thread. Payloads are owned, so an op runs at most once.
pub(crate) enum PendingOp {
    Push { id: LayerId, layer: Box<dyn Layer> },
    PushOverlay { id: LayerId, layer: Box<dyn Layer> },
    Remove { key: LayerKey },
    Pop { key: LayerKey, callback: PopCallback },
}

impl PendingOp {
    fn kind(&self) -> &'static str {
        match self {
            Self::Push { .. } => "push",
            Self::PushOverlay { .. } => "push_overlay",
            Self::Remove { .. } => "remove",
            Self::Pop { .. } => "pop",
        }
    }

    /// Executes the op against `stack`. Failures are logged; they never stop
    /// the rest of the batch.
    pub(crate) fn apply(self, stack: &mut LayerStack) {
        match self {
            Self::Push { id, layer } => {
                if let Err(err) = stack.attach_layer(id, layer) {
                    error!(%id, error = %err, "deferred push_layer failed");
                }
            }
            Self::PushOverlay { id, layer } => {
                if let Err(err) = stack.attach_overlay(id, layer) {
                    error!(%id, error = %err, "deferred push_overlay failed");
                }
            }
            Self::Remove { key } => {
                if !stack.remove_layer(&key) {
                    trace!(%key, "deferred remove found nothing");
                }
            }
            Self::Pop { key, callback } => {
                let popped = stack.pop_layer(&key);
                trace!(%key, found = popped.is_some(), "deferred pop");
                callback(popped);
            }
        }
    }
}

impl fmt::Debug for PendingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push { id, layer } | Self::PushOverlay { id, layer } => f
                .debug_struct(self.kind())
                .field("id", id)
                .field("layer", &layer.name())
                .finish(),
            Self::Remove { key } | Self::Pop { key, .. } => {
                f.debug_struct(self.kind()).field("key", key).finish()
            }
        }
    }
}

#[derive(Default)]
struct QueueState {
    ops: Vec<PendingOp>,
    closed: bool,
}

/// Mutex-guarded FIFO of pending ops.
///
/// The lock is held only to append or to swap the whole batch out; ops are
/// executed after it is released.
#[derive(Default)]
pub(crate) struct PendingQueue {
    state: Mutex<QueueState>,
}

impl PendingQueue {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `op`. Once the queue is closed the op is dropped with a warning.
    pub(crate) fn push(&self, op: PendingOp) {
        let kind = op.kind();
        let queued = {
            let mut state = self.lock();
            if state.closed {
                drop(state);
                warn!(op = ?op, "layer queue is shut down; discarding request");
                return;
            }
            state.ops.push(op);
            state.ops.len()
        };
        trace!(op = kind, queued, "queued layer request");
    }

    /// Takes every queued op, leaving the queue empty.
    pub(crate) fn take_batch(&self) -> Vec<PendingOp> {
        mem::take(&mut self.lock().ops)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().ops.len()
    }

    /// Refuses further ops and hands back whatever was still queued.
    pub(crate) fn close(&self) -> Vec<PendingOp> {
        let mut state = self.lock();
        state.closed = true;
        mem::take(&mut state.ops)
    }
}

impl fmt::Debug for PendingQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("PendingQueue")
            .field("len", &state.ops.len())
            .field("closed", &state.closed)
            .finish()
    }
}
