use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

/// A named unit of per-frame update logic.
///
/// Layers are handed to the engine as `Box<dyn Layer>` and are owned by
/// exactly one container at a time. All hooks run on the main-loop thread;
/// `Send` is required so ownership can travel through the deferred queue.
pub trait Layer: Send {
    /// Stable name supplied at construction. Not required to be unique.
    fn name(&self) -> &str;

    /// Called once when a layer stack accepts ownership.
    ///
    /// Returning an error rolls the insertion back; the layer never becomes
    /// part of the stack.
    fn on_attach(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once right before the layer leaves the stack. Errors are
    /// logged and otherwise ignored.
    fn on_detach(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once per frame with the time since the previous frame.
    fn on_update(&mut self, _delta_seconds: f32) -> Result<()> {
        Ok(())
    }
}

impl fmt::Debug for dyn Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer").field("name", &self.name()).finish()
    }
}

/// Process-unique identity of a layer handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId {
    /// The null identity. Never issued; lookups with it always miss.
    pub const NONE: LayerId = LayerId(0);

    pub(crate) fn next() -> Self {
        LayerId(NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Whether this id was ever handed out by the engine.
    pub fn is_issued(self) -> bool {
        self.0 != 0 && self.0 < NEXT_LAYER_ID.load(Ordering::Relaxed)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a layer is looked up for removal, popping or membership checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LayerKey {
    /// Exact object identity.
    Id(LayerId),
    /// First layer carrying this name, in iteration order.
    Name(String),
}

impl LayerKey {
    /// Keys that can never match anything: the null id, ids the engine
    /// never issued, and the empty name.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Id(id) => id.is_issued(),
            Self::Name(name) => !name.is_empty(),
        }
    }

    pub(crate) fn matches(&self, id: LayerId, layer: &dyn Layer) -> bool {
        match self {
            Self::Id(target) => *target == id,
            Self::Name(name) => layer.name() == name,
        }
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

impl From<LayerId> for LayerKey {
    fn from(id: LayerId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for LayerKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for LayerKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&LayerKey> for LayerKey {
    fn from(key: &LayerKey) -> Self {
        key.clone()
    }
}
