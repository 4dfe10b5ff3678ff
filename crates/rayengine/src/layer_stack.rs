//! Ordered, owning container of layers.
//!
//! Layers live in a single vector split by an insertion boundary:
//!
//! ```text
//!   [ layer0 layer1 ... | overlay0 overlay1 ... ]
//!                       ^ insert_index
//! ```
//!
//! `push_layer` inserts at the boundary and advances it, so ordinary layers
//! keep the order they were pushed in and always update before overlays.
//! The stack is single-threaded: it must only be touched from the thread that
//! runs the frame loop. Other threads go through the application's deferred
//! queue instead.

use std::fmt;

use tracing::{error, trace};

use crate::error::EngineError;
use crate::layer::{Layer, LayerId, LayerKey};

struct LayerEntry {
    id: LayerId,
    layer: Box<dyn Layer>,
}

/// Which side of the insertion boundary a layer lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Layers,
    Overlays,
}

#[derive(Default)]
pub struct LayerStack {
    entries: Vec<LayerEntry>,
    insert_index: usize,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfers ownership of `layer` into the layers segment and attaches it.
    ///
    /// On attach failure the layer is removed again and dropped, and the error
    /// is returned; the stack is left exactly as it was.
    pub fn push_layer(&mut self, layer: Box<dyn Layer>) -> Result<LayerId, EngineError> {
        let id = LayerId::next();
        self.attach_layer(id, layer)?;
        Ok(id)
    }

    /// Transfers ownership of `overlay` to the end of the stack and attaches it.
    pub fn push_overlay(&mut self, overlay: Box<dyn Layer>) -> Result<LayerId, EngineError> {
        let id = LayerId::next();
        self.attach_overlay(id, overlay)?;
        Ok(id)
    }

    pub(crate) fn attach_layer(
        &mut self,
        id: LayerId,
        layer: Box<dyn Layer>,
    ) -> Result<(), EngineError> {
        let index = self.insert_index;
        self.entries.insert(index, LayerEntry { id, layer });
        self.insert_index += 1;
        self.run_attach(index, Segment::Layers)
    }

    pub(crate) fn attach_overlay(
        &mut self,
        id: LayerId,
        overlay: Box<dyn Layer>,
    ) -> Result<(), EngineError> {
        self.entries.push(LayerEntry { id, layer: overlay });
        let index = self.entries.len() - 1;
        self.run_attach(index, Segment::Overlays)
    }

    fn run_attach(&mut self, index: usize, segment: Segment) -> Result<(), EngineError> {
        let entry = &mut self.entries[index];
        let id = entry.id;
        match entry.layer.on_attach() {
            Ok(()) => {
                trace!(layer = %entry.layer.name(), %id, ?segment, "layer attached");
                Ok(())
            }
            Err(source) => {
                let name = entry.layer.name().to_string();
                error!(layer = %name, %id, error = %source, "[LayerStack] on_attach failed; rolling back");
                self.rollback(id);
                Err(EngineError::Attach {
                    layer: name,
                    source,
                })
            }
        }
    }

    // Looks the entry up again instead of trusting the insertion index.
    fn rollback(&mut self, id: LayerId) {
        if let Some(index) = self.find_index(&LayerKey::Id(id)) {
            self.entries.remove(index);
            if index < self.insert_index {
                self.insert_index -= 1;
            }
        }
    }

    /// Detaches and drops the first layer matching `key`.
    ///
    /// Returns `false` when nothing matched.
    pub fn remove_layer(&mut self, key: impl Into<LayerKey>) -> bool {
        self.take(&key.into()).is_some()
    }

    /// Detaches the first layer matching `key` and hands ownership back.
    pub fn pop_layer(&mut self, key: impl Into<LayerKey>) -> Option<Box<dyn Layer>> {
        self.take(&key.into())
    }

    fn take(&mut self, key: &LayerKey) -> Option<Box<dyn Layer>> {
        let index = self.find_index(key)?;
        let entry = &mut self.entries[index];
        detach(entry.id, entry.layer.as_mut());
        let entry = self.entries.remove(index);
        if index < self.insert_index {
            self.insert_index -= 1;
        }
        Some(entry.layer)
    }

    pub fn contains(&self, key: impl Into<LayerKey>) -> bool {
        self.find_index(&key.into()).is_some()
    }

    pub fn segment_of(&self, key: impl Into<LayerKey>) -> Option<Segment> {
        self.find_index(&key.into()).map(|index| {
            if index < self.insert_index {
                Segment::Layers
            } else {
                Segment::Overlays
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index separating the layers segment from the overlays segment.
    pub fn insertion_boundary(&self) -> usize {
        self.insert_index
    }

    /// Detaches every layer (ignoring detach failures), drops them all and
    /// resets the boundary.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            detach(entry.id, entry.layer.as_mut());
        }
        self.entries.clear();
        self.insert_index = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Layer> + '_ {
        self.entries.iter().map(|entry| entry.layer.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn Layer + 'static)> + '_ {
        self.entries.iter_mut().map(|entry| entry.layer.as_mut())
    }

    pub fn layers(&self) -> impl Iterator<Item = &dyn Layer> + '_ {
        self.entries[..self.insert_index]
            .iter()
            .map(|entry| entry.layer.as_ref())
    }

    pub fn overlays(&self) -> impl Iterator<Item = &dyn Layer> + '_ {
        self.entries[self.insert_index..]
            .iter()
            .map(|entry| entry.layer.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.iter().map(|layer| layer.name().to_string()).collect()
    }

    fn find_index(&self, key: &LayerKey) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| key.matches(entry.id, entry.layer.as_ref()))
    }
}

fn detach(id: LayerId, layer: &mut dyn Layer) {
    match layer.on_detach() {
        Ok(()) => trace!(layer = %layer.name(), %id, "layer detached"),
        Err(err) => {
            error!(layer = %layer.name(), %id, error = %err, "[LayerStack] on_detach failed")
        }
    }
}

impl Drop for LayerStack {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerStack")
            .field("layers", &self.layers().map(|l| l.name()).collect::<Vec<_>>())
            .field(
                "overlays",
                &self.overlays().map(|l| l.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
