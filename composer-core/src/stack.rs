//! The ordered layer stack. Index 0 is the topmost layer.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::{ComposerError, ComposerResult, Layer, LayerId};

/// Direction for [`LayerStack::reorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderDirection {
    /// One step towards the top.
    Forward,
    /// One step towards the bottom.
    Backward,
    /// To the very top.
    ToFront,
    /// To the very bottom.
    ToBack,
}

/// Ordered collection of all layers in a composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from layers ordered top to bottom.
    #[must_use]
    pub fn from_layers(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    /// Layers ordered top to bottom.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Consume the stack, returning its layers top to bottom.
    #[must_use]
    pub fn into_layers(self) -> Vec<Layer> {
        self.layers
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the stack has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Insert a layer on top of every other layer.
    pub fn push_top(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        self.layers.insert(0, layer);
        id
    }

    /// Insert a layer directly above another one (or on top if `below` is gone).
    pub fn insert_above(&mut self, below: LayerId, layer: Layer) -> LayerId {
        let id = layer.id;
        let index = self.index_of(below).unwrap_or(0);
        self.layers.insert(index, layer);
        id
    }

    /// Remove a layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn remove(&mut self, id: LayerId) -> ComposerResult<Layer> {
        let index = self
            .index_of(id)
            .ok_or_else(|| ComposerError::LayerNotFound(id.to_string()))?;
        Ok(self.layers.remove(index))
    }

    /// Position of a layer in the stack (0 = top).
    #[must_use]
    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Get a layer by ID.
    #[must_use]
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Get a mutable reference to a layer by ID.
    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Whether the stack contains a layer with this ID.
    #[must_use]
    pub fn contains(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Iterate over layers top to bottom.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Iterate mutably over layers top to bottom.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.layers.iter_mut()
    }

    /// Topmost visible, unlocked layer under a canvas-space point.
    ///
    /// Locked layers are transparent to the pointer so clicks fall through.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<LayerId> {
        self.layers
            .iter()
            .find(|l| l.is_interactive() && l.contains_point(point))
            .map(|l| l.id)
    }

    /// Move a layer within the stack. Returns `false` if nothing moved.
    pub fn reorder(&mut self, id: LayerId, direction: ReorderDirection) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let last = self.layers.len() - 1;
        let target = match direction {
            ReorderDirection::Forward => index.saturating_sub(1),
            ReorderDirection::Backward => (index + 1).min(last),
            ReorderDirection::ToFront => 0,
            ReorderDirection::ToBack => last,
        };
        if target == index {
            return false;
        }
        let layer = self.layers.remove(index);
        self.layers.insert(target, layer);
        true
    }
}

impl From<Vec<Layer>> for LayerStack {
    fn from(layers: Vec<Layer>) -> Self {
        Self::from_layers(layers)
    }
}
