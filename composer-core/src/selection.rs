//! Layer selection state.

use serde::{Deserialize, Serialize};

use crate::geometry::{bounding_box_of, Rect};
use crate::{ComposerError, ComposerResult, Layer, LayerId, LayerStack};

/// The set of currently selected layers.
///
/// Ids are kept in stack order (topmost first) so multi-layer operations see
/// the same order the stack does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    ids: Vec<LayerId>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected ids, topmost first.
    #[must_use]
    pub fn ids(&self) -> &[LayerId] {
        &self.ids
    }

    /// Whether the layer is selected.
    #[must_use]
    pub fn contains(&self, id: LayerId) -> bool {
        self.ids.contains(&id)
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of selected layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// The only selected id, if exactly one layer is selected.
    #[must_use]
    pub fn single(&self) -> Option<LayerId> {
        match self.ids.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }

    /// Select a layer, replacing the selection unless `additive`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer does not exist or is locked.
    pub fn select(&mut self, stack: &LayerStack, id: LayerId, additive: bool) -> ComposerResult<()> {
        let layer = stack
            .get(id)
            .ok_or_else(|| ComposerError::LayerNotFound(id.to_string()))?;
        if layer.locked {
            return Err(ComposerError::LayerLocked(id.to_string()));
        }
        if !additive {
            self.ids.clear();
        }
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
        self.sort_by_stack(stack);
        Ok(())
    }

    /// Toggle a layer in or out of the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer does not exist or is locked.
    pub fn toggle(&mut self, stack: &LayerStack, id: LayerId) -> ComposerResult<bool> {
        if self.contains(id) {
            self.ids.retain(|&s| s != id);
            return Ok(false);
        }
        self.select(stack, id, true)?;
        Ok(true)
    }

    /// Replace the selection with every selectable id in `ids`.
    ///
    /// Missing and locked layers are dropped.
    pub fn set(&mut self, stack: &LayerStack, ids: impl IntoIterator<Item = LayerId>) {
        self.ids.clear();
        for id in ids {
            if stack.get(id).is_some_and(|l| !l.locked) && !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
        self.sort_by_stack(stack);
    }

    /// Remove one id from the selection.
    pub fn remove(&mut self, id: LayerId) {
        self.ids.retain(|&s| s != id);
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids whose layers were removed or locked, and restore stack order.
    pub fn prune(&mut self, stack: &LayerStack) {
        self.ids
            .retain(|&id| stack.get(id).is_some_and(|l| !l.locked));
        self.sort_by_stack(stack);
    }

    /// Selected layers in stack order.
    #[must_use]
    pub fn layers<'a>(&self, stack: &'a LayerStack) -> Vec<&'a Layer> {
        stack.iter().filter(|l| self.contains(l.id)).collect()
    }

    /// Bounding box of the selected layers, `None` when nothing is selected.
    #[must_use]
    pub fn bounding_box(&self, stack: &LayerStack) -> Option<Rect> {
        bounding_box_of(self.layers(stack))
    }

    fn sort_by_stack(&mut self, stack: &LayerStack) {
        self.ids
            .sort_by_key(|&id| stack.index_of(id).unwrap_or(usize::MAX));
    }
}
