//! Selected products
//!
//! Ordered set of product ids. Insertion order is kept for display; the
//! store never holds the same id twice.

use crate::backend::types::ProductSummary;
use crate::catalog::{Catalog, ProductId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChanged {
    Added(ProductId),
    Removed(ProductId),
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    ids: Vec<ProductId>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add if absent, remove if present
    pub fn toggle(&mut self, id: ProductId) -> SelectionChanged {
        if self.contains(id) {
            self.remove(id)
        } else {
            self.ids.push(id);
            SelectionChanged::Added(id)
        }
    }

    pub fn remove(&mut self, id: ProductId) -> SelectionChanged {
        let before = self.ids.len();
        self.ids.retain(|&existing| existing != id);
        if self.ids.len() == before {
            SelectionChanged::Unchanged
        } else {
            SelectionChanged::Removed(id)
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn list(&self) -> &[ProductId] {
        &self.ids
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Request payload for the selection; ids missing from the catalog are skipped
    pub fn resolve(&self, catalog: &Catalog) -> Vec<ProductSummary> {
        self.ids
            .iter()
            .filter_map(|&id| catalog.find(id))
            .map(ProductSummary::from)
            .collect()
    }
}
