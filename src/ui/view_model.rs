//! What the widget shows, independent of how it is drawn
//!
//! The card grid and the selection summary are both derived from the same
//! `SelectionStore`, so the two views cannot disagree.

use std::fmt;

use crate::catalog::{category_label, Catalog, Product, ProductId};
use crate::selection::SelectionStore;

pub const UNKNOWN_PRODUCT: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub image: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryItem {
    pub id: ProductId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalView {
    pub id: ProductId,
    pub title: String,
    pub brand: String,
    pub category: String,
    pub description: String,
}

/// Entry of the category picker; `All` means no category filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOption {
    All,
    Category(String),
}

impl CategoryOption {
    /// Value for `Catalog::filter`
    pub fn filter_value(&self) -> &str {
        match self {
            CategoryOption::All => "",
            CategoryOption::Category(c) => c,
        }
    }
}

impl fmt::Display for CategoryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryOption::All => write!(f, "All categories"),
            CategoryOption::Category(c) => write!(f, "{}", category_label(c)),
        }
    }
}

pub fn category_options(catalog: &Catalog) -> Vec<CategoryOption> {
    std::iter::once(CategoryOption::All)
        .chain(catalog.categories().into_iter().map(CategoryOption::Category))
        .collect()
}

pub fn cards(
    catalog: &Catalog,
    category: &str,
    query: &str,
    selection: &SelectionStore,
) -> Vec<CardView> {
    catalog
        .filter(category, query)
        .into_iter()
        .map(|p| CardView {
            id: p.id,
            name: p.name.clone(),
            brand: p.brand.clone(),
            image: p.image.clone(),
            selected: selection.contains(p.id),
        })
        .collect()
}

/// Selected products in selection order; ids the catalog cannot resolve
/// (or every id, before the catalog is loaded) show as "Unknown"
pub fn summary(catalog: Option<&Catalog>, selection: &SelectionStore) -> Vec<SummaryItem> {
    selection
        .list()
        .iter()
        .map(|&id| SummaryItem {
            id,
            name: catalog
                .and_then(|c| c.find(id))
                .map(|p| p.name.clone())
                .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
        })
        .collect()
}

pub fn modal(product: &Product) -> ModalView {
    ModalView {
        id: product.id,
        title: product.name.clone(),
        brand: product.brand.clone(),
        category: category_label(&product.category),
        description: product.description.clone(),
    }
}

/// At most one detail overlay at a time; opening another replaces it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModalState {
    open: Option<ProductId>,
}

impl ModalState {
    pub fn open(&mut self, id: ProductId) {
        if let Some(previous) = self.open.replace(id) {
            tracing::debug!("Replacing details overlay for {} with {}", previous, id);
        }
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn current(&self) -> Option<ProductId> {
        self.open
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }
}
