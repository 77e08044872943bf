//! HTML markup for the widget views
//!
//! Used by the headless `generate`, `products` and `details` commands; the desktop
//! window draws the same view models with iced.

use super::view_model::{CardView, ModalView, SummaryItem};
use crate::backend::types::Citation;
use crate::markdown::escape_html;

pub const CATALOG_PLACEHOLDER: &str = "Select a category to view products";

pub fn placeholder(message: &str) -> String {
    format!("<div class=\"placeholder-message\">{}</div>", escape_html(message))
}

pub fn card_grid(cards: &[CardView]) -> String {
    cards
        .iter()
        .map(|card| {
            let class = if card.selected {
                "product-card selected"
            } else {
                "product-card"
            };
            format!(
                "<div class=\"{}\" data-id=\"{}\"><img src=\"{}\" alt=\"{}\"><div class=\"product-info\"><h3>{}</h3><p>{}</p><button class=\"details-btn\" aria-expanded=\"false\">Details</button></div></div>",
                class,
                card.id,
                escape_html(&card.image),
                escape_html(&card.name),
                escape_html(&card.name),
                escape_html(&card.brand)
            )
        })
        .collect()
}

pub fn summary_list(items: &[SummaryItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "<div class=\"selected-product-item\" data-id=\"{0}\"><span>{1}</span><button class=\"remove-btn\" data-id=\"{0}\">Remove</button></div>",
                item.id,
                escape_html(&item.name)
            )
        })
        .collect()
}

pub fn modal(view: &ModalView) -> String {
    format!(
        "<div class=\"modal-overlay\"><div class=\"modal\" role=\"dialog\" aria-modal=\"true\" aria-label=\"{1}\" data-id=\"{0}\"><button class=\"modal-close\" aria-label=\"Close\">×</button><h3>{1}</h3><p class=\"modal-meta\">{2} · {3}</p><p>{4}</p></div></div>",
        view.id,
        escape_html(&view.title),
        escape_html(&view.brand),
        escape_html(&view.category),
        escape_html(&view.description)
    )
}

/// "Sources" block; empty when there are no citations
pub fn sources(citations: &[Citation]) -> String {
    if citations.is_empty() {
        return String::new();
    }
    let items: String = citations
        .iter()
        .map(|c| {
            format!(
                "<li><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a><div class=\"cite-snippet\">{}</div></li>",
                escape_html(&c.url),
                escape_html(&c.title),
                escape_html(&c.snippet)
            )
        })
        .collect();
    format!("<div class=\"ai-citations\"><h4>Sources</h4><ul>{}</ul></div>", items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_catalog;
    use crate::selection::SelectionStore;
    use crate::ui::view_model;
    use once_cell::sync::Lazy;
    use regex::Regex;
    use std::collections::BTreeSet;

    static SELECTED_CARD: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"class="product-card selected" data-id="(\d+)""#).unwrap());
    static SUMMARY_ITEM: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"class="selected-product-item" data-id="(\d+)""#).unwrap());

    fn ids(re: &Regex, html: &str) -> BTreeSet<u32> {
        re.captures_iter(html)
            .map(|c| c[1].parse().unwrap())
            .collect()
    }

    #[test]
    fn test_rendered_grid_matches_rendered_summary() {
        let catalog = sample_catalog();
        let mut selection = SelectionStore::new();
        for id in [2, 5, 1, 5, 3] {
            selection.toggle(id);
        }
        selection.remove(1);

        let grid = card_grid(&view_model::cards(&catalog, "", "", &selection));
        let list = summary_list(&view_model::summary(Some(&catalog), &selection));
        assert_eq!(ids(&SELECTED_CARD, &grid), ids(&SUMMARY_ITEM, &list));
        assert_eq!(ids(&SUMMARY_ITEM, &list), [2, 3].into_iter().collect());
    }

    #[test]
    fn test_markup_is_escaped() {
        let view = ModalView {
            id: 1,
            title: "<script>".to_string(),
            brand: String::new(),
            category: String::new(),
            description: "a & b".to_string(),
        };
        let html = modal(&view);
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
    }

    #[test]
    fn test_modal_carries_product_details() {
        let catalog = sample_catalog();
        let html = modal(&view_model::modal(catalog.find(3).unwrap()));
        assert!(html.contains("data-id=\"3\""));
        assert!(html.contains("<h3>Night Cream</h3>"));
        assert!(html.contains("Garnier · Moisturizer"));
    }

    #[test]
    fn test_sources_empty_and_filled() {
        assert_eq!(sources(&[]), "");
        let html = sources(&[Citation {
            title: "Retinol".to_string(),
            url: "https://example.com/r".to_string(),
            snippet: "vitamin A".to_string(),
        }]);
        assert!(html.starts_with("<div class=\"ai-citations\"><h4>Sources</h4><ul><li>"));
        assert!(html.contains("href=\"https://example.com/r\""));
        assert!(html.contains("<div class=\"cite-snippet\">vitamin A</div>"));
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(
            placeholder(CATALOG_PLACEHOLDER),
            "<div class=\"placeholder-message\">Select a category to view products</div>"
        );
    }
}
