//! UI components

pub mod markdown_view;
pub mod markup;
pub mod search_bar;
pub mod theme;
pub mod view_model;
