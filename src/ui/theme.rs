//! Theme configuration

use iced::widget::{button, container};
use iced::{Background, Border, Color, Theme};

pub const BACKGROUND: Color = Color::from_rgb(0.09, 0.09, 0.11);
pub const SURFACE: Color = Color::from_rgb(0.12, 0.12, 0.14);
pub const SURFACE_HIGHLIGHT: Color = Color::from_rgb(0.18, 0.18, 0.22);
pub const BORDER: Color = Color::from_rgb(0.25, 0.25, 0.28);
pub const PRIMARY: Color = Color::from_rgb(0.4, 0.55, 1.0);
pub const TEXT: Color = Color::from_rgb(0.95, 0.95, 0.95);
pub const TEXT_MUTED: Color = Color::from_rgb(0.55, 0.55, 0.6);
pub const TEXT_PLACEHOLDER: Color = Color::from_rgb(0.4, 0.4, 0.45);
pub const SELECTION: Color = Color::from_rgb(0.2, 0.25, 0.35);
pub const OVERLAY: Color = Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 0.6,
};

pub fn panel(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(SURFACE)),
        border: Border {
            color: BORDER,
            width: 1.0,
            radius: 12.0.into(),
        },
        ..Default::default()
    }
}

pub fn window(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(BACKGROUND)),
        ..Default::default()
    }
}

pub fn overlay(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(OVERLAY)),
        ..Default::default()
    }
}

/// Product card; selected cards get the selection fill and a primary border
pub fn card(selected: bool) -> impl Fn(&Theme, button::Status) -> button::Style {
    move |_theme, status| {
        let fill = match (selected, status) {
            (true, _) => SELECTION,
            (false, button::Status::Hovered) => SURFACE_HIGHLIGHT,
            (false, _) => SURFACE,
        };
        button::Style {
            background: Some(Background::Color(fill)),
            text_color: TEXT,
            border: Border {
                color: if selected { PRIMARY } else { BORDER },
                width: if selected { 2.0 } else { 1.0 },
                radius: 8.0.into(),
            },
            ..Default::default()
        }
    }
}
