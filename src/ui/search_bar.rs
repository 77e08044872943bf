//! Category picker and product search input

use iced::widget::{pick_list, row, text_input};
use iced::{Background, Border, Color, Element, Length, Padding};

use super::theme;
use super::view_model::CategoryOption;

pub fn view<'a, Message: Clone + 'a>(
    options: Vec<CategoryOption>,
    selected: Option<CategoryOption>,
    query: &str,
    on_category: impl Fn(CategoryOption) -> Message + 'a,
    on_input: impl Fn(String) -> Message + 'a,
) -> Element<'a, Message> {
    let picker = pick_list(options, selected, on_category)
        .placeholder("Choose a category")
        .padding(10)
        .width(Length::Fixed(200.0));

    let search = text_input("Search products by name, brand or keyword...", query)
        .on_input(on_input)
        .padding(Padding::new(10.0))
        .size(16)
        .style(|_theme, _status| text_input::Style {
            background: Background::Color(Color::TRANSPARENT),
            border: Border {
                color: theme::BORDER,
                width: 1.0,
                radius: 8.0.into(),
            },
            icon: theme::TEXT_MUTED,
            placeholder: theme::TEXT_PLACEHOLDER,
            value: theme::TEXT,
            selection: theme::PRIMARY,
        });

    row![picker, search].spacing(12).into()
}
