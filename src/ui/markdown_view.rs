//! Draws parsed markdown blocks with iced text widgets

use iced::font::Weight;
use iced::widget::text::Span;
use iced::widget::{column, rich_text, row, span, text, Column};
use iced::{Element, Font};

use super::theme;
use crate::backend::types::Citation;
use crate::markdown::{line_text, parse, Block, Inline, Line};

const BOLD: Font = Font {
    weight: Weight::Bold,
    ..Font::DEFAULT
};

/// Text runs of a line, flagged bold or not
fn runs(line: &Line) -> Vec<(&str, bool)> {
    line.iter()
        .map(|inline| match inline {
            Inline::Plain(t) => (t.as_str(), false),
            Inline::Bold(t) => (t.as_str(), true),
        })
        .collect()
}

fn line_view<'a, Message: Clone + 'static>(line: &Line, size: u16) -> Element<'a, Message> {
    let spans: Vec<Span<'a, Message, Font>> = runs(line)
        .into_iter()
        .map(|(t, bold)| {
            let run = span(t.to_string()).color(theme::TEXT);
            if bold {
                run.font(BOLD)
            } else {
                run
            }
        })
        .collect();
    rich_text(spans).size(size).into()
}

pub fn view<'a, Message: Clone + 'static>(md: &str) -> Element<'a, Message> {
    let blocks: Vec<Element<'a, Message>> = parse(md)
        .iter()
        .map(|block| match block {
            Block::Heading(level, line) => {
                let size = match level {
                    1 => 24,
                    2 => 20,
                    _ => 17,
                };
                text(line_text(line))
                    .size(size)
                    .font(BOLD)
                    .color(theme::TEXT)
                    .into()
            }
            Block::List(items) => Column::with_children(items.iter().map(|item| {
                row![text("•").color(theme::PRIMARY), line_view(item, 15)]
                    .spacing(8)
                    .into()
            }))
            .spacing(4)
            .into(),
            Block::Paragraph(lines) => {
                Column::with_children(lines.iter().map(|line| line_view(line, 15)))
                    .spacing(2)
                    .into()
            }
        })
        .collect();

    Column::with_children(blocks).spacing(10).into()
}

pub fn sources<'a, Message: Clone + 'static>(citations: &[Citation]) -> Element<'a, Message> {
    if citations.is_empty() {
        return column![].into();
    }
    let items = citations.iter().map(|c| {
        column![
            text(c.title.clone()).size(14).color(theme::PRIMARY),
            text(c.url.clone()).size(11).color(theme::TEXT_MUTED),
            text(c.snippet.clone()).size(12).color(theme::TEXT_MUTED),
        ]
        .spacing(2)
        .into()
    });
    column![
        text("Sources").size(15).font(BOLD).color(theme::TEXT),
        Column::with_children(items).spacing(8)
    ]
    .spacing(6)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_line(md: &str) -> Line {
        match parse(md).into_iter().next() {
            Some(Block::Paragraph(lines)) => lines[0].clone(),
            Some(Block::List(items)) => items[0].clone(),
            other => panic!("Expected text block, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_line_keeps_bold_run() {
        let line = first_line("Use **SPF** daily");
        assert_eq!(runs(&line), vec![("Use ", false), ("SPF", true), (" daily", false)]);
    }

    #[test]
    fn test_list_item_runs() {
        let line = first_line("- **AM:** cleanse then **moisturize**");
        assert_eq!(
            runs(&line),
            vec![("AM:", true), (" cleanse then ", false), ("moisturize", true)]
        );
    }
}
