//! Minimal markdown for routine and chat output
//!
//! Supported: `#`, `##`, `###` headings, `**bold**`, `-`/`*` list items,
//! blank line = paragraph break, single newline = line break. Anything
//! else is plain text. Text is HTML-escaped before markup is added.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"));

/// Run of inline text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Plain(String),
    Bold(String),
}

pub type Line = Vec<Inline>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(u8, Line),
    List(Vec<Line>),
    /// Lines separated by hard breaks
    Paragraph(Vec<Line>),
}

fn inline(text: &str) -> Line {
    let mut spans = Vec::new();
    let mut last = 0;
    for caps in BOLD.captures_iter(text) {
        let whole = caps.get(0).map(|m| (m.start(), m.end()));
        if let (Some((start, end)), Some(inner)) = (whole, caps.get(1)) {
            if start > last {
                spans.push(Inline::Plain(text[last..start].to_string()));
            }
            spans.push(Inline::Bold(inner.as_str().to_string()));
            last = end;
        }
    }
    if last < text.len() {
        spans.push(Inline::Plain(text[last..].to_string()));
    }
    spans
}

fn heading(line: &str) -> Option<(u8, &str)> {
    [("### ", 3), ("## ", 2), ("# ", 1)]
        .into_iter()
        .find_map(|(marker, level)| line.strip_prefix(marker).map(|rest| (level, rest)))
}

fn list_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ").or_else(|| line.strip_prefix("* "))
}

pub fn parse(md: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut list: Vec<Line> = Vec::new();
    let mut para: Vec<Line> = Vec::new();

    fn flush(blocks: &mut Vec<Block>, list: &mut Vec<Line>, para: &mut Vec<Line>) {
        if !list.is_empty() {
            blocks.push(Block::List(std::mem::take(list)));
        }
        if !para.is_empty() {
            blocks.push(Block::Paragraph(std::mem::take(para)));
        }
    }

    for raw in md.lines() {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            flush(&mut blocks, &mut list, &mut para);
        } else if let Some((level, rest)) = heading(line) {
            flush(&mut blocks, &mut list, &mut para);
            blocks.push(Block::Heading(level, inline(rest)));
        } else if let Some(item) = list_item(line) {
            if !para.is_empty() {
                blocks.push(Block::Paragraph(std::mem::take(&mut para)));
            }
            list.push(inline(item));
        } else {
            if !list.is_empty() {
                blocks.push(Block::List(std::mem::take(&mut list)));
            }
            para.push(inline(line));
        }
    }
    flush(&mut blocks, &mut list, &mut para);
    blocks
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn line_html(line: &Line) -> String {
    line.iter()
        .map(|span| match span {
            Inline::Plain(t) => escape_html(t),
            Inline::Bold(t) => format!("<strong>{}</strong>", escape_html(t)),
        })
        .collect()
}

/// Text of a line without markup, for plain renderers
pub fn line_text(line: &Line) -> String {
    line.iter()
        .map(|span| match span {
            Inline::Plain(t) | Inline::Bold(t) => t.as_str(),
        })
        .collect()
}

pub fn to_html(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            Block::Heading(level, line) => format!("<h{0}>{1}</h{0}>", level, line_html(line)),
            Block::List(items) => {
                let items: String = items
                    .iter()
                    .map(|item| format!("<li>{}</li>", line_html(item)))
                    .collect();
                format!("<ul>{}</ul>", items)
            }
            Block::Paragraph(lines) => {
                let lines: Vec<String> = lines.iter().map(line_html).collect();
                format!("<p>{}</p>", lines.join("<br>"))
            }
        })
        .collect()
}

pub fn render_html(md: &str) -> String {
    to_html(&parse(md))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings() {
        assert_eq!(
            render_html("# Routine\n## Morning\n### Step one"),
            "<h1>Routine</h1><h2>Morning</h2><h3>Step one</h3>"
        );
        // four hashes are not a heading
        assert_eq!(render_html("#### deep"), "<p>#### deep</p>");
    }

    #[test]
    fn test_bold_and_escape() {
        assert_eq!(
            render_html("Use **SPF 50** <daily> & \"always\""),
            "<p>Use <strong>SPF 50</strong> &lt;daily&gt; &amp; &quot;always&quot;</p>"
        );
    }

    #[test]
    fn test_list_items_grouped() {
        assert_eq!(
            render_html("## Evening\n- Cleanser\n* Serum\n- **Cream**"),
            "<h2>Evening</h2><ul><li>Cleanser</li><li>Serum</li><li><strong>Cream</strong></li></ul>"
        );
    }

    #[test]
    fn test_paragraphs_and_line_breaks() {
        assert_eq!(
            render_html("1. Wash\n2. Dry\n\nDone."),
            "<p>1. Wash<br>2. Dry</p><p>Done.</p>"
        );
    }

    #[test]
    fn test_list_then_text_splits_blocks() {
        let blocks = parse("- a\nafter");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::List(_)));
        assert!(matches!(blocks[1], Block::Paragraph(_)));
    }

    #[test]
    fn test_line_text_strips_markup() {
        let blocks = parse("Apply **gently** twice");
        match &blocks[0] {
            Block::Paragraph(lines) => assert_eq!(line_text(&lines[0]), "Apply gently twice"),
            other => panic!("Expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render_html(""), "");
        assert!(parse("\n\n").is_empty());
    }
}
