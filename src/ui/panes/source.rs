//! Source pane rendering with syntax highlighting
//!
//! Displays the selected fixture with line numbers. Lines on which a
//! scanned declaration starts get a marker in the gutter, so a reader can
//! see at a glance what the inventory picked up.
//!
//! Highlighting works line by line with a small character tokenizer; it
//! does not need the full lexer and never fails on odd input.

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Simple syntax highlighting for C and C++ lines
fn highlight_source_code(line: &str) -> Line<'_> {
    let trimmed = line.trim_start();

    // Whole-line cases: preprocessor and block comment bodies
    if trimmed.starts_with('#') {
        return Line::from(Span::styled(
            line.to_string(),
            Style::default().fg(DEFAULT_THEME.directive),
        ));
    }
    if trimmed.starts_with("/*") || trimmed.starts_with('*') {
        return Line::from(Span::styled(
            line.to_string(),
            Style::default().fg(DEFAULT_THEME.comment),
        ));
    }

    let mut spans = Vec::new();
    let mut current_word = String::new();
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (byte, c) = chars[i];

        // Line comments run to the end
        if c == '/' && chars.get(i + 1).is_some_and(|&(_, n)| n == '/') {
            flush_word(&mut spans, &mut current_word, false);
            spans.push(Span::styled(
                line[byte..].to_string(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        if c == '"' || c == '\'' {
            flush_word(&mut spans, &mut current_word, false);
            let mut end = i + 1;
            while end < chars.len() && chars[end].1 != c {
                end += if chars[end].1 == '\\' { 2 } else { 1 };
            }
            end = (end + 1).min(chars.len());
            let end_byte = chars.get(end).map_or(line.len(), |&(b, _)| b);
            spans.push(Span::styled(
                line[byte..end_byte].to_string(),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' {
            flush_word(&mut spans, &mut current_word, c == '(');

            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    flush_word(&mut spans, &mut current_word, false);
    Line::from(spans)
}

fn flush_word(spans: &mut Vec<Span<'_>>, word: &mut String, is_function: bool) {
    if word.is_empty() {
        return;
    }
    let style = get_keyword_style(word, is_function);
    spans.push(Span::styled(std::mem::take(word), style));
}

fn get_keyword_style(word: &str, is_function: bool) -> Style {
    match word {
        "int" | "char" | "void" | "bool" | "_Bool" | "float" | "double" | "long" | "short"
        | "unsigned" | "signed" | "auto" | "size_t" => Style::default().fg(DEFAULT_THEME.type_name),
        "struct" | "union" | "enum" | "typedef" | "class" | "namespace" | "template"
        | "typename" | "using" | "public" | "private" | "protected" | "virtual" | "const"
        | "static" | "extern" | "inline" | "return" | "if" | "else" | "while" | "for" | "do"
        | "switch" | "case" | "default" | "break" | "continue" | "sizeof" | "new" | "delete" => {
            Style::default()
                .fg(DEFAULT_THEME.keyword)
                .add_modifier(Modifier::BOLD)
        }
        "NULL" | "nullptr" | "true" | "false" => Style::default().fg(DEFAULT_THEME.number),
        _ if word.starts_with(|c: char| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ if is_function => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Render the source pane.
///
/// `scroll` is clamped here so the last line never scrolls above the bottom
/// border.
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    source_code: &str,
    declaration_lines: &[usize],
    is_focused: bool,
    scroll: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = source_code.lines().collect();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let max_scroll = lines.len().saturating_sub(visible_height);
    *scroll = (*scroll).min(max_scroll);

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_declaration = declaration_lines.binary_search(&line_num).is_ok();

            let (marker, num_style) = if is_declaration {
                (
                    Span::styled("▸", Style::default().fg(DEFAULT_THEME.marker)),
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                (Span::raw(" "), Style::default().fg(DEFAULT_THEME.comment))
            };

            let mut spans = vec![marker, Span::styled(format!("{line_num:4} "), num_style)];
            spans.extend(highlight_source_code(line).spans);
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_highlight_preserves_text() {
        let samples = [
            "int main(void) {",
            "    printf(\"Value: %d\\n\", s->field1); // print",
            "char c = '\\'';",
            "    TestClass(int value = 0) : value(value) {}",
            "#include <stdio.h>",
            " * Doc body",
            "",
        ];
        for sample in samples {
            assert_eq!(text(&highlight_source_code(sample)), sample);
        }
    }

    #[test]
    fn test_keyword_and_function_styles() {
        let line = highlight_source_code("class Foo { void run(); };");
        let class = line.spans.iter().find(|s| s.content == "class").unwrap();
        assert_eq!(class.style.fg, Some(DEFAULT_THEME.keyword));
        let run = line.spans.iter().find(|s| s.content == "run").unwrap();
        assert_eq!(run.style.fg, Some(DEFAULT_THEME.function));
        let void = line.spans.iter().find(|s| s.content == "void").unwrap();
        assert_eq!(void.style.fg, Some(DEFAULT_THEME.type_name));
    }

    #[test]
    fn test_comment_and_directive_lines() {
        let comment = highlight_source_code("/** Doc */");
        assert_eq!(comment.spans.len(), 1);
        assert_eq!(comment.spans[0].style.fg, Some(DEFAULT_THEME.comment));

        let directive = highlight_source_code("#include \"myheader.h\"");
        assert_eq!(directive.spans[0].style.fg, Some(DEFAULT_THEME.directive));
    }
}
