//! Inventory pane: check results, declarations, includes and notes for the
//! selected fixture.

use crate::contract::FixtureReport;
use crate::scan::{DeclKind, Declaration};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(DEFAULT_THEME.primary)
            .add_modifier(Modifier::BOLD),
    ))
}

fn kind_style(kind: DeclKind) -> Style {
    if kind.is_type() || kind == DeclKind::Namespace {
        Style::default().fg(DEFAULT_THEME.type_name)
    } else if kind.is_callable() {
        Style::default().fg(DEFAULT_THEME.function)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    }
}

fn declaration_line(decl: &Declaration) -> Line<'static> {
    let indent = "  ".repeat(decl.scope.len() + 1);
    let lines = if decl.start_line == decl.end_line {
        format!("L{}", decl.start_line)
    } else {
        format!("L{}-{}", decl.start_line, decl.end_line)
    };

    let mut spans = vec![
        Span::raw(indent),
        Span::styled(
            format!("{:<11} ", decl.kind.as_str()),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
    ];
    let specifiers: Vec<&str> = decl
        .access
        .map(|access| access.as_str())
        .into_iter()
        .chain(decl.modifiers.iter().map(|m| m.as_str()))
        .collect();
    if !specifiers.is_empty() {
        spans.push(Span::styled(
            format!("{} ", specifiers.join(" ")),
            Style::default().fg(DEFAULT_THEME.keyword),
        ));
    }
    spans.push(Span::styled(decl.name.clone(), kind_style(decl.kind)));
    if let Some(sig) = &decl.signature {
        let params: Vec<String> = sig
            .params
            .iter()
            .map(|p| {
                let name = p.name.as_deref().unwrap_or("_");
                if p.defaulted {
                    format!("{name} = …")
                } else {
                    name.to_string()
                }
            })
            .collect();
        let qualifier = if sig.is_const { " const" } else { "" };
        spans.push(Span::raw(format!("({}){qualifier}", params.join(", "))));
    }
    spans.push(Span::styled(
        format!("  {lines}"),
        Style::default().fg(DEFAULT_THEME.comment),
    ));
    Line::from(spans)
}

/// Build the pane contents; exposed for rendering tests.
pub fn inventory_lines(report: &FixtureReport) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    lines.push(section("Checks"));
    for check in &report.checks {
        let (mark, style) = if check.passed {
            ("✓", Style::default().fg(DEFAULT_THEME.pass))
        } else {
            ("✗", Style::default().fg(DEFAULT_THEME.fail))
        };
        let mut spans = vec![
            Span::styled(format!("  {mark} "), style),
            Span::raw(check.name.clone()),
        ];
        if let Some(detail) = &check.detail {
            spans.push(Span::styled(
                format!(": {detail}"),
                Style::default().fg(DEFAULT_THEME.fail),
            ));
        }
        lines.push(Line::from(spans));
    }

    if let Some(inventory) = &report.inventory {
        lines.push(Line::raw(""));
        lines.push(section("Declarations"));
        lines.extend(inventory.declarations.iter().map(declaration_line));

        if !inventory.includes.is_empty() {
            lines.push(Line::raw(""));
            lines.push(section("Includes"));
            for include in &inventory.includes {
                let path = if include.system {
                    format!("<{}>", include.path)
                } else {
                    format!("\"{}\"", include.path)
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("  {path}"), Style::default().fg(DEFAULT_THEME.string)),
                    Span::styled(
                        format!("  L{}", include.line),
                        Style::default().fg(DEFAULT_THEME.comment),
                    ),
                ]));
            }
        }
    }

    if !report.notes.is_empty() {
        lines.push(Line::raw(""));
        lines.push(section("Notes"));
        for note in &report.notes {
            lines.push(Line::styled(
                format!("  {note}"),
                Style::default().fg(DEFAULT_THEME.secondary),
            ));
        }
    }

    lines
}

/// Render the inventory pane for one fixture
pub fn render_inventory_pane(
    frame: &mut Frame,
    area: Rect,
    report: Option<&FixtureReport>,
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

    let title = match report.and_then(|r| r.expectation) {
        Some(summary) => format!(" Inventory: {summary} "),
        None => " Inventory ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines = report.map(inventory_lines).unwrap_or_default();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    *scroll = (*scroll).min(lines.len().saturating_sub(visible_height));

    let visible: Vec<Line> = lines.into_iter().skip(*scroll).take(visible_height).collect();
    frame.render_widget(Paragraph::new(visible).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::check_fixture;
    use crate::corpus::Corpus;
    use std::fs;
    use tempfile::TempDir;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_declarations_show_access_and_modifiers() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("cpp")).unwrap();
        fs::write(
            dir.path().join("cpp/shape.cpp"),
            "class Shape {\n    int id;\npublic:\n    virtual int area() const;\n};\n",
        )
        .unwrap();
        let corpus = Corpus::load(dir.path()).unwrap();
        let report = check_fixture(&corpus, corpus.get("cpp/shape.cpp").unwrap());

        let lines: Vec<String> = inventory_lines(&report).iter().map(text).collect();
        assert!(lines.contains(&"  class       Shape  L1-5".to_string()), "{lines:#?}");
        assert!(lines.contains(&"    field       private id  L2".to_string()), "{lines:#?}");
        assert!(
            lines.contains(&"    method      public virtual area() const  L4".to_string()),
            "{lines:#?}"
        );
    }
}
