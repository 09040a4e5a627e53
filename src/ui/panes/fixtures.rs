//! Fixture list pane

use crate::contract::FixtureReport;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the list of fixtures with their check status.
///
/// The selected entry is kept in view; `scroll` follows it.
pub fn render_fixtures_pane(
    frame: &mut Frame,
    area: Rect,
    reports: &[FixtureReport],
    selected: usize,
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

    let failed = reports.iter().filter(|r| !r.passed()).count();
    let title = if failed == 0 {
        format!(" Fixtures ({}) ", reports.len())
    } else {
        format!(" Fixtures ({}, {} failing) ", reports.len(), failed)
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    if selected < *scroll {
        *scroll = selected;
    } else if selected >= *scroll + visible_height {
        *scroll = selected + 1 - visible_height;
    }

    if reports.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            " (no fixtures) ",
            Style::default().fg(DEFAULT_THEME.comment),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let lines: Vec<Line> = reports
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(idx, report)| {
            let (mark, mark_style) = if report.passed() {
                ("✓", Style::default().fg(DEFAULT_THEME.pass))
            } else {
                ("✗", Style::default().fg(DEFAULT_THEME.fail))
            };

            let mut path_style = Style::default().fg(DEFAULT_THEME.fg);
            let mut tag_style = Style::default().fg(DEFAULT_THEME.comment);
            if idx == selected {
                path_style = path_style
                    .bg(DEFAULT_THEME.highlight_bg)
                    .add_modifier(Modifier::BOLD);
                tag_style = tag_style.bg(DEFAULT_THEME.highlight_bg);
            }

            Line::from(vec![
                Span::styled(format!(" {mark} "), mark_style),
                Span::styled(report.path.clone(), path_style),
                Span::styled(format!(" [{}]", report.dialect), tag_style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
