//! Status bar rendering with keybindings and corpus state

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the status bar at the bottom.
///
/// `position` is the selected fixture (0-based) out of `total`.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    message: &str,
    position: usize,
    total: usize,
    failed: usize,
) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let position_text = if total == 0 {
        " 0/0 ".to_string()
    } else {
        format!(" {}/{} ", position + 1, total)
    };

    let left_spans = vec![
        Span::styled(
            position_text,
            Style::default()
                .bg(DEFAULT_THEME.primary)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " | ",
            Style::default()
                .bg(DEFAULT_THEME.highlight_bg)
                .fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            format!(" {message} "),
            Style::default()
                .bg(DEFAULT_THEME.highlight_bg)
                .fg(DEFAULT_THEME.fg),
        ),
    ];

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(Style::default().bg(DEFAULT_THEME.highlight_bg))
        .alignment(Alignment::Left);
    frame.render_widget(left_paragraph, layout[0]);

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.highlight_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.highlight_bg)
        .fg(DEFAULT_THEME.comment);

    let mut right_spans = vec![
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(" move ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" ⇥ ", key_style),
        Span::styled(" focus ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled("q", key_style),
        Span::styled(" quit ", desc_style),
        Span::styled("│", sep_style),
    ];

    let (badge, badge_bg) = if failed == 0 {
        (" ALL PASS ".to_string(), DEFAULT_THEME.pass)
    } else {
        (format!(" {failed} FAILING "), DEFAULT_THEME.fail)
    };
    right_spans.push(Span::styled(
        badge,
        Style::default()
            .bg(badge_bg)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    ));

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(Style::default().bg(DEFAULT_THEME.highlight_bg))
        .alignment(Alignment::Right);
    frame.render_widget(right_paragraph, layout[1]);
}
