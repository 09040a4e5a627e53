use ratatui::style::Color;

/// Colors shared by every pane
pub struct Theme {
    pub fg: Color,
    pub primary: Color,
    pub secondary: Color,
    pub comment: Color,
    /// Passing checks and the all-pass badge
    pub pass: Color,
    /// Failed checks, failing fixtures, scan errors
    pub fail: Color,
    pub keyword: Color,
    pub string: Color,
    pub number: Color,
    pub directive: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    /// Selected fixture row and status bar background
    pub highlight_bg: Color,
    pub function: Color,
    pub type_name: Color,
    /// Gutter mark on lines where a declaration starts
    pub marker: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    primary: Color::Rgb(137, 180, 250),
    secondary: Color::Rgb(250, 179, 135),
    comment: Color::Rgb(108, 112, 134),
    pass: Color::Rgb(166, 227, 161),
    fail: Color::Rgb(243, 139, 168),
    keyword: Color::Rgb(137, 180, 250),
    string: Color::Rgb(250, 179, 135),
    number: Color::Rgb(250, 179, 135),
    directive: Color::Rgb(203, 166, 247),
    border_focused: Color::Rgb(249, 226, 175),
    border_normal: Color::Rgb(108, 112, 134),
    highlight_bg: Color::Rgb(50, 50, 70),
    function: Color::Rgb(249, 226, 175),
    type_name: Color::Rgb(148, 226, 213),
    marker: Color::Rgb(245, 194, 231),
};
