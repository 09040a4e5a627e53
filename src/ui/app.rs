//! Browser application state and event loop

use crate::contract::{check_corpus, FixtureReport};
use crate::corpus::Corpus;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Fixtures,
    Source,
    Inventory,
}

impl FocusedPane {
    /// Move focus to the next pane (left to right)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Fixtures => FocusedPane::Source,
            FocusedPane::Source => FocusedPane::Inventory,
            FocusedPane::Inventory => FocusedPane::Fixtures,
        }
    }

    /// Move focus to the previous pane
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Fixtures => FocusedPane::Inventory,
            FocusedPane::Source => FocusedPane::Fixtures,
            FocusedPane::Inventory => FocusedPane::Source,
        }
    }
}

/// The main application state
pub struct App {
    pub corpus: Corpus,

    /// One report per fixture, in corpus order
    pub reports: Vec<FixtureReport>,

    /// Index of the selected fixture
    pub selected: usize,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub fixtures_scroll: usize,
    pub source_scroll: usize,
    pub inventory_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    /// Create the browser over a loaded corpus, checking every fixture up front
    pub fn new(corpus: Corpus) -> Self {
        let report = check_corpus(&corpus);
        let status_message = format!(
            "{} fixtures from {}",
            report.fixtures.len(),
            corpus.root().display()
        );
        App {
            corpus,
            reports: report.fixtures,
            selected: 0,
            focused_pane: FocusedPane::Fixtures,
            fixtures_scroll: 0,
            source_scroll: 0,
            inventory_scroll: 0,
            should_quit: false,
            status_message,
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn selected_report(&self) -> Option<&FixtureReport> {
        self.reports.get(self.selected)
    }

    /// Render the UI
    pub(crate) fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Panes on top, status bar at the bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        // Fixture list | Source | Inventory
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(22),
                Constraint::Percentage(43),
                Constraint::Percentage(35),
            ])
            .split(main_chunks[0]);

        super::panes::render_fixtures_pane(
            frame,
            columns[0],
            &self.reports,
            self.selected,
            self.focused_pane == FocusedPane::Fixtures,
            &mut self.fixtures_scroll,
        );

        let fixture = self.corpus.fixtures().get(self.selected);
        let declaration_lines = self
            .selected_report()
            .and_then(|r| r.inventory.as_ref())
            .map(|inventory| inventory.declaration_lines())
            .unwrap_or_default();
        super::panes::render_source_pane(
            frame,
            columns[1],
            fixture.map_or("Source", |f| f.path()),
            fixture.map_or("", |f| f.content()),
            &declaration_lines,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        super::panes::render_inventory_pane(
            frame,
            columns[2],
            self.reports.get(self.selected),
            self.focused_pane == FocusedPane::Inventory,
            &mut self.inventory_scroll,
        );

        let failed = self.reports.iter().filter(|r| !r.passed()).count();
        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.selected,
            self.reports.len(),
            failed,
        );
    }

    /// Handle keyboard events
    pub(crate) fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(10),
            KeyCode::PageDown => self.scroll_down(10),
            KeyCode::Home => match self.focused_pane {
                FocusedPane::Fixtures => self.select(0),
                FocusedPane::Source => self.source_scroll = 0,
                FocusedPane::Inventory => self.inventory_scroll = 0,
            },
            _ => {}
        }
    }

    fn scroll_up(&mut self, by: usize) {
        match self.focused_pane {
            FocusedPane::Fixtures => self.select(self.selected.saturating_sub(by)),
            FocusedPane::Source => self.source_scroll = self.source_scroll.saturating_sub(by),
            FocusedPane::Inventory => {
                self.inventory_scroll = self.inventory_scroll.saturating_sub(by)
            }
        }
    }

    fn scroll_down(&mut self, by: usize) {
        match self.focused_pane {
            FocusedPane::Fixtures => self.select(self.selected.saturating_add(by)),
            // Panes clamp on the next render
            FocusedPane::Source => self.source_scroll = self.source_scroll.saturating_add(by),
            FocusedPane::Inventory => {
                self.inventory_scroll = self.inventory_scroll.saturating_add(by)
            }
        }
    }

    /// Select a fixture, clamped to the list, resetting the detail panes
    fn select(&mut self, index: usize) {
        let index = index.min(self.reports.len().saturating_sub(1));
        if index != self.selected {
            self.selected = index;
            self.source_scroll = 0;
            self.inventory_scroll = 0;
        }
        let message = self.selected_report().map(|report| {
            let verdict = if report.passed() { "passes" } else { "fails" };
            format!("{} {verdict}", report.path)
        });
        if let Some(message) = message {
            self.status_message = message;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use std::fs;
    use tempfile::TempDir;

    fn app_with(files: &[(&str, &str)]) -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let corpus = Corpus::load(dir.path()).unwrap();
        (dir, App::new(corpus))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn screen(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_focus_cycles() {
        let mut focus = FocusedPane::Fixtures;
        for _ in 0..3 {
            focus = focus.next();
        }
        assert_eq!(focus, FocusedPane::Fixtures);
        assert_eq!(FocusedPane::Fixtures.prev(), FocusedPane::Inventory);
        assert_eq!(FocusedPane::Source.next().prev(), FocusedPane::Source);
    }

    #[test]
    fn test_selection_clamps_and_resets_scroll() {
        let (_dir, mut app) = app_with(&[("c/a.c", "int a(void);\n"), ("c/b.c", "int b(void);\n")]);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.source_scroll, 1);

        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected, 1);
        assert_eq!(app.source_scroll, 0);
        assert_eq!(app.status_message, "c/b.c passes");

        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.selected, 1);
        press(&mut app, KeyCode::Home);
        assert_eq!(app.selected, 0);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_render_shows_fixture_source_and_inventory() {
        let (_dir, mut app) = app_with(&[(
            "cpp/shape.cpp",
            "class Shape {\npublic:\n    int area() const { return 0; }\n};\n",
        )]);

        let text = screen(&mut app, 140, 20);
        assert!(text.contains("Fixtures (1)"));
        assert!(text.contains("cpp/shape.cpp"));
        assert!(text.contains("class Shape {"));
        assert!(text.contains("▸   1 class Shape"));
        assert!(text.contains("delimiters balanced"));
        assert!(text.contains("area() const"));
        assert!(text.contains("ALL PASS"));
    }

    #[test]
    fn test_render_marks_failures() {
        let (_dir, mut app) = app_with(&[("c/bad.c", "namespace n { int x; }\n")]);

        let text = screen(&mut app, 140, 20);
        assert!(text.contains("1 failing"));
        assert!(text.contains("✗ c/bad.c"));
        assert!(text.contains("1 FAILING"));
    }

    #[test]
    fn test_render_empty_corpus() {
        let (_dir, mut app) = app_with(&[]);

        let text = screen(&mut app, 100, 10);
        assert!(text.contains("(no fixtures)"));
        assert!(text.contains("0/0"));
    }

    #[test]
    fn test_scroll_is_clamped_by_render() {
        let source: String = (0..40).map(|i| format!("int v{i};\n")).collect();
        let (_dir, mut app) = app_with(&[("c/long.c", source.as_str())]);

        app.focused_pane = FocusedPane::Source;
        for _ in 0..10 {
            press(&mut app, KeyCode::PageDown);
        }
        screen(&mut app, 120, 12);
        // 40 lines, 9 visible rows inside the borders
        assert_eq!(app.source_scroll, 31);
    }
}
