//! Terminal browser built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop, pane focus
//! - **[`panes`]**: stateless render functions for each visible pane (fixture
//!   list, source, inventory, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a loaded
//! [`Corpus`] and call [`App::run`] to start the event loop.
//!
//! [`Corpus`]: crate::corpus::Corpus
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
