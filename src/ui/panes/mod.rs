//! TUI pane rendering modules
//!
//! Each pane module exports a stateless `render_*` function that draws one
//! region of the screen from the data it is handed. Scroll offsets live in
//! [`App`](crate::ui::App) and are clamped by the pane that owns them.
//!
//! - [`fixtures`]: Fixture list with pass/fail marks
//! - [`source`]: Source display with syntax highlighting and declaration marks
//! - [`inventory`]: Check results, declarations, includes and notes
//! - [`status`]: Status bar with keybindings and corpus state

pub mod fixtures;
pub mod inventory;
pub mod source;
pub mod status;

pub use fixtures::render_fixtures_pane;
pub use inventory::render_inventory_pane;
pub use source::render_source_pane;
pub use status::render_status_bar;
