//! Row-span projection of report groups and its text/HTML renderings.

pub mod html;
pub mod table;
pub mod text;

pub use html::render_html;
pub use table::{render_groups, Cell, Column, TableRow, TabularReport, TaskCell, NO_TASKS_SENTINEL};
pub use text::render_text;
