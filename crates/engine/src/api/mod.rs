//! API layer - presentation entry points.

pub mod console;
pub mod presenter;

pub use console::{parse_command, ConsoleCommand, ConsoleUi};
pub use presenter::{ChatPresenter, UiEvent};
