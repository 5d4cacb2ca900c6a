//! Emberglen Engine library.
//!
//! NPC dialogue sessions, keyword-triggered quests and the glue between the
//! village scene and its presentation surface.
//!
//! ## Structure
//!
//! - `entities/` - Entity modules wrapping domain rules
//! - `use_cases/` - Dialogue sessions, movement and village coordination
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - Presentation entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
