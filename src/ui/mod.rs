//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - Header, page and overlay rendering
//! - `cards` - Feed page widget (placeholders and formula cards)
//! - `drawer` - Navigation drawer and dim overlay
//! - `help` - Keybinding overlay
//! - `status` - Status bar widget

mod cards;
mod drawer;
mod events;
mod help;
mod input;
mod loop_runner;
mod render;
mod status;

pub use events::handle_app_event;
pub use loop_runner::{run, Action};
