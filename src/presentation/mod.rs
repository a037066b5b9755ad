//! Presentation layer: the bot runtime and command line output.

/// Gateway event loop feeding the dispatcher.
pub mod bot;
/// `check` and `list` commands.
pub mod commands;

pub use bot::{Bot, BotError};
pub use commands::{CommandError, check_text, list_transforms};
