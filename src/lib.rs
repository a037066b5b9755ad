//! Oxilinks - a Discord bot that rewrites social media links.
//!
//! Messages arriving over the gateway are matched against a registry of
//! link transforms; rewritten links are posted as a reply and the original
//! message's preview is hidden.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing transforms, services and use cases.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the bot runtime and command output.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "oxilinks";
