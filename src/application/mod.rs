//! Application layer with transforms, dispatch services and use cases.

/// Message dispatch and transform registry.
pub mod services;
/// Link transform rules.
pub mod transforms;
/// Use case implementations.
pub mod use_cases;

pub use services::{DispatcherConfig, LinkDispatcher, TransformRegistry};
pub use transforms::Transform;
pub use use_cases::{CheckLinksUseCase, IdentifyBotUseCase};
