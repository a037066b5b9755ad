//! Application services.

/// Work queue and per-message processing.
pub mod link_dispatcher;
/// Ordered, immutable set of transforms.
pub mod transform_registry;

pub use link_dispatcher::{
    DispatchOutcome, DispatchWorker, DispatcherConfig, InboundMessage, LinkDispatcher,
    MessageIntake, MessageProcessor,
};
pub use transform_registry::{TransformRegistry, TransformRegistryBuilder};
