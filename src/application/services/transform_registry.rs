//! Immutable, ordered collection of link transforms.

use std::sync::Arc;

use crate::application::transforms::Transform;

/// Registered transforms, frozen after construction.
///
/// Lookups borrow immutably, so a registry shared through `Arc` needs no locking.
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    transforms: Vec<Arc<Transform>>,
}

impl TransformRegistry {
    /// Creates registry from transforms in registration order.
    #[must_use]
    pub fn new(transforms: impl IntoIterator<Item = Transform>) -> Self {
        Self {
            transforms: transforms.into_iter().map(Arc::new).collect(),
        }
    }

    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> TransformRegistryBuilder {
        TransformRegistryBuilder::default()
    }

    /// Returns every transform matching `text`, in registration order.
    #[must_use]
    pub fn find_matching(&self, text: &str) -> Vec<Arc<Transform>> {
        self.transforms
            .iter()
            .filter(|transform| transform.matches(text))
            .cloned()
            .collect()
    }

    /// Returns the transform registered under `name`.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Transform> {
        self.transforms
            .iter()
            .find(|transform| transform.name() == name)
            .map(AsRef::as_ref)
    }

    /// Returns registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.iter().map(|transform| transform.name())
    }

    /// Number of registered transforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Returns whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Accumulates transforms before the registry is frozen.
#[derive(Debug, Default)]
pub struct TransformRegistryBuilder {
    transforms: Vec<Transform>,
}

impl TransformRegistryBuilder {
    /// Appends a transform.
    #[must_use]
    pub fn register(mut self, transform: impl Into<Transform>) -> Self {
        self.transforms.push(transform.into());
        self
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> TransformRegistry {
        TransformRegistry::new(self.transforms)
    }
}
