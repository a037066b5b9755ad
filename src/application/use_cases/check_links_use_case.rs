//! Offline diagnostics: run transforms against text without a chat connection.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::services::{TransformRegistry, link_dispatcher};
use crate::domain::errors::TransformError;

/// Text to check, optionally against one named transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    /// Message text.
    pub text: String,
    /// Transform to apply; every matching transform when `None`.
    pub transform: Option<String>,
}

/// What the transforms made of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// Names of the transforms that were applied, in order.
    pub applied: Vec<String>,
    /// Rewritten text, `None` when nothing changed.
    pub output: Option<String>,
}

/// Diagnostics failure.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum CheckError {
    #[error("unknown transform '{name}', available: {available}")]
    UnknownTransform { name: String, available: String },

    #[error("transform '{name}' failed: {source}")]
    Transform {
        name: String,
        #[source]
        source: TransformError,
    },
}

/// Applies registered transforms the way the dispatcher would.
#[derive(Clone)]
pub struct CheckLinksUseCase {
    registry: Arc<TransformRegistry>,
}

impl CheckLinksUseCase {
    /// Creates new use case.
    #[must_use]
    pub const fn new(registry: Arc<TransformRegistry>) -> Self {
        Self { registry }
    }

    /// Runs the check.
    ///
    /// # Errors
    /// Returns error for an unknown transform name, or when the named
    /// transform fails.
    pub async fn execute(&self, request: CheckRequest) -> Result<CheckReport, CheckError> {
        match request.transform {
            Some(name) => self.check_named(&name, &request.text).await,
            None => Ok(self.check_matching(&request.text).await),
        }
    }

    async fn check_named(&self, name: &str, text: &str) -> Result<CheckReport, CheckError> {
        let transform =
            self.registry
                .by_name(name)
                .ok_or_else(|| CheckError::UnknownTransform {
                    name: name.to_string(),
                    available: self.registry.names().collect::<Vec<_>>().join(", "),
                })?;

        debug!(transform = name, "Checking single transform");

        let output = transform
            .apply(text)
            .await
            .map_err(|source| CheckError::Transform {
                name: name.to_string(),
                source,
            })?;

        Ok(CheckReport {
            applied: vec![name.to_string()],
            output: Some(output),
        })
    }

    async fn check_matching(&self, text: &str) -> CheckReport {
        let transforms = self.registry.find_matching(text);
        let applied = transforms
            .iter()
            .map(|transform| transform.name().to_string())
            .collect();

        let output = link_dispatcher::rewrite(text, &transforms).await;

        CheckReport {
            applied,
            output: (output != text).then_some(output),
        }
    }
}
