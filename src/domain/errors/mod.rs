//! Domain error types.

mod delivery_error;
mod resolve_error;
mod transform_error;

pub use delivery_error::DeliveryError;
pub use resolve_error::ResolveError;
pub use transform_error::TransformError;
