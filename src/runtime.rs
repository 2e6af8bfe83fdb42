//! Runtime for a conversation session
//!
//! Owns the [`SessionState`](crate::session::SessionState), feeds events
//! through the pure transition function and performs the resulting effects.
//! Network calls run as background tasks that report back over a channel.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{SessionRuntime, SubmitOutcome};
pub use traits::*;

use crate::service::{HttpServiceClient, LoggingClient};
use std::sync::Arc;

/// Shared production client serving both collaborator roles
pub type ProductionClient = Arc<LoggingClient<HttpServiceClient>>;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = SessionRuntime<ProductionClient, ProductionClient>;
