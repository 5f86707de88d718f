//! Transport contract — the core abstraction for delivery mechanisms
//!
//! Every delivery mechanism (the in-memory [`EventBus`](crate::EventBus),
//! the spawned fire-and-forget transport, or an application-provided
//! adapter around some native event system) implements `EventTransport`.
//! Adapters translate their medium's native event shape to and from
//! [`EventContext`] at the boundary.

use crate::context::{ContextInput, EventContext};
use crate::error::Result;
use crate::registry::Listener;
use async_trait::async_trait;

pub mod spawn;

/// Core trait for event transports
///
/// Implementations must deliver to listeners in registration order and
/// remove listeners by identity (see [`same_listener`](crate::same_listener)).
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Register a listener for `event`
    fn on(&self, event: &str, listener: Listener);

    /// Remove a previously registered listener (no-op if unknown)
    fn off(&self, event: &str, listener: &Listener);

    /// Emit `event`, returning the resulting context
    async fn emit(&self, event: &str, input: ContextInput) -> Result<EventContext>;

    /// Number of listeners currently registered for `event`
    fn listener_count(&self, event: &str) -> usize;

    /// Transport name (e.g., "memory", "spawn")
    fn name(&self) -> &str;
}
