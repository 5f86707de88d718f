//! Object-style facade over any transport
//!
//! Lets applications model event-capable entities as values with
//! `on`/`off`/`emit` methods instead of composing a bus explicitly.

use crate::bus::EventBus;
use crate::context::{ContextInput, EventContext};
use crate::error::Result;
use crate::registry::Listener;
use crate::transport::EventTransport;
use std::sync::Arc;

/// Event-capable entity backed by a shared transport
///
/// Cloning an `Emitter` shares its transport.
#[derive(Clone)]
pub struct Emitter {
    transport: Arc<dyn EventTransport>,
}

impl Emitter {
    /// Create an emitter backed by a fresh in-memory bus
    pub fn new() -> Self {
        Self::with_transport(EventBus::new())
    }

    /// Create an emitter backed by the given transport
    pub fn with_transport(transport: impl EventTransport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Create an emitter sharing an existing transport
    pub fn from_shared(transport: Arc<dyn EventTransport>) -> Self {
        Self { transport }
    }

    pub fn on(&self, event: &str, listener: Listener) {
        self.transport.on(event, listener);
    }

    pub fn off(&self, event: &str, listener: &Listener) {
        self.transport.off(event, listener);
    }

    pub async fn emit(&self, event: &str, input: impl Into<ContextInput>) -> Result<EventContext> {
        self.transport.emit(event, input.into()).await
    }

    /// Get the transport name
    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Get a reference to the underlying transport
    pub fn transport(&self) -> &dyn EventTransport {
        self.transport.as_ref()
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("transport", &self.transport.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BusConfig;
    use crate::registry::sync_listener;
    use serde_json::json;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_emitter_emit_and_listen() {
        let emitter = Emitter::new();
        let received = Arc::new(Mutex::new(None));
        let r = received.clone();
        emitter.on(
            "test-event",
            sync_listener(move |ctx| {
                *r.lock().unwrap() = Some(ctx.payload());
                Ok(())
            }),
        );

        emitter.emit("test-event", json!({"value": "hello"})).await.unwrap();
        assert_eq!(*received.lock().unwrap(), Some(json!({"value": "hello"})));
        assert_eq!(emitter.transport_name(), "memory");
    }

    #[tokio::test]
    async fn test_emitter_prevent_default() {
        let emitter = Emitter::default();
        let count = Arc::new(Mutex::new(0));
        for _ in 0..2 {
            let count = count.clone();
            emitter.on(
                "test-event",
                sync_listener(move |ctx| {
                    *count.lock().unwrap() += 1;
                    ctx.cancel();
                    Ok(())
                }),
            );
        }

        let result = emitter.emit("test-event", json!({"value": "hello"})).await.unwrap();
        assert!(result.is_cancelled());
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_emitter_with_injected_transport() {
        let bus: Arc<dyn EventTransport> =
            Arc::new(EventBus::with_config(BusConfig::default().with_name("shared")));
        let a = Emitter::from_shared(bus.clone());
        let b = Emitter::from_shared(bus);

        let l = sync_listener(|ctx| {
            ctx.set_meta("via", "shared");
            Ok(())
        });
        a.on("ping", l.clone());

        let ctx = b.emit("ping", json!(null)).await.unwrap();
        assert_eq!(ctx.meta("via"), Some(json!("shared")));
        assert_eq!(b.transport_name(), "shared");

        b.off("ping", &l);
        assert_eq!(a.transport().listener_count("ping"), 0);
    }

    #[tokio::test]
    async fn test_clone_shares_transport() {
        let emitter = Emitter::new();
        let clone = emitter.clone();
        clone.on("x", sync_listener(|_| Ok(())));
        assert_eq!(emitter.transport().listener_count("x"), 1);
    }
}
