//! Spawned transport — fire-and-forget delivery on the tokio runtime
//!
//! Models a host-runtime native event emitter: `emit` returns immediately
//! with a context describing the event, and delivery happens on a spawned
//! task. Each listener receives its own context built from the event name
//! and payload, so one listener cancelling does not stop the others.

use crate::bus::warn_listener_leak;
use crate::config::BusConfig;
use crate::context::{ContextInit, ContextInput, EventContext};
use crate::error::{EventError, Result};
use crate::registry::{Listener, ListenerRegistry};
use crate::transport::EventTransport;
use async_trait::async_trait;
use tokio::runtime::Handle;

/// Fire-and-forget transport backed by `tokio::spawn`
///
/// Listeners for one emission run in registration order on a single task.
/// A failing listener is logged and delivery continues with the next one.
#[derive(Debug)]
pub struct SpawnTransport {
    config: BusConfig,
    registry: ListenerRegistry,
}

impl Default for SpawnTransport {
    fn default() -> Self {
        Self::with_config(BusConfig::default().with_name("spawn"))
    }
}

impl SpawnTransport {
    /// Create a transport with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with the given configuration
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            config,
            registry: ListenerRegistry::new(),
        }
    }

    /// Emit and get a handle to the delivery task
    ///
    /// Awaiting the handle waits until every listener has run.
    pub fn dispatch(
        &self,
        event: &str,
        input: impl Into<ContextInput>,
    ) -> Result<(EventContext, tokio::task::JoinHandle<()>)> {
        let runtime = Handle::try_current()
            .map_err(|e| EventError::Transport(format!("No tokio runtime available: {}", e)))?;

        let ctx = match input.into() {
            ContextInput::Context(ctx) => ctx,
            ContextInput::Init(mut init) => {
                init.event_type = event.to_string();
                EventContext::new(init)
            }
        };

        let listeners = self.registry.snapshot(event);
        let payload = ctx.payload();
        let event = event.to_string();
        let transport = self.config.name.clone();

        let handle = runtime.spawn(async move {
            for listener in listeners {
                let delivered = EventContext::new(
                    ContextInit::new()
                        .event_type(event.clone())
                        .payload(payload.clone()),
                );
                if let Err(e) = listener(delivered).await {
                    tracing::warn!(
                        transport = %transport,
                        event = %event,
                        error = %e,
                        "Spawned listener failed"
                    );
                }
            }
        });

        Ok((ctx, handle))
    }
}

#[async_trait]
impl EventTransport for SpawnTransport {
    fn on(&self, event: &str, listener: Listener) {
        let count = self.registry.add(event, listener);
        warn_listener_leak(&self.config, event, count);
    }

    fn off(&self, event: &str, listener: &Listener) {
        self.registry.remove(event, listener);
    }

    async fn emit(&self, event: &str, input: ContextInput) -> Result<EventContext> {
        let (ctx, _delivery) = self.dispatch(event, input)?;
        Ok(ctx)
    }

    fn listener_count(&self, event: &str) -> usize {
        self.registry.count(event)
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
