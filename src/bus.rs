//! In-memory event bus — the core dispatcher
//!
//! `EventBus` invokes listeners one at a time in registration order,
//! awaiting each before considering the next, and stops as soon as the
//! context is cancelled. Listener errors are not caught.

use crate::config::BusConfig;
use crate::context::{ContextInput, EventContext};
use crate::error::Result;
use crate::registry::{Listener, ListenerRegistry};
use crate::transport::EventTransport;
use async_trait::async_trait;

/// Sequential, short-circuiting in-memory dispatcher
///
/// Each `emit` owns its own context; concurrent emissions never share a
/// cancellation flag.
#[derive(Debug, Default)]
pub struct EventBus {
    config: BusConfig,
    registry: ListenerRegistry,
}

impl EventBus {
    /// Create a bus with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus with the given configuration
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            config,
            registry: ListenerRegistry::new(),
        }
    }

    /// Get the bus configuration
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Subscribe `listener` to `event`
    ///
    /// No de-duplication: registering the same listener twice invokes it
    /// twice per emission.
    pub fn on(&self, event: &str, listener: Listener) {
        let count = self.registry.add(event, listener);
        warn_listener_leak(&self.config, event, count);
    }

    /// Unsubscribe every registration of `listener` from `event`
    pub fn off(&self, event: &str, listener: &Listener) {
        self.registry.remove(event, listener);
    }

    /// Emit `event` and return the final context
    ///
    /// Raw data and field records are tagged with `event` as their type.
    /// An existing context passes through with its own type untouched.
    pub async fn emit(&self, event: &str, input: impl Into<ContextInput>) -> Result<EventContext> {
        let ctx = match input.into() {
            ContextInput::Context(ctx) => ctx,
            ContextInput::Init(mut init) => {
                init.event_type = event.to_string();
                EventContext::new(init)
            }
        };

        let listeners = self.registry.snapshot(event);
        let total = listeners.len();

        for (index, listener) in listeners.into_iter().enumerate() {
            if ctx.is_cancelled() {
                tracing::debug!(
                    bus = %self.config.name,
                    event = %event,
                    invoked = index,
                    skipped = total - index,
                    "Emission cancelled"
                );
                break;
            }
            listener(ctx.clone()).await?;
        }

        Ok(ctx)
    }

    /// Number of listeners registered for `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry.count(event)
    }

    /// Event names with at least one listener, sorted
    pub fn event_names(&self) -> Vec<String> {
        self.registry.event_names()
    }

    /// Remove all listeners for `event`
    pub fn clear(&self, event: &str) {
        self.registry.clear(event);
    }
}

#[async_trait]
impl EventTransport for EventBus {
    fn on(&self, event: &str, listener: Listener) {
        EventBus::on(self, event, listener);
    }

    fn off(&self, event: &str, listener: &Listener) {
        EventBus::off(self, event, listener);
    }

    async fn emit(&self, event: &str, input: ContextInput) -> Result<EventContext> {
        EventBus::emit(self, event, input).await
    }

    fn listener_count(&self, event: &str) -> usize {
        EventBus::listener_count(self, event)
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

/// Log a possible listener leak once the configured threshold is crossed
pub(crate) fn warn_listener_leak(config: &BusConfig, event: &str, count: usize) {
    if config.max_listeners > 0 && count > config.max_listeners {
        tracing::warn!(
            bus = %config.name,
            event = %event,
            listeners = count,
            max_listeners = config.max_listeners,
            "Possible listener leak detected"
        );
    }
}
