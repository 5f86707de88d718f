//! Command pipeline — a handler wrapped in a before/success/error lifecycle
//!
//! Each `execute` call runs the following machine once:
//!
//! ```text
//! INIT ─► emit "before" ─┬─► cancelled ───────────────► CANCELLED
//!                        └─► handler ─┬─► Ok  ─► emit "success" ─► SUCCESS
//!                                     └─► Err ─► emit "error"   ─► ERROR
//! ```
//!
//! Lifecycle notifications go to a bus private to the command, so several
//! commands never see each other's stages. Handler errors are caught and
//! reported in the [`CommandResult`]; errors raised by stage listeners are
//! ordinary bus errors and propagate out of `execute`.

use crate::bus::EventBus;
use crate::config::BusConfig;
use crate::context::{ContextInit, EventContext, Failure};
use crate::error::Result;
use crate::registry::{listener, Listener};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// Command handler; same shape as a listener
pub type Handler = Listener;

/// Reason reported when a `before` listener cancels execution
pub const CANCELLED_REASON: &str = "cancelled";

/// Outcome of a single `execute` call
///
/// Serializes as `{"ok":true,"data":…}`, `{"ok":false,"reason":"cancelled"}`
/// or `{"ok":false,"error":"…"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the handler completed successfully
    pub ok: bool,

    /// Final payload, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Why the handler was skipped, present on cancellation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Handler error message, present on failure (may be empty)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            reason: None,
            error: None,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            ok: false,
            data: None,
            reason: Some(CANCELLED_REASON.to_string()),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            reason: None,
            error: Some(message.into()),
        }
    }

    /// True when a `before` listener prevented execution
    pub fn is_cancelled(&self) -> bool {
        !self.ok && self.reason.as_deref() == Some(CANCELLED_REASON)
    }

    /// True when the handler returned an error
    pub fn is_failed(&self) -> bool {
        !self.ok && self.error.is_some()
    }
}

/// A named handler with its own lifecycle bus
///
/// Created once and executed many times; every execution builds a fresh
/// context, so nothing but listener registrations carries over between
/// calls.
pub struct Command {
    name: String,
    bus: EventBus,
    handler: Handler,
}

impl Command {
    /// Type of the context handed to `before`, the handler and `success`
    pub const EXECUTE: &'static str = "execute";
    /// Emitted before the handler runs; listeners may cancel
    pub const BEFORE: &'static str = "before";
    /// Emitted after the handler completes
    pub const SUCCESS: &'static str = "success";
    /// Emitted with an error context when the handler fails
    pub const ERROR: &'static str = "error";

    /// Create a command from an async handler
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(EventContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::from_handler(name, listener(handler))
    }

    /// Create a command from an already boxed handler
    pub fn from_handler(name: impl Into<String>, handler: Handler) -> Self {
        let name = name.into();
        let bus = EventBus::with_config(BusConfig::default().with_name(format!("command:{}", name)));
        Self { name, bus, handler }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The private lifecycle bus
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe to a lifecycle stage
    pub fn on(&self, stage: &str, listener: Listener) {
        self.bus.on(stage, listener);
    }

    /// Unsubscribe from a lifecycle stage
    pub fn off(&self, stage: &str, listener: &Listener) {
        self.bus.off(stage, listener);
    }

    /// Run the pipeline once
    ///
    /// Handler failures are reported in the returned `CommandResult`. An
    /// `Err` means a stage listener failed.
    pub async fn execute(&self, data: impl Into<Value>) -> Result<CommandResult> {
        let ctx = EventContext::new(
            ContextInit::new()
                .event_type(Self::EXECUTE)
                .command_name(self.name.clone())
                .payload(data),
        );

        self.bus.emit(Self::BEFORE, &ctx).await?;
        if ctx.is_cancelled() {
            tracing::debug!(command = %self.name, "Command cancelled before handler");
            return Ok(CommandResult::cancelled());
        }

        match (self.handler)(ctx.clone()).await {
            Ok(()) => {
                self.bus.emit(Self::SUCCESS, &ctx).await?;
                tracing::debug!(command = %self.name, "Command succeeded");
                Ok(CommandResult::success(ctx.payload()))
            }
            Err(e) => {
                let error_ctx = EventContext::new(
                    ctx.to_init()
                        .event_type(Self::ERROR)
                        .failure(Failure::from(&e)),
                );
                self.bus.emit(Self::ERROR, &error_ctx).await?;

                let message = error_ctx
                    .failure()
                    .map(|failure| failure.message)
                    .unwrap_or_default();
                tracing::debug!(command = %self.name, error = %message, "Command failed");
                Ok(CommandResult::failed(message))
            }
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}
