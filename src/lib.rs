//! # a3s-dispatch
//!
//! Ordered, cancellable in-process event dispatch and command pipelines for
//! the A3S ecosystem.
//!
//! ## Overview
//!
//! `a3s-dispatch` delivers events to listeners one at a time, in
//! registration order, awaiting each listener before moving on. Any
//! listener may cancel the context ("prevent default"), which stops the
//! remaining listeners of that emission. Commands wrap a handler in a
//! `before` → handler → `success`/`error` lifecycle on a private bus.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_dispatch::{sync_listener, Command, EventBus, EventContext};
//!
//! # async fn example() -> a3s_dispatch::Result<()> {
//! let bus = EventBus::new();
//! bus.on("order.created", sync_listener(|ctx| {
//!     if ctx.payload()["total"] == 0 {
//!         ctx.cancel();
//!     }
//!     Ok(())
//! }));
//!
//! let ctx = bus.emit("order.created", serde_json::json!({"total": 0})).await?;
//! assert!(ctx.is_cancelled());
//!
//! let save = Command::new("save", |ctx: EventContext| async move {
//!     ctx.set_meta("saved", true);
//!     Ok(())
//! });
//! let result = save.execute(serde_json::json!({"id": 1})).await?;
//! assert!(result.ok);
//! # Ok(())
//! # }
//! ```
//!
//! ## Transports
//!
//! - **EventBus** — in-memory sequential dispatcher (the default)
//! - **SpawnTransport** — fire-and-forget delivery on a spawned tokio task
//!
//! ## Architecture
//!
//! - **EventContext** — shared handle carrying payload, metadata, failure
//!   and the cancellation flag
//! - **EventTransport** trait — contract every delivery mechanism implements
//! - **Command** — lifecycle pipeline around a single handler
//! - **Emitter** — object-style facade over any transport

pub mod bus;
pub mod command;
pub mod config;
pub mod context;
pub mod emitter;
pub mod error;
pub mod registry;
pub mod transport;

// Re-export core types
pub use bus::EventBus;
pub use command::{Command, CommandResult, Handler, CANCELLED_REASON};
pub use config::BusConfig;
pub use context::{ContextInit, ContextInput, EventContext, Failure};
pub use emitter::Emitter;
pub use error::{EventError, Result};
pub use registry::{listener, same_listener, sync_listener, Listener, ListenerRegistry};
pub use transport::spawn::SpawnTransport;
pub use transport::EventTransport;
