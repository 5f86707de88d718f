//! Event context — the value carried through a dispatch or pipeline run
//!
//! An `EventContext` is a shared handle: cloning the handle aliases the same
//! state, so listeners, the dispatcher and the caller all observe the same
//! payload, metadata and cancellation flag. Use [`EventContext::fork`] to get
//! an independent copy.

use crate::error::{EventError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Normalized error value attached to error-stage contexts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(from = "FailureRepr")]
#[error("{message}")]
pub struct Failure {
    /// Human-readable error message (may be empty)
    pub message: String,
}

impl Failure {
    /// Create a failure with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&EventError> for Failure {
    fn from(err: &EventError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<EventError> for Failure {
    fn from(err: EventError) -> Self {
        Self::from(&err)
    }
}

/// Accepts both `"boom"` and `{"message": "boom"}`
#[derive(Deserialize)]
#[serde(untagged)]
enum FailureRepr {
    Message(String),
    Object { message: String },
}

impl From<FailureRepr> for Failure {
    fn from(repr: FailureRepr) -> Self {
        match repr {
            FailureRepr::Message(message) | FailureRepr::Object { message } => Self { message },
        }
    }
}

/// Optional-field record used to construct a context
///
/// Every field defaults as documented on [`EventContext`]. When deserialized
/// from JSON, short aliases (`type`, `name`, `data`, `meta`, `error`,
/// `defaultPrevented`) are accepted and unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInit {
    /// Channel name the context is built for
    #[serde(default, alias = "type")]
    pub event_type: String,

    /// Command name, set only by command pipelines
    #[serde(default, alias = "name")]
    pub command_name: String,

    /// Arbitrary caller data
    #[serde(default, alias = "data")]
    pub payload: Value,

    /// Scratch space shared across pipeline stages
    #[serde(default, alias = "meta")]
    pub metadata: Map<String, Value>,

    /// Failure, present only on error-stage contexts
    #[serde(default, alias = "error", skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,

    /// Whether further default handling was prevented
    #[serde(default, alias = "defaultPrevented")]
    pub cancelled: bool,
}

impl ContextInit {
    /// Create an empty record (all defaults)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event type
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    /// Set the command name
    pub fn command_name(mut self, name: impl Into<String>) -> Self {
        self.command_name = name.into();
        self
    }

    /// Set the payload
    pub fn payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Replace the metadata map
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add a metadata entry
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach a failure
    pub fn failure(mut self, failure: impl Into<Failure>) -> Self {
        self.failure = Some(failure.into());
        self
    }

    /// Set the initial cancellation flag
    pub fn cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self
    }
}

/// Input accepted wherever a context is normalized
#[derive(Debug, Clone)]
pub enum ContextInput {
    /// An existing context, passed through unchanged
    Context(EventContext),
    /// Fields for a new context
    Init(ContextInit),
}

impl Default for ContextInput {
    /// An empty JSON object payload, the data used when none is supplied
    fn default() -> Self {
        Self::Init(ContextInit::new().payload(Value::Object(Map::new())))
    }
}

impl From<EventContext> for ContextInput {
    fn from(ctx: EventContext) -> Self {
        Self::Context(ctx)
    }
}

impl From<&EventContext> for ContextInput {
    fn from(ctx: &EventContext) -> Self {
        Self::Context(ctx.clone())
    }
}

impl From<ContextInit> for ContextInput {
    fn from(init: ContextInit) -> Self {
        Self::Init(init)
    }
}

/// Raw data is treated as the payload
impl From<Value> for ContextInput {
    fn from(payload: Value) -> Self {
        Self::Init(ContextInit::new().payload(payload))
    }
}

struct ContextState {
    event_type: String,
    command_name: String,
    payload: Value,
    metadata: Map<String, Value>,
    failure: Option<Failure>,
}

struct ContextInner {
    state: Mutex<ContextState>,
    cancelled: AtomicBool,
}

/// Context flowing through an emission or a command pipeline stage
///
/// Defaults: empty `event_type` and `command_name`, `Null` payload, empty
/// metadata, no failure, not cancelled. Cancellation is terminal: once
/// [`cancel`](Self::cancel) is called the flag is never reset.
#[derive(Clone)]
pub struct EventContext {
    inner: Arc<ContextInner>,
}

impl EventContext {
    /// Construct a new context from a field record
    pub fn new(init: ContextInit) -> Self {
        let ContextInit {
            event_type,
            command_name,
            payload,
            metadata,
            failure,
            cancelled,
        } = init;

        Self {
            inner: Arc::new(ContextInner {
                state: Mutex::new(ContextState {
                    event_type,
                    command_name,
                    payload,
                    metadata,
                    failure,
                }),
                cancelled: AtomicBool::new(cancelled),
            }),
        }
    }

    /// Normalize caller input into a context
    ///
    /// An existing context is returned as-is (same instance, not a copy).
    pub fn normalize(input: impl Into<ContextInput>) -> Self {
        match input.into() {
            ContextInput::Context(ctx) => ctx,
            ContextInput::Init(init) => Self::new(init),
        }
    }

    fn state(&self) -> MutexGuard<'_, ContextState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether two handles refer to the same context
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn event_type(&self) -> String {
        self.state().event_type.clone()
    }

    pub fn command_name(&self) -> String {
        self.state().command_name.clone()
    }

    /// Current payload (copied out)
    pub fn payload(&self) -> Value {
        self.state().payload.clone()
    }

    /// Replace the payload
    pub fn set_payload(&self, payload: impl Into<Value>) {
        self.state().payload = payload.into();
    }

    /// Mutate the payload in place
    ///
    /// The closure runs under the context lock and must not call back into
    /// the same context.
    pub fn update_payload<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.state().payload)
    }

    /// Decode the payload into a typed value
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload())?)
    }

    /// Current metadata (copied out)
    pub fn metadata(&self) -> Map<String, Value> {
        self.state().metadata.clone()
    }

    /// Look up a single metadata entry
    pub fn meta(&self, key: &str) -> Option<Value> {
        self.state().metadata.get(key).cloned()
    }

    /// Insert or overwrite a metadata entry
    pub fn set_meta(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.state().metadata.insert(key.into(), value.into());
    }

    /// Mutate the metadata map in place
    ///
    /// Same locking rule as [`update_payload`](Self::update_payload).
    pub fn update_metadata<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        f(&mut self.state().metadata)
    }

    pub fn failure(&self) -> Option<Failure> {
        self.state().failure.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Prevent further default handling
    ///
    /// Idempotent. Only stops listeners that have not started yet in the
    /// emission carrying this context.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Snapshot the current field values
    pub fn to_init(&self) -> ContextInit {
        let state = self.state();
        ContextInit {
            event_type: state.event_type.clone(),
            command_name: state.command_name.clone(),
            payload: state.payload.clone(),
            metadata: state.metadata.clone(),
            failure: state.failure.clone(),
            cancelled: self.is_cancelled(),
        }
    }

    /// Independent copy of this context
    ///
    /// Payload and metadata are copied, so mutating the fork never affects
    /// the original and vice versa.
    pub fn fork(&self) -> Self {
        Self::new(self.to_init())
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self::new(ContextInit::default())
    }
}

impl std::fmt::Debug for EventContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("EventContext")
            .field("event_type", &state.event_type)
            .field("command_name", &state.command_name)
            .field("payload", &state.payload)
            .field("metadata", &state.metadata)
            .field("failure", &state.failure)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Serialize for EventContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_init().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_defaults() {
        let ctx = EventContext::default();
        assert_eq!(ctx.event_type(), "");
        assert_eq!(ctx.command_name(), "");
        assert_eq!(ctx.payload(), Value::Null);
        assert!(ctx.metadata().is_empty());
        assert!(ctx.failure().is_none());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_normalize_passthrough_identity() {
        let ctx = EventContext::new(ContextInit::new().event_type("msg"));
        let normalized = EventContext::normalize(&ctx);
        assert!(EventContext::ptr_eq(&ctx, &normalized));

        normalized.set_meta("seen", true);
        assert_eq!(ctx.meta("seen"), Some(json!(true)));
    }

    #[test]
    fn test_normalize_raw_value_is_payload() {
        let ctx = EventContext::normalize(json!({"type": "ignored", "k": 1}));
        assert_eq!(ctx.event_type(), "");
        assert_eq!(ctx.payload()["k"], 1);
    }

    #[test]
    fn test_cancel_is_idempotent_and_terminal() {
        let ctx = EventContext::default();
        ctx.cancel();
        ctx.cancel();
        assert!(ctx.is_cancelled());
        assert!(ctx.to_init().cancelled);
    }

    #[test]
    fn test_fork_is_independent() {
        let ctx = EventContext::new(
            ContextInit::new()
                .event_type("msg")
                .command_name("save")
                .payload(json!({"a": 1}))
                .meta("stage", "before")
                .failure(Failure::new("boom")),
        );
        ctx.cancel();

        let fork = ctx.fork();
        assert!(!EventContext::ptr_eq(&ctx, &fork));
        assert_eq!(fork.to_init(), ctx.to_init());

        fork.update_payload(|p| p["a"] = json!(2));
        fork.set_meta("stage", "after");
        assert_eq!(ctx.payload()["a"], 1);
        assert_eq!(ctx.meta("stage"), Some(json!("before")));

        ctx.set_meta("extra", 1);
        assert!(fork.meta("extra").is_none());
    }

    #[test]
    fn test_handle_clone_aliases_state() {
        let ctx = EventContext::default();
        let alias = ctx.clone();
        alias.cancel();
        alias.set_payload(json!("x"));
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.payload(), json!("x"));
        assert!(EventContext::ptr_eq(&ctx, &alias));
    }

    #[test]
    fn test_init_deserializes_aliases_and_ignores_unknown() {
        let init: ContextInit = serde_json::from_value(json!({
            "type": "click",
            "name": "cmd",
            "data": {"x": 1},
            "meta": {"trace": "t-1"},
            "error": "bad",
            "defaultPrevented": true,
            "bubbles": false
        }))
        .unwrap();

        assert_eq!(init.event_type, "click");
        assert_eq!(init.command_name, "cmd");
        assert_eq!(init.payload["x"], 1);
        assert_eq!(init.metadata["trace"], "t-1");
        assert_eq!(init.failure, Some(Failure::new("bad")));
        assert!(init.cancelled);
    }

    #[test]
    fn test_context_serializes_camel_case() {
        let ctx = EventContext::new(ContextInit::new().event_type("msg").payload(json!(5)));
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["eventType"], "msg");
        assert_eq!(json["payload"], 5);
        assert_eq!(json["cancelled"], false);
        assert!(json.get("failure").is_none());
    }

    #[test]
    fn test_payload_as_typed() {
        #[derive(Deserialize)]
        struct Order {
            id: u32,
        }

        let ctx = EventContext::normalize(json!({"id": 7}));
        let order: Order = ctx.payload_as().unwrap();
        assert_eq!(order.id, 7);

        let bad = EventContext::normalize(json!("text"));
        assert!(matches!(
            bad.payload_as::<Order>(),
            Err(EventError::Serialization(_))
        ));
    }

    #[test]
    fn test_failure_from_error() {
        let failure = Failure::from(EventError::msg("boom"));
        assert_eq!(failure.message, "boom");
        assert_eq!(failure.to_string(), "boom");
    }

    #[test]
    fn test_default_input_is_empty_object() {
        let ctx = EventContext::normalize(ContextInput::default());
        assert_eq!(ctx.payload(), json!({}));
    }
}
