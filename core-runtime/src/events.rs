//! # Event Bus System
//!
//! Diagnostic event stream for the player core, built on a broadcast channel.
//!
//! The resilience controller reports what it is doing (sessions created and
//! destroyed, failure signals, scheduled reconnects, exhausted budgets) as
//! typed events. UI layers and tests subscribe to observe recovery without
//! reaching into controller state.
//!
//! ```text
//! ┌──────────────────────┐   emit    ┌───────────┐  subscribe  ┌────────────┐
//! │ ResilienceController ├──────────>│ EventBus  ├────────────>│ Subscriber │
//! └──────────────────────┘           └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! let event_bus = EventBus::new(64);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus.emit(CoreEvent::Playback(PlaybackEvent::Detached)).ok();
//!
//! assert_eq!(
//!     subscriber.try_recv().unwrap(),
//!     CoreEvent::Playback(PlaybackEvent::Detached)
//! );
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell more than the buffer size
//!   behind and missed `n` events. Non-fatal.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.
//!
//! Emitting with no subscribers returns an error that publishers are expected
//! to ignore; diagnostics are best-effort.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::error::{RecvError, SendError, TryRecvError};
pub use core_async::sync::broadcast::Receiver;

pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Playback(PlaybackEvent),
}

impl CoreEvent {
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(e) => e.severity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Lifecycle and recovery events of the live player.
///
/// Stream addresses are carried in redacted form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A new attach cycle started for `target`.
    Attached { target: String },
    /// The attach cycle ended; all recovery state was discarded.
    Detached,
    /// A decoder session was bound to the sink.
    SessionCreated { target: String, generation: u64 },
    /// A decoder session was released.
    SessionDestroyed { generation: u64 },
    /// Some source reported the feed as broken.
    FailureSignalled { reason: String },
    /// A reconnect timer was armed.
    ReconnectScheduled { attempt: u32, delay_ms: u64 },
    /// A reconnect timer fired and the session is being rebuilt.
    Reconnecting { attempt: u32 },
    /// Playback advanced after one or more failed attempts.
    PlaybackRecovered { previous_attempts: u32 },
    /// No more reconnects will be attempted in this attach cycle.
    RetryBudgetExhausted { attempts: u32 },
    /// The runtime cannot play live feeds; nothing will be retried.
    CapabilityUnavailable { target: String },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Attached { .. } => "Player attached",
            PlaybackEvent::Detached => "Player detached",
            PlaybackEvent::SessionCreated { .. } => "Decoder session created",
            PlaybackEvent::SessionDestroyed { .. } => "Decoder session destroyed",
            PlaybackEvent::FailureSignalled { .. } => "Feed failure signalled",
            PlaybackEvent::ReconnectScheduled { .. } => "Reconnect scheduled",
            PlaybackEvent::Reconnecting { .. } => "Reconnecting",
            PlaybackEvent::PlaybackRecovered { .. } => "Playback recovered",
            PlaybackEvent::RetryBudgetExhausted { .. } => "Retry budget exhausted",
            PlaybackEvent::CapabilityUnavailable { .. } => "Live playback unavailable",
        }
    }

    fn severity(&self) -> EventSeverity {
        match self {
            PlaybackEvent::RetryBudgetExhausted { .. }
            | PlaybackEvent::CapabilityUnavailable { .. } => EventSeverity::Error,
            PlaybackEvent::FailureSignalled { .. } | PlaybackEvent::ReconnectScheduled { .. } => {
                EventSeverity::Warning
            }
            PlaybackEvent::Attached { .. }
            | PlaybackEvent::Detached
            | PlaybackEvent::Reconnecting { .. }
            | PlaybackEvent::PlaybackRecovered { .. } => EventSeverity::Info,
            PlaybackEvent::SessionCreated { .. } | PlaybackEvent::SessionDestroyed { .. } => {
                EventSeverity::Debug
            }
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for [`CoreEvent`]s.
///
/// Cloning the bus yields another handle to the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per
    /// subscriber before it reports `Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when nobody is subscribed.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` that skips events rejected by an
/// optional filter.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only yield events matching `predicate`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only yield events at or above `min`.
    pub fn with_min_severity(self, min: EventSeverity) -> Self {
        self.filter(move |event| event.severity() >= min)
    }

    /// Waits for the next matching event.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Returns the next buffered matching event without waiting.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, TryRecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.matches(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |f| f(event))
    }
}
