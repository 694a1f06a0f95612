//! # Lifecycle events and states of an owner.
//!
//! ```text
//!              Create     Start      Resume
//! Initialized ───────► Created ───► Started ───► Resumed
//!                         ▲  Stop      ▲   Pause    │
//!                         └────────────┴────────────┘
//! any ── Destroy ──► Destroyed (terminal)
//! ```

use std::fmt;

use super::observer::LifecycleObserver;

/// A lifecycle transition emitted by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Create,
    Start,
    Resume,
    Pause,
    Stop,
    Destroy,
}

impl LifecycleEvent {
    /// State the owner is in right after this event.
    pub fn target_state(self) -> LifecycleState {
        match self {
            LifecycleEvent::Create | LifecycleEvent::Stop => LifecycleState::Created,
            LifecycleEvent::Start | LifecycleEvent::Pause => LifecycleState::Started,
            LifecycleEvent::Resume => LifecycleState::Resumed,
            LifecycleEvent::Destroy => LifecycleState::Destroyed,
        }
    }

    /// Invokes the observer method matching this event.
    pub fn dispatch(self, observer: &dyn LifecycleObserver) {
        match self {
            LifecycleEvent::Create => observer.on_create(),
            LifecycleEvent::Start => observer.on_start(),
            LifecycleEvent::Resume => observer.on_resume(),
            LifecycleEvent::Pause => observer.on_pause(),
            LifecycleEvent::Stop => observer.on_stop(),
            LifecycleEvent::Destroy => observer.on_destroy(),
        }
    }

    /// Upward events needed to bring a fresh observer to `state`, in order.
    pub(crate) fn catch_up(state: LifecycleState) -> &'static [LifecycleEvent] {
        const UP: [LifecycleEvent; 3] = [
            LifecycleEvent::Create,
            LifecycleEvent::Start,
            LifecycleEvent::Resume,
        ];
        match state {
            LifecycleState::Destroyed | LifecycleState::Initialized => &[],
            LifecycleState::Created => &UP[..1],
            LifecycleState::Started => &UP[..2],
            LifecycleState::Resumed => &UP[..],
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleEvent::Create => "create",
            LifecycleEvent::Start => "start",
            LifecycleEvent::Resume => "resume",
            LifecycleEvent::Pause => "pause",
            LifecycleEvent::Stop => "stop",
            LifecycleEvent::Destroy => "destroy",
        };
        f.write_str(s)
    }
}

/// Owner state. Ordered so that `Destroyed < Initialized < ... < Resumed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LifecycleState {
    Destroyed,
    #[default]
    Initialized,
    Created,
    Started,
    Resumed,
}
