//! Render/event bridge
//!
//! Lifecycle events for audio, haptics and visual collaborators. Within one
//! play the order is always `launched → (collision | tick | reel_stop)* →
//! settled (per body) → reconciled → jackpot? → completed`; a cancelled play
//! ends with `cancelled` and never completes.

use serde::Serialize;
use serde_json::Value;

use crate::audio::SoundCue;
use crate::outcome::{GameKind, Outcome};
use crate::sim::{BackendKind, Surface};

/// One engine event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    Launched {
        game: GameKind,
        /// None for the scratch card
        backend: Option<BackendKind>,
        target: Outcome,
    },
    Collision {
        body: usize,
        surface: Surface,
        impact: f32,
    },
    /// A wheel segment boundary passed the pointer
    Tick { segment: usize },
    ReelStop { reel: usize, symbol: usize },
    Settled { body: usize, tick: u64, forced: bool },
    /// Scratch card coverage after a stamp
    Reveal { fraction: f32 },
    Revealed { fraction: f32 },
    Reconciled {
        target: Outcome,
        extracted: Outcome,
        snapped: bool,
        reward: u32,
    },
    Jackpot { reward: u32 },
    Completed { reward: u32 },
    Cancelled,
    /// Sound cue for the audio collaborator
    Cue { cue: SoundCue },
}

impl EngineEvent {
    /// Event name as seen by `on_event` subscribers
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::Launched { .. } => "launched",
            EngineEvent::Collision { .. } => "collision",
            EngineEvent::Tick { .. } => "tick",
            EngineEvent::ReelStop { .. } => "reel_stop",
            EngineEvent::Settled { .. } => "settled",
            EngineEvent::Reveal { .. } => "reveal",
            EngineEvent::Revealed { .. } => "revealed",
            EngineEvent::Reconciled { .. } => "reconciled",
            EngineEvent::Jackpot { .. } => "jackpot",
            EngineEvent::Completed { .. } => "completed",
            EngineEvent::Cancelled => "cancelled",
            EngineEvent::Cue { .. } => "cue",
        }
    }

    /// Event fields as JSON (without the name tag)
    pub fn payload(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => {
                map.remove("event");
                Value::Object(map)
            }
            _ => Value::Null,
        }
    }

    /// Effects that come and go during a play, as opposed to lifecycle steps
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineEvent::Collision { .. }
                | EngineEvent::Tick { .. }
                | EngineEvent::ReelStop { .. }
                | EngineEvent::Reveal { .. }
                | EngineEvent::Cue { .. }
        )
    }
}

type CompleteListener = Box<dyn FnMut(u32)>;
type EventListener = Box<dyn FnMut(&EngineEvent)>;

/// Fans events out to subscribers and keeps them for polling hosts
#[derive(Default)]
pub struct EventBridge {
    complete_listeners: Vec<CompleteListener>,
    event_listeners: Vec<EventListener>,
    pending: Vec<EngineEvent>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the paid reward of each successful play
    pub fn on_complete(&mut self, listener: impl FnMut(u32) + 'static) {
        self.complete_listeners.push(Box::new(listener));
    }

    /// Subscribe to every event
    pub fn on_event(&mut self, listener: impl FnMut(&EngineEvent) + 'static) {
        self.event_listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: EngineEvent) {
        for listener in &mut self.event_listeners {
            listener(&event);
        }
        if let EngineEvent::Completed { reward } = event {
            for listener in &mut self.complete_listeners {
                listener(reward);
            }
        }
        self.pending.push(event);
    }

    /// Take the events emitted since the last drain
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[EngineEvent] {
        &self.pending
    }
}

impl std::fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridge")
            .field("complete_listeners", &self.complete_listeners.len())
            .field("event_listeners", &self.event_listeners.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}
