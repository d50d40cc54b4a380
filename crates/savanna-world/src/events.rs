//! Entity events and their per-subscriber dispatch queue.
//!
//! Entities never hold references to the components observing them. Each
//! entity keeps a `Subscriptions` list naming which component wants which kind
//! of event; publishing copies the event once per subscriber into the
//! `EventBus`, and the simulation routes every envelope to its component before
//! the next entity operation runs.

use savanna_core::{AnimalId, GeneCounts, Result, Vector2d};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Components that can observe entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subscriber {
    WorldMap,
    Statistics,
    Simulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    PositionChanged,
    EnergyChanged,
    Died,
    Born,
    PlantCreated,
    PlantEaten,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Published before the animal commits its new position
    PositionChanged {
        animal: AnimalId,
        from: Vector2d,
        to: Vector2d,
    },
    /// `delta` is the amount actually applied; `energy` the resulting level
    EnergyChanged {
        animal: AnimalId,
        delta: i32,
        energy: i32,
    },
    Died {
        animal: AnimalId,
        energy: i32,
        gene_counts: GeneCounts,
    },
    /// Published once by each parent
    Born {
        parent: AnimalId,
        child: AnimalId,
    },
    PlantCreated {
        position: Vector2d,
    },
    PlantEaten {
        position: Vector2d,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::PositionChanged { .. } => EventKind::PositionChanged,
            Event::EnergyChanged { .. } => EventKind::EnergyChanged,
            Event::Died { .. } => EventKind::Died,
            Event::Born { .. } => EventKind::Born,
            Event::PlantCreated { .. } => EventKind::PlantCreated,
            Event::PlantEaten { .. } => EventKind::PlantEaten,
        }
    }
}

/// A component that reacts to entity events
pub trait Observer {
    fn notify(&mut self, event: &Event) -> Result<()>;
}

/// Per-event-kind subscriber lists of a single entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriptions {
    entries: Vec<(EventKind, Subscriber)>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribing twice to the same kind has no effect
    pub fn subscribe(&mut self, kind: EventKind, subscriber: Subscriber) {
        if !self.is_subscribed(kind, subscriber) {
            self.entries.push((kind, subscriber));
        }
    }

    pub fn is_subscribed(&self, kind: EventKind, subscriber: Subscriber) -> bool {
        self.entries.contains(&(kind, subscriber))
    }

    /// Subscribers of one event kind, in subscription order
    pub fn subscribers(&self, kind: EventKind) -> impl Iterator<Item = Subscriber> + '_ {
        self.entries
            .iter()
            .filter(move |(entry_kind, _)| *entry_kind == kind)
            .map(|(_, subscriber)| *subscriber)
    }
}

/// An event addressed to one subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub subscriber: Subscriber,
    pub event: Event,
}

/// FIFO of published events awaiting dispatch
#[derive(Debug, Default)]
pub struct EventBus {
    queue: VecDeque<Envelope>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` for every subscriber of its kind
    pub fn publish(&mut self, subscriptions: &Subscriptions, event: Event) {
        for subscriber in subscriptions.subscribers(event.kind()) {
            self.queue.push_back(Envelope {
                subscriber,
                event: event.clone(),
            });
        }
    }

    pub fn pop(&mut self) -> Option<Envelope> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
