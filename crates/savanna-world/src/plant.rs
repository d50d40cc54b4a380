//! Plants: immutable food sources identified by their cell.

use crate::entity::MapEntity;
use crate::events::{Event, EventBus, EventKind, Subscriber, Subscriptions};
use savanna_core::Vector2d;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub struct Plant {
    position: Vector2d,
    subscriptions: Subscriptions,
}

impl Plant {
    pub fn new(position: Vector2d) -> Self {
        Self {
            position,
            subscriptions: Subscriptions::new(),
        }
    }

    /// Observe both the creation and the eating of this plant
    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscriptions.subscribe(EventKind::PlantCreated, subscriber);
        self.subscriptions.subscribe(EventKind::PlantEaten, subscriber);
    }

    pub fn notify_created(&self, bus: &mut EventBus) {
        bus.publish(
            &self.subscriptions,
            Event::PlantCreated {
                position: self.position,
            },
        );
    }

    /// Tell every observer the plant was eaten
    pub fn remove_plant(&self, bus: &mut EventBus) {
        bus.publish(
            &self.subscriptions,
            Event::PlantEaten {
                position: self.position,
            },
        );
    }
}

impl MapEntity for Plant {
    fn position(&self) -> Vector2d {
        self.position
    }

    fn priority(&self) -> u8 {
        1
    }
}

impl PartialEq for Plant {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for Plant {}

impl Hash for Plant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position.hash(state);
    }
}
