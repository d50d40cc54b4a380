//! Owning storage for animals.
//!
//! An `AnimalId` is the index of its slot. Slots are never reused, so an id
//! stays unique for the whole run even after its animal has been retired.

use crate::animal::Animal;
use savanna_core::{AnimalId, Error, Result};

#[derive(Debug, Default)]
pub struct AnimalArena {
    slots: Vec<Option<Animal>>,
}

impl AnimalArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next inserted animal must carry
    pub fn next_id(&self) -> AnimalId {
        AnimalId(self.slots.len() as u64)
    }

    pub fn insert(&mut self, animal: Animal) -> Result<AnimalId> {
        let expected = self.next_id();
        if animal.id != expected {
            return Err(Error::InvalidState(format!(
                "arena expected {} but got {}",
                expected, animal.id
            )));
        }

        self.slots.push(Some(animal));
        Ok(expected)
    }

    pub fn get(&self, id: AnimalId) -> Option<&Animal> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: AnimalId) -> Option<&mut Animal> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Retire an animal for good
    pub fn remove(&mut self, id: AnimalId) -> Option<Animal> {
        self.slots.get_mut(id.index()).and_then(Option::take)
    }

    /// Move an animal out temporarily; hand it back with `restore`
    pub fn take(&mut self, id: AnimalId) -> Result<Animal> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or_else(|| Error::InvalidState(format!("{} is not in the arena", id)))
    }

    pub fn restore(&mut self, animals: impl IntoIterator<Item = Animal>) -> Result<()> {
        for animal in animals {
            let slot = self
                .slots
                .get_mut(animal.id.index())
                .ok_or_else(|| Error::InvalidState(format!("{} was never allocated", animal.id)))?;

            if slot.is_some() {
                return Err(Error::InvalidState(format!("{} restored twice", animal.id)));
            }

            *slot = Some(animal);
        }
        Ok(())
    }

    /// Number of animals stored, lent ones excluded
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
