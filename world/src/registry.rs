//! Generational entity arena with per-kind and per-faction indices.

use libra_core::{EntityId, EntityKind, Faction};
use thiserror::Error;

use crate::entity::Entity;

/// Sparse list of handles.
///
/// Insertion reuses the first empty slot before appending, and removal
/// empties the matching slot, so handles keep their position while the list
/// is iterated.
#[derive(Clone, Debug, Default)]
pub struct IndexList {
    slots: Vec<Option<EntityId>>,
}

impl IndexList {
    fn insert(&mut self, id: EntityId) {
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => *slot = Some(id),
            None => self.slots.push(Some(id)),
        }
    }

    fn remove(&mut self, id: EntityId) -> bool {
        match self.slots.iter_mut().find(|slot| **slot == Some(id)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    /// Handles stored in the list, skipping empty slots.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Reports whether no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Number of slots, occupied or not.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[derive(Clone, Debug)]
enum Slot {
    Vacant,
    Occupied(Entity),
    Detached,
}

#[derive(Clone, Debug)]
struct ArenaSlot {
    generation: u32,
    slot: Slot,
}

/// Owns every live entity and the indices over them.
///
/// Every entity appears in the "all" list, exactly one kind list, and exactly
/// one of the faction-bullet or faction-agent lists.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    arena: Vec<ArenaSlot>,
    free: Vec<u32>,
    all: IndexList,
    by_kind: [IndexList; 8],
    bullets_by_faction: [IndexList; 3],
    agents_by_faction: [IndexList; 3],
}

impl EntityRegistry {
    /// Takes ownership of the entity and records it in every applicable index.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let kind = entity.kind();
        let faction = entity.faction();
        let id = match self.free.pop() {
            Some(index) => {
                let arena_slot = &mut self.arena[index as usize];
                arena_slot.slot = Slot::Occupied(entity);
                EntityId::new(index, arena_slot.generation)
            }
            None => {
                let index = self.arena.len() as u32;
                self.arena.push(ArenaSlot {
                    generation: 0,
                    slot: Slot::Occupied(entity),
                });
                EntityId::new(index, 0)
            }
        };

        self.all.insert(id);
        self.by_kind[kind.index()].insert(id);
        self.faction_list_mut(kind, faction).insert(id);
        id
    }

    /// Removes the entity from the arena and every index.
    ///
    /// A live handle missing from one of its indices means the registry was
    /// corrupted; the entity is still released, but the violation is reported.
    pub fn remove(&mut self, id: EntityId) -> Result<Entity, RegistryError> {
        let arena_slot = self
            .arena
            .get_mut(id.index() as usize)
            .filter(|arena_slot| arena_slot.generation == id.generation())
            .ok_or(RegistryError::StaleHandle { entity: id })?;
        let entity = match std::mem::replace(&mut arena_slot.slot, Slot::Vacant) {
            Slot::Occupied(entity) => entity,
            other => {
                arena_slot.slot = other;
                return Err(RegistryError::StaleHandle { entity: id });
            }
        };
        arena_slot.generation = arena_slot.generation.wrapping_add(1);
        self.free.push(id.index());

        let kind = entity.kind();
        let faction = entity.faction();
        let mut missing = None;
        if !self.all.remove(id) {
            missing = Some("all");
        }
        if !self.by_kind[kind.index()].remove(id) {
            missing = missing.or(Some("kind"));
        }
        if !self.faction_list_mut(kind, faction).remove(id) {
            missing = missing.or(Some("faction"));
        }

        match missing {
            Some(index) => Err(RegistryError::MissingFromIndex {
                entity: id,
                kind,
                index,
            }),
            None => Ok(entity),
        }
    }

    fn faction_list_mut(&mut self, kind: EntityKind, faction: Faction) -> &mut IndexList {
        if kind.is_bullet() {
            &mut self.bullets_by_faction[faction.index()]
        } else {
            &mut self.agents_by_faction[faction.index()]
        }
    }

    /// Resolves a handle. Stale handles resolve to nothing.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        match self.arena.get(id.index() as usize) {
            Some(ArenaSlot {
                generation,
                slot: Slot::Occupied(entity),
            }) if *generation == id.generation() => Some(entity),
            _ => None,
        }
    }

    /// Resolves a handle mutably. Stale handles resolve to nothing.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        match self.arena.get_mut(id.index() as usize) {
            Some(ArenaSlot {
                generation,
                slot: Slot::Occupied(entity),
            }) if *generation == id.generation() => Some(entity),
            _ => None,
        }
    }

    /// Resolves two distinct handles mutably at once.
    pub fn pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut Entity, &mut Entity)> {
        let (a_index, b_index) = (a.index() as usize, b.index() as usize);
        if a_index == b_index || self.get(a).is_none() || self.get(b).is_none() {
            return None;
        }

        let (low, high) = if a_index < b_index {
            (a_index, b_index)
        } else {
            (b_index, a_index)
        };
        let (head, tail) = self.arena.split_at_mut(high);
        let (Slot::Occupied(low_entity), Slot::Occupied(high_entity)) =
            (&mut head[low].slot, &mut tail[0].slot)
        else {
            return None;
        };
        if a_index < b_index {
            Some((low_entity, high_entity))
        } else {
            Some((high_entity, low_entity))
        }
    }

    /// Temporarily takes an entity out of its slot.
    ///
    /// The handle stays indexed but resolves to nothing until
    /// [`EntityRegistry::reattach`] returns the entity.
    pub fn detach(&mut self, id: EntityId) -> Option<Entity> {
        let arena_slot = self
            .arena
            .get_mut(id.index() as usize)
            .filter(|arena_slot| arena_slot.generation == id.generation())?;
        match std::mem::replace(&mut arena_slot.slot, Slot::Detached) {
            Slot::Occupied(entity) => Some(entity),
            other => {
                arena_slot.slot = other;
                None
            }
        }
    }

    /// Returns a detached entity to its slot.
    pub fn reattach(&mut self, id: EntityId, entity: Entity) -> Result<(), RegistryError> {
        match self.arena.get_mut(id.index() as usize) {
            Some(arena_slot)
                if arena_slot.generation == id.generation()
                    && matches!(arena_slot.slot, Slot::Detached) =>
            {
                arena_slot.slot = Slot::Occupied(entity);
                Ok(())
            }
            _ => Err(RegistryError::StaleHandle { entity: id }),
        }
    }

    /// Handles of every registered entity.
    pub fn all(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.all.iter()
    }

    /// Handles of every entity of one kind.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = EntityId> + '_ {
        self.by_kind[kind.index()].iter()
    }

    /// Handles of every projectile of one faction.
    pub fn bullets_of(&self, faction: Faction) -> impl Iterator<Item = EntityId> + '_ {
        self.bullets_by_faction[faction.index()].iter()
    }

    /// Handles of every agent of one faction.
    pub fn agents_of(&self, faction: Faction) -> impl Iterator<Item = EntityId> + '_ {
        self.agents_by_faction[faction.index()].iter()
    }

    /// Handles of every projectile regardless of faction.
    pub fn bullets(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.bullets_by_faction.iter().flat_map(IndexList::iter)
    }

    /// Handles of every agent regardless of faction.
    pub fn agents(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.agents_by_faction.iter().flat_map(IndexList::iter)
    }

    /// Registered entities alongside their handles.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.all
            .iter()
            .filter_map(move |id| self.get(id).map(|entity| (id, entity)))
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Reports whether no entity is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Violations of the registry's bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The handle does not resolve to a live entity.
    #[error("entity handle {entity:?} is stale")]
    StaleHandle {
        /// Offending handle.
        entity: EntityId,
    },
    /// A live entity was absent from one of the indices it belongs to.
    #[error("{kind:?} entity {entity:?} was not in the {index} list")]
    MissingFromIndex {
        /// Offending handle.
        entity: EntityId,
        /// Kind of the entity.
        kind: EntityKind,
        /// Name of the index that lacked the handle.
        index: &'static str,
    },
}
