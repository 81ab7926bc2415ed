//! ECS World - owns all entities and keeps query indices current
//!
//! Lookups by component kind and by room coordinate are served from
//! maintained indices instead of scanning every entity. The scan variants
//! are kept as the reference the indices are checked against.

use ahash::{AHashMap, AHashSet};

use crate::components::Position;
use crate::core::error::{MudError, Result};
use crate::core::types::{EntityId, GridPos, Seconds};
use crate::ecs::component::{Component, ComponentKind};
use crate::ecs::engine::{Engine, EntityEvent};
use crate::ecs::entity::{ComponentEvent, Entity, EntityMut};
use crate::ecs::snapshot::EntitySnapshot;

/// Static description of one room cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub name: String,
    pub description: String,
}

/// The game world containing all entities
pub struct World {
    pub current_tick: u64,
    elapsed: Seconds,
    entities: AHashMap<EntityId, Entity>,
    next_seq: u64,
    by_kind: AHashMap<ComponentKind, AHashSet<EntityId>>,
    by_pos: AHashMap<GridPos, AHashSet<EntityId>>,
    rooms: AHashMap<GridPos, Room>,
    events: Vec<EntityEvent>,
}

impl World {
    pub fn new() -> Self {
        Self {
            current_tick: 0,
            elapsed: 0.0,
            entities: AHashMap::new(),
            next_seq: 0,
            by_kind: AHashMap::new(),
            by_pos: AHashMap::new(),
            rooms: AHashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn add_room(&mut self, pos: GridPos, name: impl Into<String>, description: impl Into<String>) {
        self.rooms.insert(
            pos,
            Room {
                name: name.into(),
                description: description.into(),
            },
        );
    }

    pub fn room(&self, pos: GridPos) -> Option<&Room> {
        self.rooms.get(&pos)
    }

    /// Advance simulated time by one tick of `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        self.current_tick += 1;
        self.elapsed += dt as Seconds;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Serialize an entity, excluding transient components. Bumps its version.
    pub fn snapshot_entity(&mut self, id: &EntityId) -> Option<EntitySnapshot> {
        self.entities.get_mut(id).map(EntitySnapshot::capture)
    }

    /// Linear-scan reference for `entities_with_component`
    pub fn scan_entities_with_component(&self, kind: ComponentKind) -> Vec<EntityId> {
        let mut found: Vec<&Entity> = self.entities.values().filter(|e| e.has(kind)).collect();
        found.sort_by_key(|e| e.seq);
        found.into_iter().map(|e| e.id().clone()).collect()
    }

    /// Linear-scan reference for `entities_at`
    pub fn scan_entities_at(&self, pos: GridPos) -> Vec<EntityId> {
        let mut found: Vec<&Entity> = self
            .entities
            .values()
            .filter(|e| e.get::<Position>().map(Position::grid) == Some(pos))
            .collect();
        found.sort_by_key(|e| e.seq);
        found.into_iter().map(|e| e.id().clone()).collect()
    }

    fn ordered(&self, ids: Option<&AHashSet<EntityId>>) -> Vec<EntityId> {
        let Some(ids) = ids else {
            return Vec::new();
        };
        let mut found: Vec<&Entity> = ids.iter().filter_map(|id| self.entities.get(id)).collect();
        found.sort_by_key(|e| e.seq);
        found.into_iter().map(|e| e.id().clone()).collect()
    }

    fn index_component(&mut self, id: &EntityId, component: &Component) {
        self.by_kind
            .entry(component.kind())
            .or_default()
            .insert(id.clone());
        if let Component::Position(pos) = component {
            self.by_pos.entry(pos.grid()).or_default().insert(id.clone());
        }
    }

    fn unindex_component(&mut self, id: &EntityId, component: &Component) {
        if let Some(set) = self.by_kind.get_mut(&component.kind()) {
            set.remove(id);
        }
        if let Component::Position(pos) = component {
            let cell = pos.grid();
            if let Some(set) = self.by_pos.get_mut(&cell) {
                set.remove(id);
                if set.is_empty() {
                    self.by_pos.remove(&cell);
                }
            }
        }
    }

    fn forward_events(&mut self, id: &EntityId, events: Vec<ComponentEvent>) {
        self.events.extend(events.into_iter().map(|event| match event {
            ComponentEvent::Added(kind) => EntityEvent::ComponentAdded {
                entity: id.clone(),
                kind,
            },
            ComponentEvent::Removed(kind) => EntityEvent::ComponentRemoved {
                entity: id.clone(),
                kind,
            },
        }));
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for World {
    fn get_entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    fn get_entity_mut(&mut self, id: &EntityId) -> Option<EntityMut<'_>> {
        self.entities.get_mut(id).map(EntityMut::new)
    }

    fn entities(&self) -> Box<dyn Iterator<Item = &Entity> + '_> {
        Box::new(self.entities.values())
    }

    fn entities_with_component(&self, kind: ComponentKind) -> Vec<EntityId> {
        self.ordered(self.by_kind.get(&kind))
    }

    fn entities_at(&self, pos: GridPos) -> Vec<EntityId> {
        self.ordered(self.by_pos.get(&pos))
    }

    fn add_entity(&mut self, mut entity: Entity) -> Result<()> {
        let id = entity.id().clone();
        if self.entities.contains_key(&id) {
            return Err(MudError::DuplicateEntity(id));
        }

        entity.seq = self.next_seq;
        self.next_seq += 1;

        let components: Vec<Component> = entity.components().cloned().collect();
        for component in &components {
            self.index_component(&id, component);
        }

        let pending = entity.take_events();
        self.events.push(EntityEvent::Spawned(id.clone()));
        self.forward_events(&id, pending);
        self.entities.insert(id, entity);
        Ok(())
    }

    fn remove_entity(&mut self, id: &EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        let components: Vec<Component> = entity.components().cloned().collect();
        for component in &components {
            self.unindex_component(id, component);
        }
        self.events.push(EntityEvent::Despawned(id.clone()));
        Some(entity)
    }

    fn add_component(&mut self, id: &EntityId, component: Component) -> Result<Option<Component>> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| MudError::EntityNotFound(id.clone()))?;

        let previous = entity.add_component(component.clone());
        let events = entity.take_events();

        if let Some(old) = &previous {
            self.unindex_component(id, old);
        }
        self.index_component(id, &component);
        self.forward_events(id, events);
        Ok(previous)
    }

    fn remove_component(&mut self, id: &EntityId, kind: ComponentKind) -> Option<Component> {
        let entity = self.entities.get_mut(id)?;
        let removed = entity.remove_component(kind)?;
        let events = entity.take_events();
        self.unindex_component(id, &removed);
        self.forward_events(id, events);
        Some(removed)
    }

    fn room_exists(&self, pos: GridPos) -> bool {
        self.rooms.contains_key(&pos)
    }

    fn room_name(&self, pos: GridPos) -> Option<&str> {
        self.rooms.get(&pos).map(|r| r.name.as_str())
    }

    fn room_description(&self, pos: GridPos) -> Option<&str> {
        self.rooms.get(&pos).map(|r| r.description.as_str())
    }

    fn elapsed(&self) -> Seconds {
        self.elapsed
    }

    fn drain_events(&mut self) -> Vec<EntityEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{CombatStats, Identity, Roundtime};
    use crate::ecs::engine::EngineExt;

    fn goblin(id: &str, x: i32, y: i32) -> Entity {
        Entity::new(EntityId::from(id))
            .with(Position::new(x, y))
            .with(Identity::new("goblin"))
            .with(CombatStats::new(20, 5, 5))
    }

    #[test]
    fn test_entities_at_tracks_moves() {
        let mut world = World::new();
        world.add_entity(goblin("g1", 0, 0)).unwrap();
        world.add_entity(goblin("g2", 0, 0)).unwrap();

        assert_eq!(world.entities_at(GridPos::new(0, 0)).len(), 2);

        world.place(&EntityId::from("g1"), GridPos::new(1, 0)).unwrap();
        assert_eq!(
            world.entities_at(GridPos::new(0, 0)),
            vec![EntityId::from("g2")]
        );
        assert_eq!(
            world.entities_at(GridPos::new(1, 0)),
            vec![EntityId::from("g1")]
        );
    }

    #[test]
    fn test_removing_position_unplaces_entity() {
        let mut world = World::new();
        world.add_entity(goblin("g1", 3, 3)).unwrap();
        let id = EntityId::from("g1");

        world.remove_component(&id, ComponentKind::Position);
        assert!(world.entities_at(GridPos::new(3, 3)).is_empty());
        assert!(world.entities_with_component(ComponentKind::Position).is_empty());
        assert!(world.get_entity(&id).is_some());
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let mut world = World::new();
        world.add_entity(goblin("g1", 0, 0)).unwrap();
        assert!(matches!(
            world.add_entity(goblin("g1", 0, 0)),
            Err(MudError::DuplicateEntity(_))
        ));
    }

    #[test]
    fn test_remove_entity_clears_indices() {
        let mut world = World::new();
        world.add_entity(goblin("g1", 0, 0)).unwrap();
        let removed = world.remove_entity(&EntityId::from("g1"));
        assert!(removed.is_some());
        assert!(world.entities_at(GridPos::new(0, 0)).is_empty());
        assert!(world
            .entities_with_component(ComponentKind::CombatStats)
            .is_empty());
    }

    #[test]
    fn test_component_lifecycle_events() {
        let mut world = World::new();
        world.add_entity(goblin("g1", 0, 0)).unwrap();
        world.drain_events();

        let id = EntityId::from("g1");
        world.insert(&id, Roundtime::new(3.0)).unwrap();
        world.remove_component(&id, ComponentKind::Roundtime);
        world.remove_component(&id, ComponentKind::Roundtime);

        assert_eq!(
            world.drain_events(),
            vec![
                EntityEvent::ComponentAdded {
                    entity: id.clone(),
                    kind: ComponentKind::Roundtime
                },
                EntityEvent::ComponentRemoved {
                    entity: id,
                    kind: ComponentKind::Roundtime
                },
            ]
        );
    }

    #[test]
    fn test_add_component_to_missing_entity_errors() {
        let mut world = World::new();
        let result = world.insert(&EntityId::from("ghost"), Roundtime::new(1.0));
        assert!(matches!(result, Err(MudError::EntityNotFound(_))));
    }

    #[test]
    fn test_component_mut_edits_in_place() {
        let mut world = World::new();
        world.add_entity(goblin("g1", 0, 0)).unwrap();
        let id = EntityId::from("g1");
        world.component_mut::<CombatStats>(&id).unwrap().hp = 3;
        assert_eq!(world.component::<CombatStats>(&id).unwrap().hp, 3);
    }

    #[test]
    fn test_results_in_spawn_order() {
        let mut world = World::new();
        for i in 0..20 {
            world.add_entity(goblin(&format!("g{i}"), 0, 0)).unwrap();
        }
        let ids = world.entities_at(GridPos::new(0, 0));
        let expected: Vec<EntityId> = (0..20).map(|i| EntityId(format!("g{i}"))).collect();
        assert_eq!(ids, expected);
    }
}
