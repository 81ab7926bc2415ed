//! The engine contract consumed by systems and handlers

use crate::components::{Identity, Position};
use crate::core::error::{MudError, Result};
use crate::core::types::{EntityId, GridPos, Seconds};
use crate::ecs::component::{Component, ComponentData, ComponentKind, MutableComponent};
use crate::ecs::entity::{Entity, EntityMut};

/// World-level lifecycle notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityEvent {
    Spawned(EntityId),
    Despawned(EntityId),
    ComponentAdded { entity: EntityId, kind: ComponentKind },
    ComponentRemoved { entity: EntityId, kind: ComponentKind },
}

/// Owner of all entities. Object-safe so systems take `&mut dyn Engine`.
pub trait Engine {
    fn get_entity(&self, id: &EntityId) -> Option<&Entity>;
    fn get_entity_mut(&mut self, id: &EntityId) -> Option<EntityMut<'_>>;
    fn entities(&self) -> Box<dyn Iterator<Item = &Entity> + '_>;

    /// Ids of every entity carrying `kind`, in spawn order
    fn entities_with_component(&self, kind: ComponentKind) -> Vec<EntityId>;

    /// Ids of every entity placed at `pos`, in spawn order
    fn entities_at(&self, pos: GridPos) -> Vec<EntityId>;

    fn add_entity(&mut self, entity: Entity) -> Result<()>;
    fn remove_entity(&mut self, id: &EntityId) -> Option<Entity>;

    /// Insert or replace a component on a live entity
    fn add_component(&mut self, id: &EntityId, component: Component) -> Result<Option<Component>>;

    /// No-op if the entity or component is absent
    fn remove_component(&mut self, id: &EntityId, kind: ComponentKind) -> Option<Component>;

    fn room_exists(&self, pos: GridPos) -> bool;
    fn room_name(&self, pos: GridPos) -> Option<&str>;
    fn room_description(&self, pos: GridPos) -> Option<&str>;

    /// Seconds of simulated time since start
    fn elapsed(&self) -> Seconds;

    fn drain_events(&mut self) -> Vec<EntityEvent>;
}

/// Typed conveniences over any `Engine`, including `dyn Engine`
pub trait EngineExt: Engine {
    fn component<T: ComponentData>(&self, id: &EntityId) -> Option<&T> {
        self.get_entity(id).and_then(|e| e.get::<T>())
    }

    fn component_mut<T: MutableComponent>(&mut self, id: &EntityId) -> Option<&mut T> {
        self.get_entity_mut(id)
            .and_then(|e| e.into_component_mut::<T>())
    }

    /// Like `component_mut` but an absent component is an invariant error
    fn require_mut<T: MutableComponent>(&mut self, id: &EntityId) -> Result<&mut T> {
        self.component_mut::<T>(id)
            .ok_or_else(|| MudError::missing(id, T::KIND))
    }

    fn has_component(&self, id: &EntityId, kind: ComponentKind) -> bool {
        self.get_entity(id).map(|e| e.has(kind)).unwrap_or(false)
    }

    fn insert<T: ComponentData>(&mut self, id: &EntityId, component: T) -> Result<Option<Component>> {
        self.add_component(id, component.into())
    }

    fn remove<T: ComponentData>(&mut self, id: &EntityId) -> Option<T> {
        self.remove_component(id, T::KIND)
            .and_then(T::try_from_component)
    }

    fn position_of(&self, id: &EntityId) -> Option<GridPos> {
        self.component::<Position>(id).map(Position::grid)
    }

    /// Place an entity in a room (or move it)
    fn place(&mut self, id: &EntityId, pos: GridPos) -> Result<()> {
        self.add_component(id, Position::from(pos).into()).map(|_| ())
    }

    /// Display name, falling back to a neutral word
    fn name_of(&self, id: &EntityId) -> String {
        self.component::<Identity>(id)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "something".to_string())
    }
}

impl<E: Engine + ?Sized> EngineExt for E {}
