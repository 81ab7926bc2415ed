//! Entity: an identity plus at most one component per kind

use ahash::AHashMap;
use std::ops::Deref;

use crate::core::types::EntityId;
use crate::ecs::component::{Component, ComponentData, ComponentKind, MutableComponent};

/// Lifecycle notification recorded by an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentEvent {
    Added(ComponentKind),
    Removed(ComponentKind),
}

#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    components: AHashMap<ComponentKind, Component>,
    version: u64,
    /// Insertion order assigned by the world; keeps query results stable
    pub(crate) seq: u64,
    events: Vec<ComponentEvent>,
}

impl Entity {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            components: AHashMap::new(),
            version: 1,
            seq: 0,
            events: Vec::new(),
        }
    }

    /// Builder-style add
    pub fn with(mut self, component: impl Into<Component>) -> Self {
        self.add_component(component);
        self
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Insert or replace; returns the replaced component
    pub fn add_component(&mut self, component: impl Into<Component>) -> Option<Component> {
        let component = component.into();
        let kind = component.kind();
        let previous = self.components.insert(kind, component);
        self.events.push(ComponentEvent::Added(kind));
        previous
    }

    /// No-op if absent
    pub fn remove_component(&mut self, kind: ComponentKind) -> Option<Component> {
        let removed = self.components.remove(&kind)?;
        self.events.push(ComponentEvent::Removed(kind));
        Some(removed)
    }

    pub fn get<T: ComponentData>(&self) -> Option<&T> {
        self.components.get(&T::KIND).and_then(T::from_component)
    }

    pub fn get_mut<T: MutableComponent>(&mut self) -> Option<&mut T> {
        self.components
            .get_mut(&T::KIND)
            .and_then(T::from_component_mut)
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.keys().copied()
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn take_events(&mut self) -> Vec<ComponentEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Mutable handle to an entity owned by a world. Exposes in-place
/// component mutation only; adding or removing components goes through
/// the engine so its indices stay current.
pub struct EntityMut<'a> {
    entity: &'a mut Entity,
}

impl<'a> EntityMut<'a> {
    pub(crate) fn new(entity: &'a mut Entity) -> Self {
        Self { entity }
    }

    pub fn get_mut<T: MutableComponent>(&mut self) -> Option<&mut T> {
        self.entity.get_mut::<T>()
    }

    /// Consume the handle, keeping the borrow of one component
    pub fn into_component_mut<T: MutableComponent>(self) -> Option<&'a mut T> {
        self.entity.get_mut::<T>()
    }
}

impl Deref for EntityMut<'_> {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Momentum, Position, Roundtime};

    #[test]
    fn test_add_replaces_and_notifies() {
        let mut entity = Entity::new(EntityId::from("e1"));
        assert!(entity.add_component(Roundtime::new(2.0)).is_none());
        let replaced = entity.add_component(Roundtime::new(5.0));
        assert!(matches!(replaced, Some(Component::Roundtime(rt)) if rt.remaining == 2.0));
        assert_eq!(entity.get::<Roundtime>().unwrap().remaining, 5.0);
        assert_eq!(
            entity.take_events(),
            vec![
                ComponentEvent::Added(ComponentKind::Roundtime),
                ComponentEvent::Added(ComponentKind::Roundtime)
            ]
        );
    }

    #[test]
    fn test_remove_absent_is_silent() {
        let mut entity = Entity::new(EntityId::from("e1"));
        assert!(entity.remove_component(ComponentKind::Momentum).is_none());
        assert!(entity.take_events().is_empty());

        entity.add_component(Momentum::default());
        entity.take_events();
        assert!(entity.remove_component(ComponentKind::Momentum).is_some());
        assert_eq!(
            entity.take_events(),
            vec![ComponentEvent::Removed(ComponentKind::Momentum)]
        );
    }

    #[test]
    fn test_missing_component_is_none() {
        let entity = Entity::new(EntityId::from("e1")).with(Position::new(1, 2));
        assert!(entity.get::<Roundtime>().is_none());
        assert_eq!(entity.get::<Position>().unwrap().x, 1);
    }
}
