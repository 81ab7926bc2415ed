//! Entity serialization
//!
//! Session-only components are dropped by an explicit exclusion list,
//! not by inspecting types.

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::ecs::component::{Component, ComponentKind};
use crate::ecs::entity::Entity;

/// Components never written to a snapshot
pub const TRANSIENT_COMPONENTS: &[ComponentKind] = &[
    ComponentKind::Roundtime,
    ComponentKind::ParryReady,
    ComponentKind::LogoutTimer,
];

pub fn is_transient(kind: ComponentKind) -> bool {
    TRANSIENT_COMPONENTS.contains(&kind)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub version: u64,
    pub components: Vec<Component>,
}

impl EntitySnapshot {
    /// Capture persistent state; bumps the entity's version
    pub fn capture(entity: &mut Entity) -> Self {
        entity.bump_version();
        let mut components: Vec<Component> = entity
            .components()
            .filter(|c| !is_transient(c.kind()))
            .cloned()
            .collect();
        components.sort_by_key(Component::kind);
        Self {
            id: entity.id().clone(),
            version: entity.version(),
            components,
        }
    }

    /// Rebuild an entity; construction bumps the version again
    pub fn restore(self) -> Entity {
        let mut entity = Entity::new(self.id);
        for component in self.components {
            entity.add_component(component);
        }
        entity.take_events();
        entity.set_version(self.version + 1);
        entity
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
