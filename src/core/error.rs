use thiserror::Error;

use crate::ecs::ComponentKind;

#[derive(Error, Debug)]
pub enum MudError {
    #[error("Entity not found: {0}")]
    EntityNotFound(crate::core::types::EntityId),

    #[error("Entity already exists: {0}")]
    DuplicateEntity(crate::core::types::EntityId),

    #[error("Entity {entity} is missing component {kind:?}")]
    ComponentMissing {
        entity: crate::core::types::EntityId,
        kind: ComponentKind,
    },

    #[error("Prefab not found: {0}")]
    PrefabNotFound(String),

    #[error("Invalid prefab: {0}")]
    InvalidPrefab(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl MudError {
    pub fn missing(entity: &crate::core::types::EntityId, kind: ComponentKind) -> Self {
        MudError::ComponentMissing {
            entity: entity.clone(),
            kind,
        }
    }
}

pub type Result<T> = std::result::Result<T, MudError>;
