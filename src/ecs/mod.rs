//! Entity-component substrate
//!
//! Components are a closed enum stored in a per-entity sparse map.
//! The `World` owns entities and maintains kind and spatial indices.

pub mod component;
pub mod engine;
pub mod entity;
pub mod snapshot;
pub mod world;

pub use component::{Component, ComponentData, ComponentKind, MutableComponent};
pub use engine::{Engine, EngineExt, EntityEvent};
pub use entity::{ComponentEvent, Entity, EntityMut};
pub use snapshot::{EntitySnapshot, TRANSIENT_COMPONENTS};
pub use world::{Room, World};
