pub mod config;
pub mod error;
pub mod types;

pub use config::{CombatConfig, GameConfig, NpcConfig, RegenConfig, TimeCost};
pub use error::{MudError, Result};
pub use types::{Direction, EntityId, GridPos, Seconds};
