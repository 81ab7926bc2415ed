//! Data-only component types
//!
//! Components carry state and small accessors, never behaviour that
//! touches other entities. Systems and combat handlers own the logic.

pub mod actor;
pub mod combat;
pub mod inventory;
pub mod spatial;

pub use actor::{LogoutTimer, Npc, Player, Posture, Stance};
pub use combat::{
    CombatStats, EngagementTier, Limb, Momentum, ParryReady, Roundtime, Skills, TierClass,
    DEFENSE_BUDGET,
};
pub use inventory::{
    Container, Inventory, Item, Magazine, Weapon, WeaponCategory, WeaponClass, BACKPACK_SLOT,
};
pub use spatial::{Identity, Portal, Position};
