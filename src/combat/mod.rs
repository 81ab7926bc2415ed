//! Combat: engagement tiers, roundtime, strikes, reloads, maneuvers,
//! finishing moves, defensive configuration and automation
//!
//! `CombatSystem` is the only entry point the rest of the game uses.
//! Handlers are free functions over a `CombatContext`, grouped by what
//! they do.

pub mod action;
pub mod attack;
pub mod automation;
pub mod awareness;
pub mod context;
pub mod dice;
pub mod engagement;
pub mod maneuver;
pub mod reload;
pub mod resolution;
pub mod special;
pub mod stance;
pub mod system;
pub mod targeting;

pub use action::{
    ActionOutcome, AttackMove, CombatAction, CombatCommand, StancePreset, StanceRequest,
    TargetRef, TargetRequest,
};
pub use attack::{StrikeOptions, StrikePlan, StrikeResult};
pub use automation::AutomationManager;
pub use context::{ensure_ready, CombatContext};
pub use dice::{Dice, FixedDice, SeededDice};
pub use engagement::{change_room, pinned_by};
pub use resolution::{DefenseUsed, HitOutcome};
pub use system::CombatSystem;
