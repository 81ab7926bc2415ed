//! Shared handler plumbing: the context bundle, rejections and the
//! roundtime gate

use crate::components::{CombatStats, Posture, Roundtime, Skills, Stance, WeaponClass};
use crate::core::config::CombatConfig;
use crate::core::error::{MudError, Result};
use crate::core::types::EntityId;
use crate::combat::action::ActionOutcome;
use crate::combat::dice::Dice;
use crate::content::Prefabs;
use crate::ecs::{ComponentKind, Engine, EngineExt};
use crate::messaging::{Message, MessageSink};

/// Everything a combat handler may touch
pub struct CombatContext<'a> {
    pub engine: &'a mut dyn Engine,
    pub sink: &'a mut dyn MessageSink,
    pub config: &'a CombatConfig,
    pub dice: &'a mut dyn Dice,
    /// Catalog loot and drops are spawned from
    pub prefabs: &'a Prefabs,
}

impl CombatContext<'_> {
    /// Tell the actor why nothing happened
    pub fn reject(&mut self, actor: &EntityId, text: impl Into<String>) -> Result<ActionOutcome> {
        self.sink.send(actor, Message::error(text));
        Ok(ActionOutcome::Rejected)
    }

    pub fn tell(&mut self, actor: &EntityId, message: Message) {
        self.sink.send(actor, message);
    }

    /// Copy of the actor's stats; missing stats is an invariant violation
    pub fn stats(&self, id: &EntityId) -> Result<CombatStats> {
        self.engine
            .component::<CombatStats>(id)
            .cloned()
            .ok_or_else(|| MudError::missing(id, ComponentKind::CombatStats))
    }
}

/// Seconds left on an active roundtime
pub fn roundtime_remaining(engine: &dyn Engine, actor: &EntityId) -> Option<f32> {
    engine
        .component::<Roundtime>(actor)
        .filter(|rt| rt.is_active())
        .map(|rt| rt.remaining)
}

pub fn roundtime_message(remaining: f32) -> String {
    format!("...wait {:.1} more seconds.", remaining)
}

/// The gate every action-initiating handler passes first. Sends exactly
/// one rejection and returns false while roundtime is active.
pub fn ensure_ready(engine: &dyn Engine, sink: &mut dyn MessageSink, actor: &EntityId) -> bool {
    match roundtime_remaining(engine, actor) {
        Some(remaining) => {
            sink.send(actor, Message::error(roundtime_message(remaining)));
            false
        }
        None => true,
    }
}

/// Start a fresh roundtime
pub fn apply_roundtime(engine: &mut dyn Engine, actor: &EntityId, seconds: f32) -> Result<()> {
    if seconds > 0.0 {
        engine.insert(actor, Roundtime::new(seconds))?;
    }
    Ok(())
}

/// Current posture; entities without a `Stance` count as standing
pub fn posture_of(engine: &dyn Engine, id: &EntityId) -> Posture {
    engine
        .component::<Stance>(id)
        .map(|s| s.current)
        .unwrap_or_default()
}

/// Trained level for a weapon class; untrained without `Skills`
pub fn skill_level(engine: &dyn Engine, id: &EntityId, class: WeaponClass) -> u32 {
    engine
        .component::<Skills>(id)
        .map(|s| s.level_for(class))
        .unwrap_or(0)
}

/// Footwork level used by maneuver costs
pub fn footwork_level(engine: &dyn Engine, id: &EntityId) -> u32 {
    engine.component::<Skills>(id).map(|s| s.melee).unwrap_or(0)
}
