//! NPC behaviour
//!
//! NPCs think on a cooldown polled against world time. Thinking never
//! acts directly; it queues intents that the game runs through the same
//! handlers players use.

use tracing::debug;

use crate::components::{CombatStats, Npc, Posture, WeaponCategory};
use crate::core::config::NpcConfig;
use crate::core::types::EntityId;
use crate::combat::action::{AttackMove, CombatAction, TargetRef};
use crate::combat::context::{posture_of, roundtime_remaining};
use crate::combat::dice::{Dice, SeededDice};
use crate::combat::engagement::tier_between;
use crate::combat::reload::find_ammo;
use crate::combat::targeting::same_room;
use crate::ecs::{ComponentKind, Engine, EngineExt};
use crate::inventory::weapon_of;
use crate::messaging::{Message, MessageSink};
use crate::systems::System;

#[derive(Debug, Clone, PartialEq)]
pub enum NpcIntent {
    Stand { npc: EntityId },
    Combat { npc: EntityId, action: CombatAction },
}

pub struct NpcAiSystem {
    config: NpcConfig,
    dice: SeededDice,
    intents: Vec<NpcIntent>,
}

impl NpcAiSystem {
    pub fn new(config: NpcConfig, seed: u64) -> Self {
        Self {
            config,
            dice: SeededDice::new(seed),
            intents: Vec::new(),
        }
    }

    /// Intents queued since the last call
    pub fn take_intents(&mut self) -> Vec<NpcIntent> {
        std::mem::take(&mut self.intents)
    }

    fn bark(&mut self, engine: &mut dyn Engine, sink: &mut dyn MessageSink, id: &EntityId, now: f64) {
        let Some(npc) = engine.component_mut::<Npc>(id) else {
            return;
        };
        if npc.barks.is_empty() || now < npc.next_bark_at {
            return;
        }
        let first = npc.next_bark_at == 0.0;
        npc.next_bark_at = now + self.config.bark_interval as f64;
        if first {
            return;
        }
        let line = npc.barks[self.dice.pick(npc.barks.len()).min(npc.barks.len() - 1)].clone();
        if let Some(room) = engine.position_of(id) {
            let name = engine.name_of(id);
            sink.broadcast(room, &[], Message::info(format!("{} {}", name, line)));
        }
    }

    /// Someone worth fighting: the current target if still valid, else
    /// (for aggressive NPCs) the first player standing in the room
    fn choose_target(engine: &dyn Engine, id: &EntityId, npc: &Npc) -> Option<EntityId> {
        let stats = engine.component::<CombatStats>(id)?;
        let valid = |other: &EntityId| {
            same_room(engine, id, other)
                && engine
                    .component::<CombatStats>(other)
                    .map(|s| !s.is_down())
                    .unwrap_or(false)
        };
        if let Some(current) = stats.target_id.as_ref().filter(|&t| valid(t)) {
            return Some(current.clone());
        }
        if !npc.aggressive {
            return None;
        }
        let here = engine.position_of(id)?;
        engine
            .entities_at(here)
            .into_iter()
            .filter(|other| other != id)
            .find(|other| engine.has_component(other, ComponentKind::Player) && valid(other))
    }

    /// The next combat step against `target`
    fn plan(engine: &dyn Engine, id: &EntityId, target: &EntityId) -> CombatAction {
        let tier = tier_between(engine, id, target);
        let at = TargetRef::Id(target.clone());
        let strike = |attack_move| CombatAction::Attack {
            target: at.clone(),
            attack_move,
        };

        match weapon_of(engine, id).map(|(_, w)| w.clone()) {
            Some(w) if !w.is_melee() && w.current_ammo > 0 => strike(None),
            Some(w) if !w.is_melee() => {
                if find_ammo(engine, id).is_some() {
                    CombatAction::Reload
                } else if tier.is_close() {
                    strike(Some(AttackMove::Punch))
                } else {
                    CombatAction::Advance { target: at.clone() }
                }
            }
            Some(w) if w.category == WeaponCategory::Polearm && tier.is_engaged() => strike(None),
            _ if tier.is_close() => strike(None),
            _ => CombatAction::Advance { target: at.clone() },
        }
    }

    fn think(&mut self, engine: &mut dyn Engine, id: &EntityId, npc: &Npc) {
        if roundtime_remaining(engine, id).is_some() {
            return;
        }
        if posture_of(engine, id) != Posture::Standing {
            self.intents.push(NpcIntent::Stand { npc: id.clone() });
            return;
        }
        let Some(target) = Self::choose_target(engine, id, npc) else {
            return;
        };
        if let Some(stats) = engine.component_mut::<CombatStats>(id) {
            if npc.aggressive {
                stats.is_hostile = true;
            }
            if stats.target_id.as_ref() != Some(&target) {
                // a new opponent starts out of reach
                stats.disengage();
                stats.target_id = Some(target.clone());
            }
        }
        let action = Self::plan(engine, id, &target);
        debug!(npc = %id, target = %target, action = action.label(), "npc intent");
        self.intents.push(NpcIntent::Combat {
            npc: id.clone(),
            action,
        });
    }
}

impl System for NpcAiSystem {
    fn name(&self) -> &'static str {
        "npc_ai"
    }

    fn update(&mut self, engine: &mut dyn Engine, sink: &mut dyn MessageSink, _dt: f32) {
        let now = engine.elapsed();
        for id in engine.entities_with_component(ComponentKind::Npc) {
            self.bark(engine, sink, &id, now);

            let alive = engine
                .component::<CombatStats>(&id)
                .map(|s| !s.is_down())
                .unwrap_or(false);
            let Some(npc) = engine.component::<Npc>(&id).cloned() else {
                continue;
            };
            if !alive || now < npc.next_think_at {
                continue;
            }
            if let Some(state) = engine.component_mut::<Npc>(&id) {
                state.next_think_at = now + self.config.think_interval as f64;
            }
            self.think(engine, &id, &npc);
        }
    }
}
