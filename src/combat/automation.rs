//! Automation and regeneration
//!
//! Automated actions wait for the entity's roundtime to clear and are
//! then handed back to the combat facade to run like any typed command.

use std::collections::VecDeque;

use ahash::AHashMap;

use crate::components::{CombatStats, EngagementTier};
use crate::core::config::RegenConfig;
use crate::core::types::EntityId;
use crate::combat::action::CombatAction;
use crate::combat::context::roundtime_remaining;
use crate::ecs::{ComponentKind, Engine, EngineExt};

#[derive(Debug, Clone, PartialEq)]
enum Routine {
    Repeat(CombatAction),
    Sequence(VecDeque<CombatAction>),
}

/// An action that is due this tick
#[derive(Debug, Clone, PartialEq)]
pub struct DueAction {
    pub actor: EntityId,
    pub action: CombatAction,
    /// Last step of a buffered sequence
    pub finishes_sequence: bool,
}

#[derive(Debug, Default)]
pub struct AutomationManager {
    routines: AHashMap<EntityId, Routine>,
    buffers: AHashMap<EntityId, Vec<CombatAction>>,
    regen_elapsed: f32,
}

impl AutomationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repeat `action` until stopped. Replaces any running routine.
    pub fn automate(&mut self, actor: &EntityId, action: CombatAction) {
        self.routines.insert(actor.clone(), Routine::Repeat(action));
    }

    pub fn set_buffer(&mut self, actor: &EntityId, actions: Vec<CombatAction>) {
        self.buffers.insert(actor.clone(), actions);
    }

    pub fn buffer(&self, actor: &EntityId) -> &[CombatAction] {
        self.buffers.get(actor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Queue the stored buffer. False if there is nothing stored.
    pub fn start_buffer(&mut self, actor: &EntityId) -> bool {
        let steps: VecDeque<CombatAction> = self.buffer(actor).iter().cloned().collect();
        if steps.is_empty() {
            return false;
        }
        self.routines.insert(actor.clone(), Routine::Sequence(steps));
        true
    }

    /// Clear the queue. True if something was running.
    pub fn stop(&mut self, actor: &EntityId) -> bool {
        self.routines.remove(actor).is_some()
    }

    pub fn is_automated(&self, actor: &EntityId) -> bool {
        self.routines.contains_key(actor)
    }

    /// Drop all state for an entity that left the world
    pub fn forget(&mut self, actor: &EntityId) {
        self.routines.remove(actor);
        self.buffers.remove(actor);
    }

    /// Actions whose roundtime has cleared, in stable id order. Routines
    /// of missing or downed entities are dropped.
    pub fn take_due(&mut self, engine: &dyn Engine) -> Vec<DueAction> {
        let mut actors: Vec<EntityId> = self.routines.keys().cloned().collect();
        actors.sort();

        let mut due = Vec::new();
        for actor in actors {
            let alive = engine
                .component::<CombatStats>(&actor)
                .map(|s| !s.is_down())
                .unwrap_or(false);
            if !alive {
                self.routines.remove(&actor);
                continue;
            }
            if roundtime_remaining(engine, &actor).is_some() {
                continue;
            }

            let Some(routine) = self.routines.get_mut(&actor) else {
                continue;
            };
            match routine {
                Routine::Repeat(action) => due.push(DueAction {
                    actor,
                    action: action.clone(),
                    finishes_sequence: false,
                }),
                Routine::Sequence(steps) => {
                    let Some(action) = steps.pop_front() else {
                        self.routines.remove(&actor);
                        continue;
                    };
                    let finishes_sequence = steps.is_empty();
                    if finishes_sequence {
                        self.routines.remove(&actor);
                    }
                    due.push(DueAction {
                        actor,
                        action,
                        finishes_sequence,
                    });
                }
            }
        }
        due
    }

    /// Passive recovery on the configured cadence. Returns how many
    /// regeneration pulses ran.
    pub fn regenerate(&mut self, engine: &mut dyn Engine, regen: &RegenConfig, dt: f32) -> u32 {
        self.regen_elapsed += dt;
        let mut pulses = 0;
        while self.regen_elapsed >= regen.interval {
            self.regen_elapsed -= regen.interval;
            pulses += 1;
            for id in engine.entities_with_component(ComponentKind::CombatStats) {
                if let Some(stats) = engine.component_mut::<CombatStats>(&id) {
                    stats.recover_balance(regen.balance);
                    stats.recover_fatigue(regen.fatigue);
                    if stats.engagement_tier == EngagementTier::Disengaged {
                        stats.heal(regen.hp);
                    }
                }
            }
        }
        pulses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Roundtime;
    use crate::combat::action::TargetRef;
    use crate::ecs::{Entity, World};

    fn world_with(id: &str) -> (World, EntityId) {
        let mut world = World::new();
        let id = EntityId::from(id);
        world
            .add_entity(Entity::new(id.clone()).with(CombatStats::new(20, 5, 5)))
            .unwrap();
        (world, id)
    }

    #[test]
    fn test_repeat_waits_for_roundtime() {
        let (mut world, id) = world_with("a");
        let mut manager = AutomationManager::new();
        manager.automate(&id, CombatAction::Reload);

        world.insert(&id, Roundtime::new(1.0)).unwrap();
        assert!(manager.take_due(&world).is_empty());

        world.remove::<Roundtime>(&id);
        let due = manager.take_due(&world);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].action, CombatAction::Reload);
        assert!(manager.is_automated(&id));
    }

    #[test]
    fn test_sequence_runs_in_order_then_ends() {
        let (world, id) = world_with("a");
        let mut manager = AutomationManager::new();
        assert!(!manager.start_buffer(&id));

        manager.set_buffer(
            &id,
            vec![
                CombatAction::Advance {
                    target: TargetRef::Current,
                },
                CombatAction::Reload,
            ],
        );
        assert!(manager.start_buffer(&id));

        let first = manager.take_due(&world);
        assert!(matches!(first[0].action, CombatAction::Advance { .. }));
        assert!(!first[0].finishes_sequence);
        let second = manager.take_due(&world);
        assert_eq!(second[0].action, CombatAction::Reload);
        assert!(second[0].finishes_sequence);
        assert!(!manager.is_automated(&id));
        // the buffer survives for another run
        assert_eq!(manager.buffer(&id).len(), 2);
    }

    #[test]
    fn test_downed_entities_dropped() {
        let (mut world, id) = world_with("a");
        let mut manager = AutomationManager::new();
        manager.automate(&id, CombatAction::Reload);
        world.component_mut::<CombatStats>(&id).unwrap().hp = 0;
        assert!(manager.take_due(&world).is_empty());
        assert!(!manager.is_automated(&id));
    }

    #[test]
    fn test_regeneration_cadence() {
        let (mut world, id) = world_with("a");
        {
            let stats = world.component_mut::<CombatStats>(&id).unwrap();
            stats.balance = 0.5;
            stats.fatigue = 50.0;
            stats.hp = 10;
        }
        let regen = RegenConfig::default();
        let mut manager = AutomationManager::new();

        assert_eq!(manager.regenerate(&mut world, &regen, regen.interval / 2.0), 0);
        assert_eq!(manager.regenerate(&mut world, &regen, regen.interval / 2.0), 1);

        let stats = world.component::<CombatStats>(&id).unwrap();
        assert!(stats.balance > 0.5);
        assert!(stats.fatigue < 50.0);
        assert_eq!(stats.hp, 10 + regen.hp);
    }
}
