//! Standing, sitting and lying down

use crate::components::{CombatStats, Posture, Stance};
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::combat::context::{apply_roundtime, posture_of};
use crate::combat::{ensure_ready, ActionOutcome};
use crate::ecs::{Engine, EngineExt};
use crate::messaging::{Message, MessageSink};
use crate::systems::System;

#[derive(Debug)]
pub struct PostureSystem {
    /// Seconds a posture change costs
    roundtime: f32,
}

impl PostureSystem {
    pub fn new(roundtime: f32) -> Self {
        Self { roundtime }
    }

    pub fn handle_stand(
        &self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.change(engine, sink, actor, Posture::Standing)
    }

    pub fn handle_sit(
        &self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.change(engine, sink, actor, Posture::Sitting)
    }

    pub fn handle_lie(
        &self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.change(engine, sink, actor, Posture::Lying)
    }

    /// Shared path for every posture verb
    pub fn change(
        &self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
        posture: Posture,
    ) -> Result<ActionOutcome> {
        if !ensure_ready(engine, sink, actor) {
            return Ok(ActionOutcome::Rejected);
        }
        let current = posture_of(engine, actor);
        if current == posture {
            sink.send(actor, Message::error(format!("You are already {}.", posture.name())));
            return Ok(ActionOutcome::Rejected);
        }
        let down = engine
            .component::<CombatStats>(actor)
            .map(CombatStats::is_down)
            .unwrap_or(false);
        if down && posture != Posture::Lying {
            sink.send(actor, Message::error("You are too badly hurt to get up."));
            return Ok(ActionOutcome::Rejected);
        }

        engine.insert(actor, Stance { current: posture })?;
        apply_roundtime(engine, actor, self.roundtime)?;

        let (you, they) = match posture {
            Posture::Standing => ("You stand up.", "stands up"),
            Posture::Sitting => ("You sit down.", "sits down"),
            Posture::Lying => ("You lie down.", "lies down"),
        };
        sink.send(actor, Message::success(you));
        if let Some(room) = engine.position_of(actor) {
            let name = engine.name_of(actor);
            sink.broadcast(room, &[actor.clone()], Message::info(format!("{} {}.", name, they)));
        }
        Ok(ActionOutcome::Performed)
    }
}

impl System for PostureSystem {
    fn name(&self) -> &'static str {
        "posture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Roundtime;
    use crate::ecs::{Entity, World};
    use crate::messaging::Outbox;

    #[test]
    fn test_sit_then_stand() {
        let mut world = World::new();
        let id = EntityId::from("a");
        world.add_entity(Entity::new(id.clone())).unwrap();
        let mut outbox = Outbox::new();
        let postures = PostureSystem::new(0.0);

        assert!(postures.handle_sit(&mut world, &mut outbox, &id).unwrap().performed());
        assert_eq!(posture_of(&world, &id), Posture::Sitting);
        assert!(!postures.handle_sit(&mut world, &mut outbox, &id).unwrap().performed());
        assert!(postures.handle_stand(&mut world, &mut outbox, &id).unwrap().performed());
        assert_eq!(posture_of(&world, &id), Posture::Standing);
    }

    #[test]
    fn test_posture_change_costs_roundtime() {
        let mut world = World::new();
        let id = EntityId::from("a");
        world.add_entity(Entity::new(id.clone())).unwrap();
        let mut outbox = Outbox::new();
        let postures = PostureSystem::new(1.0);

        postures.handle_lie(&mut world, &mut outbox, &id).unwrap();
        assert!(world.component::<Roundtime>(&id).is_some());
        let outcome = postures.handle_stand(&mut world, &mut outbox, &id).unwrap();
        assert_eq!(outcome, ActionOutcome::Rejected);
        assert_eq!(posture_of(&world, &id), Posture::Lying);
    }

    #[test]
    fn test_downed_cannot_stand() {
        let mut world = World::new();
        let id = EntityId::from("a");
        let mut stats = CombatStats::new(10, 1, 1);
        stats.hp = 0;
        world
            .add_entity(
                Entity::new(id.clone())
                    .with(stats)
                    .with(Stance { current: Posture::Lying }),
            )
            .unwrap();
        let mut outbox = Outbox::new();
        let outcome = PostureSystem::new(0.0)
            .handle_stand(&mut world, &mut outbox, &id)
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Rejected);
    }
}
