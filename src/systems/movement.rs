//! Walking between rooms, and what a room looks like on arrival

use crate::components::{CombatStats, Identity, Item, Portal, Posture};
use crate::core::error::Result;
use crate::core::types::{Direction, EntityId};
use crate::combat::context::posture_of;
use crate::combat::{change_room, ensure_ready, pinned_by, ActionOutcome};
use crate::ecs::{Engine, EngineExt};
use crate::messaging::{Message, MessageSink};
use crate::systems::System;

/// Send the actor the description of the room it stands in
pub fn describe_room(engine: &dyn Engine, sink: &mut dyn MessageSink, actor: &EntityId) {
    let Some(here) = engine.position_of(actor) else {
        sink.send(actor, Message::info("You are nowhere at all."));
        return;
    };

    let mut lines = vec![
        format!("[{}]", engine.room_name(here).unwrap_or("Somewhere")),
        engine.room_description(here).unwrap_or_default().to_string(),
    ];

    let exits: Vec<&str> = Direction::ALL
        .into_iter()
        .filter(|d| engine.room_exists(here.step(*d)))
        .map(Direction::name)
        .collect();
    if exits.is_empty() {
        lines.push("Obvious exits: none.".to_string());
    } else {
        lines.push(format!("Obvious exits: {}.", exits.join(", ")));
    }

    let mut people = Vec::new();
    let mut things = Vec::new();
    for id in engine.entities_at(here) {
        if &id == actor {
            continue;
        }
        if let Some(portal) = engine.component::<Portal>(&id) {
            things.push(portal.name.clone());
        } else if engine.component::<CombatStats>(&id).is_some() {
            let name = engine.name_of(&id);
            match posture_of(engine, &id) {
                Posture::Standing => people.push(name),
                posture => people.push(format!("{} ({})", name, posture.name())),
            }
        } else if let Some(item) = engine.component::<Item>(&id) {
            things.push(item.name.clone());
        } else if let Some(ident) = engine.component::<Identity>(&id) {
            things.push(ident.name.clone());
        }
    }
    if !people.is_empty() {
        lines.push(format!("Also here: {}.", people.join(", ")));
    }
    if !things.is_empty() {
        lines.push(format!("You see: {}.", things.join(", ")));
    }

    sink.send(actor, Message::info(lines.join("\n")));
}

/// Room-to-room movement
#[derive(Debug, Default)]
pub struct MovementSystem;

impl MovementSystem {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_move(
        &self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
        direction: Direction,
    ) -> Result<ActionOutcome> {
        if !ensure_ready(engine, sink, actor) {
            return Ok(ActionOutcome::Rejected);
        }
        if posture_of(engine, actor) != Posture::Standing {
            sink.send(actor, Message::error("You need to stand up first."));
            return Ok(ActionOutcome::Rejected);
        }
        if let Some(opponent) = pinned_by(engine, actor) {
            let name = engine.name_of(&opponent);
            sink.send(
                actor,
                Message::error(format!(
                    "You can't just walk away from {}! Retreat or flee.",
                    name
                )),
            );
            return Ok(ActionOutcome::Rejected);
        }
        let Some(here) = engine.position_of(actor) else {
            sink.send(actor, Message::error("You can't go that way."));
            return Ok(ActionOutcome::Rejected);
        };
        let dest = here.step(direction);
        if !engine.room_exists(dest) {
            sink.send(actor, Message::error("You can't go that way."));
            return Ok(ActionOutcome::Rejected);
        }

        let name = engine.name_of(actor);
        change_room(
            engine,
            sink,
            actor,
            dest,
            &format!("{} leaves {}.", name, direction.name()),
            &format!("{} arrives.", name),
        )?;
        describe_room(engine, sink, actor);
        Ok(ActionOutcome::Performed)
    }
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EngagementTier, Position, Roundtime, Stance};
    use crate::core::types::GridPos;
    use crate::combat::engagement::set_engagement;
    use crate::ecs::{Entity, World};
    use crate::messaging::Outbox;

    fn setup() -> (World, EntityId, EntityId) {
        let mut world = World::new();
        world.add_room(GridPos::new(0, 0), "Yard", "A muddy yard.");
        world.add_room(GridPos::new(0, 1), "Gate", "A sagging gate.");
        let me = EntityId::from("me");
        let foe = EntityId::from("foe");
        world
            .add_entity(
                Entity::new(me.clone())
                    .with(Identity::new("Ayla"))
                    .with(Position::new(0, 0))
                    .with(CombatStats::new(20, 5, 5)),
            )
            .unwrap();
        world
            .add_entity(
                Entity::new(foe.clone())
                    .with(Identity::new("goblin"))
                    .with(Position::new(0, 0))
                    .with(CombatStats::new(20, 5, 5).hostile()),
            )
            .unwrap();
        (world, me, foe)
    }

    #[test]
    fn test_walk_north() {
        let (mut world, me, _) = setup();
        let mut outbox = Outbox::new();
        let outcome = MovementSystem::new()
            .handle_move(&mut world, &mut outbox, &me, Direction::North)
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Performed);
        assert_eq!(world.position_of(&me), Some(GridPos::new(0, 1)));
        assert!(outbox.messages_for(&me)[0].text.contains("[Gate]"));
    }

    #[test]
    fn test_no_exit() {
        let (mut world, me, _) = setup();
        let mut outbox = Outbox::new();
        let outcome = MovementSystem::new()
            .handle_move(&mut world, &mut outbox, &me, Direction::East)
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Rejected);
        assert_eq!(world.position_of(&me), Some(GridPos::new(0, 0)));
    }

    #[test]
    fn test_pinned_in_melee() {
        let (mut world, me, foe) = setup();
        set_engagement(&mut world, &me, &foe, EngagementTier::Melee).unwrap();
        let mut outbox = Outbox::new();
        let outcome = MovementSystem::new()
            .handle_move(&mut world, &mut outbox, &me, Direction::North)
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Rejected);
        assert_eq!(world.position_of(&me), Some(GridPos::new(0, 0)));
    }

    #[test]
    fn test_ranged_engagement_resets_on_leaving() {
        let (mut world, me, foe) = setup();
        set_engagement(&mut world, &me, &foe, EngagementTier::Missile).unwrap();
        let mut outbox = Outbox::new();
        MovementSystem::new()
            .handle_move(&mut world, &mut outbox, &me, Direction::North)
            .unwrap();
        let stats = world.component::<CombatStats>(&me).unwrap();
        assert_eq!(stats.engagement_tier, EngagementTier::Disengaged);
        assert!(stats.target_id.is_none());
    }

    #[test]
    fn test_gated_by_roundtime_and_posture() {
        let (mut world, me, _) = setup();
        let mut outbox = Outbox::new();
        let movement = MovementSystem::new();

        world.insert(&me, Roundtime::new(2.0)).unwrap();
        assert_eq!(
            movement.handle_move(&mut world, &mut outbox, &me, Direction::North).unwrap(),
            ActionOutcome::Rejected
        );
        world.remove::<Roundtime>(&me);

        world.insert(&me, Stance { current: Posture::Sitting }).unwrap();
        assert_eq!(
            movement.handle_move(&mut world, &mut outbox, &me, Direction::North).unwrap(),
            ActionOutcome::Rejected
        );
    }
}
