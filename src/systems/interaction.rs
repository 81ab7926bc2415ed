//! Portals: named exits that lead somewhere other than a compass step

use tracing::warn;

use crate::components::{Identity, Portal, Posture};
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::combat::context::posture_of;
use crate::combat::{change_room, ensure_ready, pinned_by, ActionOutcome};
use crate::ecs::{Engine, EngineExt};
use crate::messaging::{Message, MessageSink};
use crate::systems::movement::describe_room;
use crate::systems::System;

#[derive(Debug, Default)]
pub struct InteractionSystem;

impl InteractionSystem {
    pub fn new() -> Self {
        Self
    }

    /// Portal in the actor's room whose name or keywords match `word`
    pub fn find_portal(engine: &dyn Engine, actor: &EntityId, word: &str) -> Option<EntityId> {
        let here = engine.position_of(actor)?;
        let word = word.trim().to_lowercase();
        engine.entities_at(here).into_iter().find(|id| {
            let Some(portal) = engine.component::<Portal>(id) else {
                return false;
            };
            portal.name.to_lowercase().split_whitespace().any(|w| w.starts_with(&word))
                || engine
                    .component::<Identity>(id)
                    .map(|i| i.matches(&word))
                    .unwrap_or(false)
        })
    }

    /// `enter <portal>`
    pub fn handle_enter(
        &self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
        portal_name: &str,
    ) -> Result<ActionOutcome> {
        if !ensure_ready(engine, sink, actor) {
            return Ok(ActionOutcome::Rejected);
        }
        if portal_name.trim().is_empty() {
            sink.send(actor, Message::error("Enter what?"));
            return Ok(ActionOutcome::Rejected);
        }
        let Some(portal_id) = Self::find_portal(engine, actor, portal_name) else {
            sink.send(actor, Message::error("You don't see that here."));
            return Ok(ActionOutcome::Rejected);
        };
        if posture_of(engine, actor) != Posture::Standing {
            sink.send(actor, Message::error("You need to stand up first."));
            return Ok(ActionOutcome::Rejected);
        }
        if let Some(opponent) = pinned_by(engine, actor) {
            let name = engine.name_of(&opponent);
            sink.send(
                actor,
                Message::error(format!("You can't slip away while {} is on you!", name)),
            );
            return Ok(ActionOutcome::Rejected);
        }

        let Some(portal) = engine.component::<Portal>(&portal_id).cloned() else {
            return Ok(ActionOutcome::Rejected);
        };
        if !engine.room_exists(portal.destination) {
            warn!(portal = %portal_id, dest = %portal.destination, "portal leads nowhere");
            sink.send(actor, Message::system("Something went wrong."));
            return Ok(ActionOutcome::Rejected);
        }

        let name = engine.name_of(actor);
        change_room(
            engine,
            sink,
            actor,
            portal.destination,
            &format!("{} enters the {}.", name, portal.name),
            &format!("{} arrives.", name),
        )?;
        describe_room(engine, sink, actor);
        Ok(ActionOutcome::Performed)
    }
}

impl System for InteractionSystem {
    fn name(&self) -> &'static str {
        "interaction"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{CombatStats, EngagementTier, Position};
    use crate::core::types::GridPos;
    use crate::combat::engagement::set_engagement;
    use crate::ecs::{Entity, World};
    use crate::messaging::Outbox;

    fn setup() -> (World, EntityId) {
        let mut world = World::new();
        world.add_room(GridPos::new(0, 0), "Street", "A narrow street.");
        world.add_room(GridPos::new(10, 10), "Tavern", "A smoky tavern.");
        world
            .add_entity(
                Entity::new(EntityId::from("door"))
                    .with(Position::new(0, 0))
                    .with(Portal {
                        name: "tavern door".into(),
                        destination: GridPos::new(10, 10),
                    }),
            )
            .unwrap();
        let me = EntityId::from("me");
        world
            .add_entity(
                Entity::new(me.clone())
                    .with(Position::new(0, 0))
                    .with(CombatStats::new(20, 5, 5)),
            )
            .unwrap();
        (world, me)
    }

    #[test]
    fn test_enter_portal() {
        let (mut world, me) = setup();
        let mut outbox = Outbox::new();
        let outcome = InteractionSystem::new()
            .handle_enter(&mut world, &mut outbox, &me, "door")
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Performed);
        assert_eq!(world.position_of(&me), Some(GridPos::new(10, 10)));
    }

    #[test]
    fn test_engaged_cannot_enter() {
        let (mut world, me) = setup();
        let foe = EntityId::from("foe");
        world
            .add_entity(
                Entity::new(foe.clone())
                    .with(Position::new(0, 0))
                    .with(CombatStats::new(20, 5, 5).hostile()),
            )
            .unwrap();
        set_engagement(&mut world, &me, &foe, EngagementTier::Polearm).unwrap();

        let mut outbox = Outbox::new();
        let outcome = InteractionSystem::new()
            .handle_enter(&mut world, &mut outbox, &me, "tavern")
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Rejected);
        assert_eq!(world.position_of(&me), Some(GridPos::new(0, 0)));
    }
}
