//! Engagement tier bookkeeping shared by attack, maneuvers and movement

use tracing::debug;

use crate::components::{CombatStats, EngagementTier};
use crate::core::error::Result;
use crate::core::types::{EntityId, GridPos};
use crate::combat::targeting::same_room;
use crate::ecs::{ComponentKind, Engine, EngineExt};
use crate::messaging::{Message, MessageSink};

/// Tier between `actor` and `target` as either side sees it.
/// The actor's own tracking wins; otherwise the target's view of the
/// actor; otherwise the two are not engaged.
pub fn tier_between(engine: &dyn Engine, actor: &EntityId, target: &EntityId) -> EngagementTier {
    if let Some(mine) = engine.component::<CombatStats>(actor) {
        if mine.target_id.as_ref() == Some(target) {
            return mine.engagement_tier;
        }
    }
    if let Some(theirs) = engine.component::<CombatStats>(target) {
        if theirs.target_id.as_ref() == Some(actor) {
            return theirs.engagement_tier;
        }
    }
    EngagementTier::Disengaged
}

/// Track `target` at `tier`, mirroring onto the target if it tracks the actor
pub fn set_engagement(
    engine: &mut dyn Engine,
    actor: &EntityId,
    target: &EntityId,
    tier: EngagementTier,
) -> Result<()> {
    {
        let stats = engine.require_mut::<CombatStats>(actor)?;
        stats.target_id = Some(target.clone());
        stats.engagement_tier = tier;
    }
    if let Some(theirs) = engine.component_mut::<CombatStats>(target) {
        if theirs.target_id.as_ref() == Some(actor) {
            theirs.engagement_tier = tier;
        }
    }
    debug!(actor = %actor, target = %target, ?tier, "engagement changed");
    Ok(())
}

/// A defender with nobody in reach turns to face whoever struck it
pub fn answer_attacker(
    engine: &mut dyn Engine,
    defender: &EntityId,
    attacker: &EntityId,
    tier: EngagementTier,
) {
    let current = engine
        .component::<CombatStats>(defender)
        .and_then(|s| s.target_id.clone());
    let busy = current
        .filter(|t| t != attacker)
        .map(|t| same_room(engine, defender, &t))
        .unwrap_or(false);
    if busy {
        return;
    }
    if let Some(stats) = engine.component_mut::<CombatStats>(defender) {
        stats.target_id = Some(attacker.clone());
        stats.engagement_tier = tier;
    }
}

/// Is `actor` held in place by an opponent? Returns that opponent.
///
/// Pinned means: tracking a live target in the same room at an engaged
/// tier, where the target is hostile or is tracking the actor back.
pub fn pinned_by(engine: &dyn Engine, actor: &EntityId) -> Option<EntityId> {
    let stats = engine.component::<CombatStats>(actor)?;
    if !stats.engagement_tier.is_engaged() {
        return None;
    }
    let target = stats.target_id.as_ref()?;
    let theirs = engine.component::<CombatStats>(target)?;
    if theirs.is_down() || !same_room(engine, actor, target) {
        return None;
    }
    let hostile = theirs.is_hostile || theirs.target_id.as_ref() == Some(actor);
    hostile.then(|| target.clone())
}

/// Opponents in the room engaged with `actor`
pub fn engaged_opponents(engine: &dyn Engine, actor: &EntityId) -> Vec<EntityId> {
    let Some(pos) = engine.position_of(actor) else {
        return Vec::new();
    };
    engine
        .entities_at(pos)
        .into_iter()
        .filter(|id| id != actor)
        .filter(|id| {
            engine
                .component::<CombatStats>(id)
                .map(|s| {
                    !s.is_down()
                        && s.target_id.as_ref() == Some(actor)
                        && s.engagement_tier.is_engaged()
                })
                .unwrap_or(false)
        })
        .collect()
}

/// Every combatant tracking `id` forgets it
pub fn release_trackers(engine: &mut dyn Engine, id: &EntityId) {
    for other in engine.entities_with_component(ComponentKind::CombatStats) {
        if let Some(stats) = engine.component_mut::<CombatStats>(&other) {
            if stats.target_id.as_ref() == Some(id) {
                stats.disengage();
            }
        }
    }
}

/// Move `actor` to `dest`. Leaving a room always ends the actor's
/// engagement, and anyone left behind stops tracking it.
pub fn change_room(
    engine: &mut dyn Engine,
    sink: &mut dyn MessageSink,
    actor: &EntityId,
    dest: GridPos,
    departure: &str,
    arrival: &str,
) -> Result<()> {
    let origin = engine.position_of(actor);
    let exclude = [actor.clone()];

    if let Some(stats) = engine.component_mut::<CombatStats>(actor) {
        stats.disengage();
    }
    release_trackers(engine, actor);

    if let Some(origin) = origin {
        sink.broadcast(origin, &exclude, Message::info(departure));
    }
    engine.place(actor, dest)?;
    sink.broadcast(dest, &exclude, Message::info(arrival));
    debug!(actor = %actor, ?origin, dest = %dest, "changed room");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Position;
    use crate::ecs::{Entity, World};
    use crate::messaging::Outbox;

    fn combatant(world: &mut World, id: &str, x: i32) -> EntityId {
        let id = EntityId::from(id);
        world
            .add_entity(
                Entity::new(id.clone())
                    .with(Position::new(x, 0))
                    .with(CombatStats::new(20, 5, 5)),
            )
            .unwrap();
        id
    }

    #[test]
    fn test_tier_between_prefers_actor_view() {
        let mut world = World::new();
        let a = combatant(&mut world, "a", 0);
        let b = combatant(&mut world, "b", 0);
        assert_eq!(tier_between(&world, &a, &b), EngagementTier::Disengaged);

        set_engagement(&mut world, &b, &a, EngagementTier::Polearm).unwrap();
        assert_eq!(tier_between(&world, &a, &b), EngagementTier::Polearm);

        set_engagement(&mut world, &a, &b, EngagementTier::Melee).unwrap();
        assert_eq!(tier_between(&world, &a, &b), EngagementTier::Melee);
        // b tracks a, so the change mirrored
        assert_eq!(
            world.component::<CombatStats>(&b).unwrap().engagement_tier,
            EngagementTier::Melee
        );
    }

    #[test]
    fn test_pinned_needs_hostile_and_engaged() {
        let mut world = World::new();
        let a = combatant(&mut world, "a", 0);
        let b = combatant(&mut world, "b", 0);
        set_engagement(&mut world, &a, &b, EngagementTier::Missile).unwrap();
        world.component_mut::<CombatStats>(&b).unwrap().is_hostile = true;
        assert_eq!(pinned_by(&world, &a), None);

        set_engagement(&mut world, &a, &b, EngagementTier::Melee).unwrap();
        assert_eq!(pinned_by(&world, &a), Some(b.clone()));

        world.component_mut::<CombatStats>(&b).unwrap().hp = 0;
        assert_eq!(pinned_by(&world, &a), None);
    }

    #[test]
    fn test_change_room_resets_engagement() {
        let mut world = World::new();
        let a = combatant(&mut world, "a", 0);
        let b = combatant(&mut world, "b", 0);
        set_engagement(&mut world, &a, &b, EngagementTier::CloseQuarters).unwrap();
        set_engagement(&mut world, &b, &a, EngagementTier::CloseQuarters).unwrap();

        let mut outbox = Outbox::new();
        change_room(&mut world, &mut outbox, &a, GridPos::new(1, 0), "a leaves.", "a arrives.")
            .unwrap();

        let mine = world.component::<CombatStats>(&a).unwrap();
        assert_eq!(mine.engagement_tier, EngagementTier::Disengaged);
        assert!(mine.target_id.is_none());
        assert!(world.component::<CombatStats>(&b).unwrap().target_id.is_none());
        assert_eq!(world.position_of(&a), Some(GridPos::new(1, 0)));
        assert_eq!(outbox.room_messages(GridPos::new(0, 0)).len(), 1);
    }

    #[test]
    fn test_answer_attacker_keeps_existing_fight() {
        let mut world = World::new();
        let a = combatant(&mut world, "a", 0);
        let b = combatant(&mut world, "b", 0);
        let c = combatant(&mut world, "c", 0);
        set_engagement(&mut world, &b, &c, EngagementTier::Melee).unwrap();

        answer_attacker(&mut world, &b, &a, EngagementTier::Missile);
        assert_eq!(world.component::<CombatStats>(&b).unwrap().target_id, Some(c));

        answer_attacker(&mut world, &a, &b, EngagementTier::Missile);
        assert_eq!(world.component::<CombatStats>(&a).unwrap().target_id, Some(b));
    }
}
