//! Maneuvering: advance, retreat, close, withdraw, flee

use tracing::debug;

use crate::components::{CombatStats, EngagementTier, Posture};
use crate::core::error::Result;
use crate::core::types::{Direction, EntityId};
use crate::combat::action::{ActionOutcome, TargetRef};
use crate::combat::context::{
    apply_roundtime, ensure_ready, footwork_level, posture_of, CombatContext,
};
use crate::combat::engagement::{change_room, engaged_opponents, set_engagement, tier_between};
use crate::combat::targeting::{resolve_target, same_room};
use crate::ecs::{Engine, EngineExt};
use crate::messaging::Message;

/// Penalty to a retreat roll when breaking all the way out to missile range
const WITHDRAW_PENALTY: f32 = 15.0;

/// The opponent the actor is tracking, if it's still here and standing
pub fn tracked_opponent(engine: &dyn Engine, actor: &EntityId) -> Option<EntityId> {
    let target = engine.component::<CombatStats>(actor)?.target_id.clone()?;
    let alive = engine
        .component::<CombatStats>(&target)
        .map(|s| !s.is_down())
        .unwrap_or(false);
    (alive && same_room(engine, actor, &target)).then_some(target)
}

/// Percent chance to open distance on `opponent`
pub fn retreat_chance(
    stats: &CombatStats,
    opponent: &CombatStats,
    posture: Posture,
    base: f32,
) -> f32 {
    let mut chance = base + stats.evasion as f32 / 2.0 * stats.balance;
    chance -= opponent.aggression * 30.0;
    chance -= stats.fatigue / 4.0;
    if posture != Posture::Standing {
        chance -= 30.0;
    }
    chance.clamp(5.0, 95.0)
}

/// Percent chance to break away from `opponents` engaged combatants
pub fn flee_chance(stats: &CombatStats, opponents: usize, base: f32) -> f32 {
    let chance = base + stats.evasion as f32 / 3.0 - 10.0 * opponents as f32 - stats.fatigue / 4.0;
    chance.clamp(5.0, 95.0)
}

fn maneuver_roundtime(ctx: &CombatContext<'_>, actor: &EntityId) -> f32 {
    ctx.config
        .maneuver_cost
        .for_level(footwork_level(ctx.engine, actor))
}

fn reject_unless_standing(ctx: &mut CombatContext<'_>, actor: &EntityId) -> Result<bool> {
    let stats = ctx.stats(actor)?;
    if stats.is_down() {
        ctx.reject(actor, "You are in no condition to move.")?;
        return Ok(false);
    }
    if posture_of(ctx.engine, actor) != Posture::Standing {
        ctx.reject(actor, "You need to stand up first.")?;
        return Ok(false);
    }
    Ok(true)
}

fn announce(
    ctx: &mut CombatContext<'_>,
    actor: &EntityId,
    opponent: &EntityId,
    to_actor: String,
    to_opponent: String,
    to_room: String,
) {
    ctx.tell(actor, Message::combat(to_actor));
    ctx.tell(opponent, Message::combat(to_opponent));
    if let Some(room) = ctx.engine.position_of(actor) {
        ctx.sink
            .broadcast(room, &[actor.clone(), opponent.clone()], Message::combat(to_room));
    }
}

/// `advance [target]`: one tier closer, up to melee
pub fn handle_advance(
    ctx: &mut CombatContext<'_>,
    actor: &EntityId,
    target: &TargetRef,
) -> Result<ActionOutcome> {
    if !ensure_ready(ctx.engine, ctx.sink, actor) {
        return Ok(ActionOutcome::Rejected);
    }
    if !reject_unless_standing(ctx, actor)? {
        return Ok(ActionOutcome::Rejected);
    }
    let Some(opponent) = resolve_target(ctx.engine, actor, target) else {
        return match target {
            TargetRef::Current => ctx.reject(actor, "Advance on whom?"),
            _ => ctx.reject(actor, "You don't see anyone like that here."),
        };
    };
    let name = ctx.engine.name_of(&opponent);
    if ctx.stats(&opponent)?.is_down() {
        return ctx.reject(actor, format!("{} is already down.", name));
    }

    let tier = tier_between(ctx.engine, actor, &opponent);
    if tier >= EngagementTier::Melee {
        return ctx.reject(actor, format!("You are already {} with {}.", tier.name(), name));
    }
    let next = tier.closer();
    set_engagement(ctx.engine, actor, &opponent, next)?;
    let seconds = maneuver_roundtime(ctx, actor);
    apply_roundtime(ctx.engine, actor, seconds)?;

    let me = ctx.engine.name_of(actor);
    announce(
        ctx,
        actor,
        &opponent,
        format!("You advance on {}. You are now {}.", name, next.name()),
        format!("{} advances on you!", me),
        format!("{} advances on {}.", me, name),
    );
    Ok(ActionOutcome::Performed)
}

/// Contested step away from the tracked opponent, to `destination`
fn contested_step(
    ctx: &mut CombatContext<'_>,
    actor: &EntityId,
    opponent: &EntityId,
    destination: EngagementTier,
    penalty: f32,
) -> Result<bool> {
    let stats = ctx.stats(actor)?;
    let theirs = ctx.stats(opponent)?;
    let chance = retreat_chance(
        &stats,
        &theirs,
        posture_of(ctx.engine, actor),
        ctx.config.retreat_base_chance,
    ) - penalty;
    let roll = ctx.dice.percent();
    debug!(actor = %actor, chance, roll, "retreat roll");

    let seconds = maneuver_roundtime(ctx, actor);
    apply_roundtime(ctx.engine, actor, seconds)?;

    if roll >= chance.max(5.0) {
        return Ok(false);
    }
    set_engagement(ctx.engine, actor, opponent, destination)?;
    if destination == EngagementTier::Disengaged {
        if let Some(mine) = ctx.engine.component_mut::<CombatStats>(actor) {
            mine.disengage();
        }
        if let Some(theirs) = ctx.engine.component_mut::<CombatStats>(opponent) {
            if theirs.target_id.as_ref() == Some(actor) {
                theirs.disengage();
            }
        }
    }
    Ok(true)
}

/// `retreat`: one tier farther, contested
pub fn handle_retreat(ctx: &mut CombatContext<'_>, actor: &EntityId) -> Result<ActionOutcome> {
    if !ensure_ready(ctx.engine, ctx.sink, actor) {
        return Ok(ActionOutcome::Rejected);
    }
    if ctx.stats(actor)?.is_down() {
        return ctx.reject(actor, "You are in no condition to move.");
    }
    let Some(opponent) = tracked_opponent(ctx.engine, actor) else {
        return ctx.reject(actor, "You aren't engaged with anyone.");
    };
    let tier = tier_between(ctx.engine, actor, &opponent);
    if tier == EngagementTier::Disengaged {
        return ctx.reject(actor, "You aren't engaged with anyone.");
    }

    let name = ctx.engine.name_of(&opponent);
    let me = ctx.engine.name_of(actor);
    let next = tier.farther();
    if contested_step(ctx, actor, &opponent, next, 0.0)? {
        announce(
            ctx,
            actor,
            &opponent,
            format!("You back away from {}. You are now {}.", name, next.name()),
            format!("{} backs away from you.", me),
            format!("{} backs away from {}.", me, name),
        );
    } else {
        announce(
            ctx,
            actor,
            &opponent,
            format!("You try to back away, but {} keeps pace with you!", name),
            format!("{} tries to back away, but you keep pace.", me),
            format!("{} tries to back away from {}.", me, name),
        );
    }
    Ok(ActionOutcome::Performed)
}

/// `withdraw`: from any engaged tier straight out to missile range, contested
pub fn handle_withdraw(ctx: &mut CombatContext<'_>, actor: &EntityId) -> Result<ActionOutcome> {
    if !ensure_ready(ctx.engine, ctx.sink, actor) {
        return Ok(ActionOutcome::Rejected);
    }
    if ctx.stats(actor)?.is_down() {
        return ctx.reject(actor, "You are in no condition to move.");
    }
    let Some(opponent) = tracked_opponent(ctx.engine, actor) else {
        return ctx.reject(actor, "You aren't engaged with anyone.");
    };
    let tier = tier_between(ctx.engine, actor, &opponent);
    if !tier.is_engaged() {
        return ctx.reject(actor, "You aren't close enough to need to withdraw.");
    }

    let name = ctx.engine.name_of(&opponent);
    let me = ctx.engine.name_of(actor);
    if contested_step(ctx, actor, &opponent, EngagementTier::Missile, WITHDRAW_PENALTY)? {
        announce(
            ctx,
            actor,
            &opponent,
            format!("You disengage and withdraw from {} to missile range.", name),
            format!("{} withdraws out of reach.", me),
            format!("{} withdraws from {}.", me, name),
        );
    } else {
        announce(
            ctx,
            actor,
            &opponent,
            format!("You try to withdraw, but {} stays on you!", name),
            format!("{} tries to withdraw, but you stay on them.", me),
            format!("{} tries to withdraw from {}.", me, name),
        );
    }
    Ok(ActionOutcome::Performed)
}

/// `close`: from polearm or melee range into close quarters
pub fn handle_close(ctx: &mut CombatContext<'_>, actor: &EntityId) -> Result<ActionOutcome> {
    if !ensure_ready(ctx.engine, ctx.sink, actor) {
        return Ok(ActionOutcome::Rejected);
    }
    if !reject_unless_standing(ctx, actor)? {
        return Ok(ActionOutcome::Rejected);
    }
    let Some(opponent) = tracked_opponent(ctx.engine, actor) else {
        return ctx.reject(actor, "You aren't engaged with anyone.");
    };
    let tier = tier_between(ctx.engine, actor, &opponent);
    match tier {
        EngagementTier::Polearm | EngagementTier::Melee => {}
        EngagementTier::CloseQuarters => {
            return ctx.reject(actor, "You are already in close quarters.");
        }
        _ => return ctx.reject(actor, "You need to advance to polearm or melee range first."),
    }

    set_engagement(ctx.engine, actor, &opponent, EngagementTier::CloseQuarters)?;
    let seconds = maneuver_roundtime(ctx, actor);
    apply_roundtime(ctx.engine, actor, seconds)?;

    let name = ctx.engine.name_of(&opponent);
    let me = ctx.engine.name_of(actor);
    announce(
        ctx,
        actor,
        &opponent,
        format!("You close in on {}, inside their guard.", name),
        format!("{} closes in on you!", me),
        format!("{} closes in on {}.", me, name),
    );
    Ok(ActionOutcome::Performed)
}

/// `flee`: break away into a random adjacent room
pub fn handle_flee(ctx: &mut CombatContext<'_>, actor: &EntityId) -> Result<ActionOutcome> {
    if !ensure_ready(ctx.engine, ctx.sink, actor) {
        return Ok(ActionOutcome::Rejected);
    }
    if !reject_unless_standing(ctx, actor)? {
        return Ok(ActionOutcome::Rejected);
    }
    let Some(here) = ctx.engine.position_of(actor) else {
        return ctx.reject(actor, "There is nowhere to flee.");
    };
    let exits: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|d| ctx.engine.room_exists(here.step(*d)))
        .collect();
    if exits.is_empty() {
        return ctx.reject(actor, "There is nowhere to flee!");
    }

    let mut opponents = engaged_opponents(ctx.engine, actor);
    if let Some(tracked) = tracked_opponent(ctx.engine, actor) {
        if tier_between(ctx.engine, actor, &tracked).is_engaged() && !opponents.contains(&tracked) {
            opponents.push(tracked);
        }
    }

    let stats = ctx.stats(actor)?;
    let chance = flee_chance(&stats, opponents.len(), ctx.config.flee_base_chance);
    let roll = ctx.dice.percent();
    apply_roundtime(ctx.engine, actor, ctx.config.flee_roundtime)?;
    debug!(actor = %actor, chance, roll, opponents = opponents.len(), "flee roll");

    let me = ctx.engine.name_of(actor);
    if roll >= chance {
        ctx.tell(actor, Message::combat("You try to flee, but can't break away!"));
        ctx.sink.broadcast(
            here,
            &[actor.clone()],
            Message::combat(format!("{} tries to flee but can't break away.", me)),
        );
        return Ok(ActionOutcome::Performed);
    }

    let direction = exits[ctx.dice.pick(exits.len()).min(exits.len() - 1)];
    change_room(
        ctx.engine,
        ctx.sink,
        actor,
        here.step(direction),
        &format!("{} flees {}!", me, direction.name()),
        &format!("{} stumbles in, breathing hard.", me),
    )?;
    ctx.tell(actor, Message::combat(format!("You flee {}!", direction.name())));
    Ok(ActionOutcome::Performed)
}
