//! Target selection and reading the fight: target, assess, appraise

use crate::components::{CombatStats, EngagementTier};
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::combat::action::{ActionOutcome, TargetRef, TargetRequest};
use crate::combat::context::CombatContext;
use crate::combat::engagement::tier_between;
use crate::combat::targeting::{combatants_near, resolve_target};
use crate::ecs::EngineExt;
use crate::inventory::weapon_of;
use crate::messaging::Message;

/// Coarse health wording
pub fn condition_word(stats: &CombatStats) -> &'static str {
    if stats.is_down() {
        return "down and out of the fight";
    }
    match stats.health_fraction() {
        f if f >= 1.0 => "in perfect health",
        f if f >= 0.75 => "lightly wounded",
        f if f >= 0.5 => "wounded",
        f if f >= 0.25 => "badly wounded",
        _ => "near death",
    }
}

fn fighting_style(stats: &CombatStats) -> &'static str {
    match stats.aggression {
        a if a >= 0.75 => "aggressively",
        a if a <= 0.3 => "defensively",
        _ => "steadily",
    }
}

/// `target <limb | clear | name>`
pub fn handle_target(
    ctx: &mut CombatContext<'_>,
    actor: &EntityId,
    request: &TargetRequest,
) -> Result<ActionOutcome> {
    match request {
        TargetRequest::Limb(limb) => {
            ctx.engine.require_mut::<CombatStats>(actor)?.target_limb = Some(*limb);
            ctx.tell(
                actor,
                Message::success(format!("You will aim for the {}.", limb.name())),
            );
        }
        TargetRequest::ClearLimb => {
            ctx.engine.require_mut::<CombatStats>(actor)?.target_limb = None;
            ctx.tell(actor, Message::success("You no longer aim for any particular spot."));
        }
        TargetRequest::Combatant(target) => {
            let Some(opponent) = resolve_target(ctx.engine, actor, target) else {
                return ctx.reject(actor, "You don't see anyone like that here.");
            };
            let tier = tier_between(ctx.engine, actor, &opponent);
            let stats = ctx.engine.require_mut::<CombatStats>(actor)?;
            stats.target_id = Some(opponent.clone());
            stats.engagement_tier = tier;
            let name = ctx.engine.name_of(&opponent);
            ctx.tell(actor, Message::success(format!("You turn your attention to {}.", name)));
        }
    }
    Ok(ActionOutcome::Performed)
}

/// `assess`: who is engaged with whom, at what tier
pub fn handle_assess(ctx: &mut CombatContext<'_>, actor: &EntityId) -> Result<ActionOutcome> {
    let stats = ctx.stats(actor)?;
    let mut lines = vec![format!(
        "You are {}. Balance {:.0}%, fatigue {:.0}%.",
        condition_word(&stats),
        stats.balance * 100.0,
        stats.fatigue
    )];

    match &stats.target_id {
        Some(target) if ctx.engine.get_entity(target).is_some() => {
            lines.push(format!(
                "You are tracking {}, {}.",
                ctx.engine.name_of(target),
                stats.engagement_tier.name()
            ));
        }
        _ => lines.push("You are not tracking anyone.".to_string()),
    }

    for other in combatants_near(ctx.engine, actor) {
        if stats.target_id.as_ref() == Some(&other) {
            continue;
        }
        let tier = tier_between(ctx.engine, actor, &other);
        if tier != EngagementTier::Disengaged {
            lines.push(format!("{} is {} with you.", ctx.engine.name_of(&other), tier.name()));
        }
    }

    ctx.tell(actor, Message::info(lines.join("\n")));
    Ok(ActionOutcome::Performed)
}

/// `appraise <name>`: an opponent's condition and manner
pub fn handle_appraise(
    ctx: &mut CombatContext<'_>,
    actor: &EntityId,
    target: &TargetRef,
) -> Result<ActionOutcome> {
    let Some(other) = resolve_target(ctx.engine, actor, target) else {
        return ctx.reject(actor, "Appraise whom?");
    };
    let theirs = ctx.stats(&other)?;
    let name = ctx.engine.name_of(&other);
    let weapon = weapon_of(ctx.engine, &other)
        .map(|(_, w)| format!("wielding a {}", w.name))
        .unwrap_or_else(|| "empty-handed".to_string());

    let mut text = format!(
        "{} is {}, fighting {}, {}.",
        name,
        condition_word(&theirs),
        fighting_style(&theirs),
        weapon
    );
    if theirs.is_hanging_back {
        text.push_str(" They are hanging back.");
    }
    if theirs.is_hostile {
        text.push_str(" They look hostile.");
    }
    ctx.tell(actor, Message::info(text));
    Ok(ActionOutcome::Performed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_bands() {
        let mut stats = CombatStats::new(100, 5, 5);
        assert_eq!(condition_word(&stats), "in perfect health");
        stats.hp = 60;
        assert_eq!(condition_word(&stats), "wounded");
        stats.hp = 10;
        assert_eq!(condition_word(&stats), "near death");
        stats.hp = 0;
        assert_eq!(condition_word(&stats), "down and out of the fight");
    }
}
