//! Finishing moves paid for with momentum

use tracing::info;

use crate::components::{Momentum, WeaponCategory};
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::combat::action::{ActionOutcome, AttackMove, TargetRef};
use crate::combat::attack::{execute_strike, plan_strike, StrikeOptions};
use crate::combat::context::{ensure_ready, CombatContext};
use crate::ecs::EngineExt;
use crate::inventory::weapon_of;
use crate::messaging::Message;

/// `iaijutsu [target]`: a draw-and-strike with a katana
///
/// Checks run in order: roundtime, weapon, momentum, then the ordinary
/// strike checks. Momentum is spent only once the strike is certain.
pub fn handle_iaijutsu(
    ctx: &mut CombatContext<'_>,
    actor: &EntityId,
    target: &TargetRef,
) -> Result<ActionOutcome> {
    if !ensure_ready(ctx.engine, ctx.sink, actor) {
        return Ok(ActionOutcome::Rejected);
    }

    let has_katana = weapon_of(ctx.engine, actor)
        .map(|(_, w)| w.category == WeaponCategory::Katana)
        .unwrap_or(false);
    if !has_katana {
        return ctx.reject(actor, "You need a katana in hand for iaijutsu.");
    }

    let cost = ctx.config.iaijutsu_momentum_cost;
    let current = ctx
        .engine
        .component::<Momentum>(actor)
        .map(|m| m.current)
        .unwrap_or(0);
    if current < cost {
        return ctx.reject(
            actor,
            format!("You lack the momentum for iaijutsu. ({}/{})", current, cost),
        );
    }

    let Some(plan) = plan_strike(ctx, actor, target, Some(AttackMove::Slash))? else {
        return Ok(ActionOutcome::Rejected);
    };

    if !ctx.engine.require_mut::<Momentum>(actor)?.consume(cost) {
        return ctx.reject(actor, "You lack the momentum for iaijutsu.");
    }

    ctx.tell(
        actor,
        Message::combat("You whip your blade from its sheath in a single blinding stroke!"),
    );
    let options = StrikeOptions {
        multiplier: ctx.config.iaijutsu_multiplier,
        roundtime: Some(ctx.config.iaijutsu_roundtime),
        grants_momentum: false,
    };
    let result = execute_strike(ctx, &plan, options)?;
    info!(actor = %actor, outcome = result.outcome.label(), damage = result.damage, "iaijutsu");
    Ok(ActionOutcome::Performed)
}
