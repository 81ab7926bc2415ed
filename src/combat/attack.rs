//! Attack handling
//!
//! A strike is planned (every check that can reject) and then executed
//! (every mutation). Special moves plan with the same checks, spend
//! their resource in between, and execute with their own options.

use serde_json::json;
use tracing::{debug, error, info};

use crate::components::{
    CombatStats, EngagementTier, Inventory, Momentum, Npc, ParryReady, Posture, Stance, Weapon,
    WeaponCategory, WeaponClass,
};
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::combat::action::{ActionOutcome, AttackMove, TargetRef};
use crate::combat::context::{
    apply_roundtime, ensure_ready, posture_of, skill_level, CombatContext,
};
use crate::combat::engagement::{answer_attacker, release_trackers, set_engagement, tier_between};
use crate::combat::resolution::{
    crit_window, damage, defense_rating, hit_chance, offense_rating, pick_defense, resolve_roll,
    DefenseUsed, HitOutcome,
};
use crate::combat::targeting::resolve_target;
use crate::ecs::EngineExt;
use crate::inventory::weapon_of;
use crate::messaging::Message;

/// Minimum weapon range that reaches from long range
pub const LONG_RANGE_REACH: u32 = 5;

/// A validated strike, ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct StrikePlan {
    pub attacker: EntityId,
    pub defender: EntityId,
    pub attack_move: AttackMove,
    pub weapon: Option<EntityId>,
    pub weapon_name: String,
    pub ranged: bool,
    pub base_damage: i32,
    /// Tier the strike lands at; the attacker ends up tracking the
    /// defender here
    pub tier: EngagementTier,
    pub roundtime: f32,
}

/// Knobs special moves turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeOptions {
    pub multiplier: f32,
    pub roundtime: Option<f32>,
    pub grants_momentum: bool,
}

impl Default for StrikeOptions {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            roundtime: None,
            grants_momentum: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeResult {
    pub outcome: HitOutcome,
    pub damage: i32,
    pub knocked_down: bool,
}

/// `attack [move] [target]`
pub fn handle_attack(
    ctx: &mut CombatContext<'_>,
    actor: &EntityId,
    target: &TargetRef,
    attack_move: Option<AttackMove>,
) -> Result<ActionOutcome> {
    if !ensure_ready(ctx.engine, ctx.sink, actor) {
        return Ok(ActionOutcome::Rejected);
    }
    let Some(plan) = plan_strike(ctx, actor, target, attack_move)? else {
        return Ok(ActionOutcome::Rejected);
    };
    execute_strike(ctx, &plan, StrikeOptions::default())?;
    Ok(ActionOutcome::Performed)
}

/// Run every check for a strike. Sends the rejection itself and returns
/// `None` when the strike can't happen. Mutates nothing.
pub fn plan_strike(
    ctx: &mut CombatContext<'_>,
    actor: &EntityId,
    target: &TargetRef,
    attack_move: Option<AttackMove>,
) -> Result<Option<StrikePlan>> {
    let stats = ctx.stats(actor)?;
    if stats.is_down() {
        ctx.reject(actor, "You are in no condition to fight.")?;
        return Ok(None);
    }
    if posture_of(ctx.engine, actor) == Posture::Lying {
        ctx.reject(actor, "You can't fight lying down. Stand up first.")?;
        return Ok(None);
    }

    let Some(defender) = resolve_target(ctx.engine, actor, target) else {
        let text = match target {
            TargetRef::Current => "Attack whom?",
            _ => "You don't see anyone like that here.",
        };
        ctx.reject(actor, text)?;
        return Ok(None);
    };
    let defender_name = ctx.engine.name_of(&defender);
    if ctx.stats(&defender)?.is_down() {
        ctx.reject(actor, format!("{} is already down.", defender_name))?;
        return Ok(None);
    }

    let weapon = weapon_of(ctx.engine, actor).map(|(id, w)| (id, w.clone()));
    let category = weapon.as_ref().map(|(_, w)| w.category);
    let ranged_weapon = weapon.as_ref().map(|(_, w)| !w.is_melee()).unwrap_or(false);
    let attack_move = attack_move.unwrap_or_else(|| AttackMove::default_for(category, ranged_weapon));
    let current_tier = tier_between(ctx.engine, actor, &defender);

    let (weapon_id, weapon_name, base_damage, class, tier) = match (&weapon, attack_move) {
        (_, mv) if mv.is_unarmed() => {
            if !current_tier.is_close() {
                reject_out_of_reach(ctx, actor, &defender_name, current_tier)?;
                return Ok(None);
            }
            (
                None,
                "bare hands".to_string(),
                ctx.config.unarmed_damage,
                WeaponClass::Light,
                current_tier,
            )
        }
        (None, AttackMove::Shoot) => {
            ctx.reject(actor, "You have nothing to shoot with.")?;
            return Ok(None);
        }
        (None, mv) => {
            ctx.reject(actor, format!("You need a weapon to {}.", mv.verb()))?;
            return Ok(None);
        }
        (Some((id, w)), AttackMove::Shoot) => {
            if w.is_melee() {
                ctx.reject(actor, format!("You can't shoot with a {}.", w.name))?;
                return Ok(None);
            }
            if w.current_ammo == 0 {
                ctx.reject(actor, format!("*click* Your {} is empty. Reload first.", w.name))?;
                return Ok(None);
            }
            let tier = match current_tier {
                EngagementTier::Disengaged => EngagementTier::Missile,
                EngagementTier::LongRange if w.range < LONG_RANGE_REACH => {
                    ctx.reject(
                        actor,
                        format!("{} is out of range of your {}.", defender_name, w.name),
                    )?;
                    return Ok(None);
                }
                tier => tier,
            };
            (Some(id.clone()), w.name.clone(), w.damage, w.category.class(), tier)
        }
        (Some((id, w)), mv) => {
            if !w.is_melee() {
                ctx.reject(actor, format!("You can't {} with a {}.", mv.verb(), w.name))?;
                return Ok(None);
            }
            let reaches = current_tier.is_close()
                || (w.category == WeaponCategory::Polearm
                    && current_tier == EngagementTier::Polearm);
            if !reaches {
                reject_out_of_reach(ctx, actor, &defender_name, current_tier)?;
                return Ok(None);
            }
            (Some(id.clone()), w.name.clone(), w.damage, w.category.class(), current_tier)
        }
    };

    let level = skill_level(ctx.engine, actor, class);
    let roundtime = ctx.config.attack_cost.for_level(level) + attack_move.extra_roundtime();

    Ok(Some(StrikePlan {
        attacker: actor.clone(),
        defender,
        attack_move,
        weapon: weapon_id,
        weapon_name,
        ranged: attack_move == AttackMove::Shoot,
        base_damage,
        tier,
        roundtime,
    }))
}

fn reject_out_of_reach(
    ctx: &mut CombatContext<'_>,
    actor: &EntityId,
    defender_name: &str,
    tier: EngagementTier,
) -> Result<()> {
    let text = if tier == EngagementTier::Disengaged {
        format!("You aren't engaged with {}. Advance first.", defender_name)
    } else {
        format!("{} is out of reach; you are {}.", defender_name, tier.name())
    };
    ctx.reject(actor, text).map(|_| ())
}

/// Carry out a planned strike. This is where a blow becomes HP loss.
pub fn execute_strike(
    ctx: &mut CombatContext<'_>,
    plan: &StrikePlan,
    options: StrikeOptions,
) -> Result<StrikeResult> {
    let attacker = &plan.attacker;
    let defender = &plan.defender;

    if plan.ranged {
        if let Some(weapon_id) = &plan.weapon {
            let weapon = ctx.engine.require_mut::<Weapon>(weapon_id)?;
            weapon.current_ammo = weapon.current_ammo.saturating_sub(1);
        }
    }

    set_engagement(ctx.engine, attacker, defender, plan.tier)?;
    answer_attacker(ctx.engine, defender, attacker, plan.tier);

    let attacker_stats = ctx.stats(attacker)?;
    let defender_stats = ctx.stats(defender)?;

    let parried = !plan.ranged
        && ctx
            .engine
            .remove::<ParryReady>(defender)
            .map(|p| p.remaining > 0.0)
            .unwrap_or(false);

    let outcome = if parried {
        HitOutcome::Miss(DefenseUsed::Parry)
    } else {
        let offense = offense_rating(
            &attacker_stats,
            posture_of(ctx.engine, attacker),
            plan.attack_move,
            ctx.config,
        );
        let defense = defense_rating(&defender_stats, posture_of(ctx.engine, defender), ctx.config);
        let chance = hit_chance(offense, defense, ctx.config);
        let window = crit_window(chance, attacker_stats.target_limb);
        let roll = ctx.dice.percent();
        let shown = if roll < chance {
            DefenseUsed::Evade
        } else {
            pick_defense(&defender_stats, ctx.dice.unit())
        };
        debug!(attacker = %attacker, defender = %defender, chance, roll, "attack roll");
        resolve_roll(chance, window, roll, shown)
    };

    let limb = attacker_stats.target_limb;
    let dealt = damage(
        plan.base_damage,
        attacker_stats.attack,
        outcome,
        options.multiplier * plan.attack_move.damage_multiplier(),
        limb,
        ctx.config,
    );

    {
        let stats = ctx.engine.require_mut::<CombatStats>(attacker)?;
        let mut balance_cost = ctx.config.balance_per_attack;
        if !outcome.landed() {
            balance_cost += ctx.config.balance_per_miss;
        }
        stats.spend_balance(balance_cost);
        stats.add_fatigue(ctx.config.fatigue_per_attack);
    }

    if options.grants_momentum {
        let gain = match outcome {
            HitOutcome::Crit => ctx.config.momentum_per_crit,
            HitOutcome::Hit => ctx.config.momentum_per_hit,
            HitOutcome::Miss(_) => 0,
        };
        if gain > 0 {
            if let Some(momentum) = ctx.engine.component_mut::<Momentum>(attacker) {
                momentum.gain(gain);
            }
        }
    }

    apply_roundtime(ctx.engine, attacker, options.roundtime.unwrap_or(plan.roundtime))?;

    let (knocked_down, hp, max_hp) = {
        let stats = ctx.engine.require_mut::<CombatStats>(defender)?;
        let knocked = stats.take_damage(dealt);
        (knocked, stats.hp, stats.max_hp)
    };

    announce_strike(ctx, plan, outcome, dealt, hp, max_hp, parried);

    if knocked_down {
        knock_down(ctx, attacker, defender)?;
    }

    Ok(StrikeResult {
        outcome,
        damage: dealt,
        knocked_down,
    })
}

fn third_person(attack_move: AttackMove) -> &'static str {
    match attack_move {
        AttackMove::Slash => "slashes",
        AttackMove::Thrust => "thrusts at",
        AttackMove::Bash => "bashes",
        AttackMove::Punch => "punches",
        AttackMove::Kick => "kicks",
        AttackMove::Shoot => "fires at",
    }
}

fn second_person(attack_move: AttackMove) -> &'static str {
    match attack_move {
        AttackMove::Thrust => "thrust at",
        AttackMove::Shoot => "fire at",
        other => other.verb(),
    }
}

fn defense_words(defense: DefenseUsed) -> (&'static str, &'static str) {
    match defense {
        DefenseUsed::Evade => ("evade", "evades"),
        DefenseUsed::Parry => ("parry", "parries"),
        DefenseUsed::Block => ("block", "blocks"),
    }
}

fn announce_strike(
    ctx: &mut CombatContext<'_>,
    plan: &StrikePlan,
    outcome: HitOutcome,
    dealt: i32,
    hp: i32,
    max_hp: i32,
    parried: bool,
) {
    let attacker_name = ctx.engine.name_of(&plan.attacker);
    let defender_name = ctx.engine.name_of(&plan.defender);
    let limb = ctx
        .engine
        .component::<CombatStats>(&plan.attacker)
        .and_then(|s| s.target_limb);
    let limb_text = limb
        .map(|l| format!(" in the {}", l.name()))
        .unwrap_or_default();
    let with = if plan.weapon.is_some() {
        format!(" with your {}", plan.weapon_name)
    } else {
        String::new()
    };

    let payload = json!({
        "attacker": plan.attacker.as_str(),
        "defender": plan.defender.as_str(),
        "move": plan.attack_move.verb(),
        "outcome": outcome,
        "damage": dealt,
        "limb": limb.map(|l| l.name()),
        "hp": hp,
        "max_hp": max_hp,
        "reflex_parry": parried,
    });

    let (to_attacker, to_defender, to_room) = match outcome {
        HitOutcome::Miss(defense) => {
            let (you, they) = defense_words(defense);
            (
                format!("{} {} your {}.", defender_name, they, plan.attack_move.verb()),
                format!("You {} {}'s {}.", you, attacker_name, plan.attack_move.verb()),
                format!("{} {} {}'s {}.", defender_name, they, attacker_name, plan.attack_move.verb()),
            )
        }
        HitOutcome::Hit | HitOutcome::Crit => {
            let prefix = if outcome == HitOutcome::Crit {
                "A critical blow! "
            } else {
                ""
            };
            (
                format!(
                    "{}You {} {}{}{}. ({} damage)",
                    prefix,
                    second_person(plan.attack_move),
                    defender_name,
                    limb_text,
                    with,
                    dealt
                ),
                format!(
                    "{}{} {} you{}. ({} damage)",
                    prefix,
                    attacker_name,
                    third_person(plan.attack_move),
                    limb_text,
                    dealt
                ),
                format!(
                    "{} {} {}{}!",
                    attacker_name,
                    third_person(plan.attack_move),
                    defender_name,
                    limb_text
                ),
            )
        }
    };

    ctx.sink.send(
        &plan.attacker,
        Message::combat(to_attacker).with_payload(payload.clone()),
    );
    ctx.sink.send(
        &plan.defender,
        Message::combat(to_defender).with_payload(payload.clone()),
    );
    if let Some(room) = ctx.engine.position_of(&plan.attacker) {
        ctx.sink.broadcast(
            room,
            &[plan.attacker.clone(), plan.defender.clone()],
            Message::combat(to_room).with_payload(payload),
        );
    }
}

/// The victim has dropped to 0 HP. NPCs die and drop their loot; players
/// are left lying, out of the fight.
pub fn knock_down(ctx: &mut CombatContext<'_>, killer: &EntityId, victim: &EntityId) -> Result<()> {
    release_trackers(ctx.engine, victim);
    if let Some(stats) = ctx.engine.component_mut::<CombatStats>(victim) {
        stats.disengage();
    }
    if let Some(momentum) = ctx.engine.component_mut::<Momentum>(victim) {
        momentum.reset();
    }

    let name = ctx.engine.name_of(victim);
    let room = ctx.engine.position_of(victim);
    let exclude = [victim.clone()];

    let Some(npc) = ctx.engine.component::<Npc>(victim).cloned() else {
        if let Some(stats) = ctx.engine.component_mut::<CombatStats>(victim) {
            stats.hp = 0;
        }
        ctx.engine.insert(victim, Stance { current: Posture::Lying })?;
        ctx.sink.send(victim, Message::combat("You collapse, too badly hurt to fight on."));
        if let Some(room) = room {
            ctx.sink.broadcast(room, &exclude, Message::combat(format!("{} collapses!", name)));
        }
        info!(victim = %victim, killer = %killer, "player downed");
        return Ok(());
    };

    if let Some(room) = room {
        if let Some(inv) = ctx.engine.component::<Inventory>(victim).cloned() {
            for item in inv.hands().chain(inv.equipment.values()) {
                if ctx.engine.get_entity(item).is_some() {
                    ctx.engine.place(item, room)?;
                }
            }
        }
        if let Some(prefab) = &npc.loot {
            if let Err(e) = ctx.prefabs.spawn(ctx.engine, prefab, Some(room)) {
                error!(victim = %victim, prefab = %prefab, error = %e, "loot drop failed");
                ctx.sink.send(killer, Message::system("Something went wrong."));
            }
        }
        ctx.sink.broadcast(room, &exclude, Message::combat(format!("{} collapses and dies.", name)));
    }

    ctx.engine.remove_entity(victim);
    info!(victim = %victim, killer = %killer, "npc killed");
    Ok(())
}
