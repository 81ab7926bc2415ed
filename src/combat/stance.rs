//! Defensive configuration: stance presets, custom splits, hangback
//! and the reflexive parry

use crate::components::{CombatStats, ParryReady, Posture, DEFENSE_BUDGET};
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::combat::action::{ActionOutcome, StancePreset, StanceRequest};
use crate::combat::context::{posture_of, CombatContext};
use crate::ecs::EngineExt;
use crate::messaging::Message;

fn describe(stats: &CombatStats) -> String {
    format!(
        "Evasion {}, parry {}, shield {}, aggression {:.0}%.{}",
        stats.evasion,
        stats.parry,
        stats.shield,
        stats.aggression * 100.0,
        if stats.is_hanging_back {
            " You are hanging back."
        } else {
            ""
        }
    )
}

/// `stance [preset | custom e p s [aggression]]`
pub fn handle_stance(
    ctx: &mut CombatContext<'_>,
    actor: &EntityId,
    request: &StanceRequest,
) -> Result<ActionOutcome> {
    match request {
        StanceRequest::Show => {
            let stats = ctx.stats(actor)?;
            ctx.tell(actor, Message::info(describe(&stats)));
            Ok(ActionOutcome::Performed)
        }
        StanceRequest::Reset => {
            let stats = ctx.engine.require_mut::<CombatStats>(actor)?;
            stats.reset_defenses();
            let text = format!("You return to your own stance. {}", describe(stats));
            ctx.tell(actor, Message::success(text));
            Ok(ActionOutcome::Performed)
        }
        StanceRequest::Preset(preset) => apply_preset(ctx, actor, *preset),
        StanceRequest::Custom {
            evasion,
            parry,
            shield,
            aggression,
        } => {
            let total = evasion
                .checked_add(*parry)
                .and_then(|sum| sum.checked_add(*shield))
                .filter(|&sum| sum <= DEFENSE_BUDGET);
            if total.is_none() {
                return ctx.reject(
                    actor,
                    format!(
                        "Evasion, parry and shield can't total more than {}.",
                        DEFENSE_BUDGET
                    ),
                );
            }
            if let Some(a) = aggression {
                if !(0.0..=1.0).contains(a) {
                    return ctx.reject(actor, "Aggression must be between 0 and 1.");
                }
            }

            let stats = ctx.engine.require_mut::<CombatStats>(actor)?;
            stats.evasion = *evasion;
            stats.parry = *parry;
            stats.shield = *shield;
            stats.base_evasion = *evasion;
            stats.base_parry = *parry;
            stats.base_shield = *shield;
            if let Some(a) = aggression {
                stats.aggression = *a;
                stats.base_aggression = *a;
            }
            let text = format!("You settle into a custom stance. {}", describe(stats));
            ctx.tell(actor, Message::success(text));
            Ok(ActionOutcome::Performed)
        }
    }
}

/// Presets change the live split only; the stored baseline stays
fn apply_preset(
    ctx: &mut CombatContext<'_>,
    actor: &EntityId,
    preset: StancePreset,
) -> Result<ActionOutcome> {
    let (evasion, parry, shield, aggression) = preset.values();
    let stats = ctx.engine.require_mut::<CombatStats>(actor)?;
    stats.evasion = evasion;
    stats.parry = parry;
    stats.shield = shield;
    stats.aggression = aggression;
    let text = format!("You shift into a {} stance. {}", preset.name(), describe(stats));
    ctx.tell(actor, Message::success(text));
    Ok(ActionOutcome::Performed)
}

/// `hangback`: toggle
pub fn handle_hangback(ctx: &mut CombatContext<'_>, actor: &EntityId) -> Result<ActionOutcome> {
    let stats = ctx.engine.require_mut::<CombatStats>(actor)?;
    stats.is_hanging_back = !stats.is_hanging_back;
    let text = if stats.is_hanging_back {
        "You hang back, trading offense for safety."
    } else {
        "You stop hanging back and press in."
    };
    ctx.tell(actor, Message::success(text));
    Ok(ActionOutcome::Performed)
}

/// `parry`: a reaction, so it ignores the actor's own roundtime
pub fn handle_parry(ctx: &mut CombatContext<'_>, actor: &EntityId) -> Result<ActionOutcome> {
    let stats = ctx.stats(actor)?;
    if stats.is_down() {
        return ctx.reject(actor, "You are in no condition to parry.");
    }
    if posture_of(ctx.engine, actor) == Posture::Lying {
        return ctx.reject(actor, "You can't parry lying down.");
    }
    let readied = ctx
        .engine
        .component::<ParryReady>(actor)
        .map(|p| p.remaining > 0.0)
        .unwrap_or(false);
    if readied {
        return ctx.reject(actor, "You are already poised to parry.");
    }
    if stats.balance < ctx.config.parry_balance_cost {
        return ctx.reject(actor, "You are too off balance to parry.");
    }

    ctx.engine.insert(
        actor,
        ParryReady {
            remaining: ctx.config.parry_window,
        },
    )?;
    ctx.engine
        .require_mut::<CombatStats>(actor)?
        .spend_balance(ctx.config.parry_balance_cost);
    ctx.tell(actor, Message::success("You raise your guard, ready to parry."));
    Ok(ActionOutcome::Performed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Roundtime;
    use crate::core::config::CombatConfig;
    use crate::combat::dice::FixedDice;
    use crate::content::Prefabs;
    use crate::ecs::engine::Engine;
    use crate::ecs::{Entity, World};
    use crate::messaging::Outbox;

    fn run(
        world: &mut World,
        outbox: &mut Outbox,
        f: impl FnOnce(&mut CombatContext<'_>) -> Result<ActionOutcome>,
    ) -> ActionOutcome {
        let config = CombatConfig::default();
        let mut dice = FixedDice::always(50.0);
        let mut ctx = CombatContext {
            engine: world,
            sink: outbox,
            config: &config,
            dice: &mut dice,
            prefabs: &Prefabs::new(),
        };
        f(&mut ctx).unwrap()
    }

    fn fighter(world: &mut World) -> EntityId {
        let id = EntityId::from("fighter");
        world
            .add_entity(Entity::new(id.clone()).with(CombatStats::new(30, 10, 10)))
            .unwrap();
        id
    }

    #[test]
    fn test_custom_over_budget_rejected_without_mutation() {
        let mut world = World::new();
        let mut outbox = Outbox::new();
        let id = fighter(&mut world);
        let before = world.component::<CombatStats>(&id).unwrap().clone();

        let request = StanceRequest::Custom {
            evasion: 50,
            parry: 40,
            shield: 20,
            aggression: None,
        };
        let outcome = run(&mut world, &mut outbox, |ctx| handle_stance(ctx, &id, &request));

        assert_eq!(outcome, ActionOutcome::Rejected);
        assert_eq!(world.component::<CombatStats>(&id).unwrap(), &before);
        assert_eq!(outbox.messages_for(&id).len(), 1);
    }

    #[test]
    fn test_custom_huge_values_rejected() {
        let mut world = World::new();
        let mut outbox = Outbox::new();
        let id = fighter(&mut world);
        let before = world.component::<CombatStats>(&id).unwrap().clone();

        let request = StanceRequest::Custom {
            evasion: u32::MAX,
            parry: 1,
            shield: 0,
            aggression: None,
        };
        let outcome = run(&mut world, &mut outbox, |ctx| handle_stance(ctx, &id, &request));

        assert_eq!(outcome, ActionOutcome::Rejected);
        assert_eq!(world.component::<CombatStats>(&id).unwrap(), &before);
    }

    #[test]
    fn test_custom_sets_baseline_preset_does_not() {
        let mut world = World::new();
        let mut outbox = Outbox::new();
        let id = fighter(&mut world);

        let custom = StanceRequest::Custom {
            evasion: 60,
            parry: 30,
            shield: 10,
            aggression: Some(0.7),
        };
        run(&mut world, &mut outbox, |ctx| handle_stance(ctx, &id, &custom));
        let preset = StanceRequest::Preset(StancePreset::Guarded);
        run(&mut world, &mut outbox, |ctx| handle_stance(ctx, &id, &preset));

        let stats = world.component::<CombatStats>(&id).unwrap();
        assert_eq!((stats.evasion, stats.parry, stats.shield), (10, 30, 60));
        assert_eq!((stats.base_evasion, stats.base_parry, stats.base_shield), (60, 30, 10));
        assert_eq!(stats.base_aggression, 0.7);

        let reset = StanceRequest::Reset;
        let outcome = run(&mut world, &mut outbox, |ctx| handle_stance(ctx, &id, &reset));
        assert_eq!(outcome, ActionOutcome::Performed);
        let stats = world.component::<CombatStats>(&id).unwrap();
        assert_eq!((stats.evasion, stats.parry, stats.shield), (60, 30, 10));
        assert_eq!(stats.aggression, 0.7);
    }

    #[test]
    fn test_parry_ignores_roundtime() {
        let mut world = World::new();
        let mut outbox = Outbox::new();
        let id = fighter(&mut world);
        world.insert(&id, Roundtime::new(3.0)).unwrap();

        let outcome = run(&mut world, &mut outbox, |ctx| handle_parry(ctx, &id));
        assert_eq!(outcome, ActionOutcome::Performed);
        assert!(world.component::<ParryReady>(&id).is_some());
        assert!(world.component::<CombatStats>(&id).unwrap().balance < 1.0);

        let again = run(&mut world, &mut outbox, |ctx| handle_parry(ctx, &id));
        assert_eq!(again, ActionOutcome::Rejected);
    }

    #[test]
    fn test_hangback_toggles() {
        let mut world = World::new();
        let mut outbox = Outbox::new();
        let id = fighter(&mut world);
        run(&mut world, &mut outbox, |ctx| handle_hangback(ctx, &id));
        assert!(world.component::<CombatStats>(&id).unwrap().is_hanging_back);
        run(&mut world, &mut outbox, |ctx| handle_hangback(ctx, &id));
        assert!(!world.component::<CombatStats>(&id).unwrap().is_hanging_back);
    }
}
