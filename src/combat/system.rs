//! The combat facade
//!
//! One entry point per player-facing verb, all funnelling through
//! `perform`. The facade owns the dice and the automation state; the
//! world and the message sink are passed in on every call.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::config::{CombatConfig, RegenConfig};
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::combat::action::{
    ActionOutcome, AttackMove, CombatAction, CombatCommand, StanceRequest, TargetRef,
    TargetRequest,
};
use crate::combat::attack::handle_attack;
use crate::combat::automation::AutomationManager;
use crate::combat::awareness::{handle_appraise, handle_assess, handle_target};
use crate::combat::context::CombatContext;
use crate::combat::dice::{Dice, SeededDice};
use crate::combat::maneuver::{
    handle_advance, handle_close, handle_flee, handle_retreat, handle_withdraw,
};
use crate::combat::reload::{handle_check_ammo, handle_reload};
use crate::combat::special::handle_iaijutsu;
use crate::combat::stance::{handle_hangback, handle_parry, handle_stance};
use crate::content::Prefabs;
use crate::ecs::Engine;
use crate::messaging::{Message, MessageSink};
use crate::systems::System;

pub struct CombatSystem {
    config: CombatConfig,
    regen: RegenConfig,
    dice: Box<dyn Dice>,
    automation: AutomationManager,
    prefabs: Arc<Prefabs>,
}

impl CombatSystem {
    pub fn new(config: CombatConfig, regen: RegenConfig, seed: u64) -> Self {
        Self::with_dice(config, regen, Box::new(SeededDice::new(seed)))
    }

    pub fn with_dice(config: CombatConfig, regen: RegenConfig, dice: Box<dyn Dice>) -> Self {
        Self {
            config,
            regen,
            dice,
            automation: AutomationManager::new(),
            prefabs: Arc::new(Prefabs::builtin()),
        }
    }

    /// Spawn loot and drops from `prefabs` instead of the stock catalog
    pub fn with_prefabs(mut self, prefabs: Arc<Prefabs>) -> Self {
        self.prefabs = prefabs;
        self
    }

    pub fn prefabs(&self) -> &Prefabs {
        &self.prefabs
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn automation(&self) -> &AutomationManager {
        &self.automation
    }

    /// Run one action now
    pub fn perform(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
        action: &CombatAction,
    ) -> Result<ActionOutcome> {
        let mut ctx = CombatContext {
            engine,
            sink,
            config: &self.config,
            dice: self.dice.as_mut(),
            prefabs: &self.prefabs,
        };
        let ctx = &mut ctx;
        debug!(actor = %actor, action = action.label(), "combat action");
        match action {
            CombatAction::Attack {
                target,
                attack_move,
            } => handle_attack(ctx, actor, target, *attack_move),
            CombatAction::Reload => handle_reload(ctx, actor),
            CombatAction::CheckAmmo => handle_check_ammo(ctx, actor),
            CombatAction::Advance { target } => handle_advance(ctx, actor, target),
            CombatAction::Retreat => handle_retreat(ctx, actor),
            CombatAction::Close => handle_close(ctx, actor),
            CombatAction::Withdraw => handle_withdraw(ctx, actor),
            CombatAction::Flee => handle_flee(ctx, actor),
            CombatAction::Iaijutsu { target } => handle_iaijutsu(ctx, actor, target),
            CombatAction::Parry => handle_parry(ctx, actor),
            CombatAction::Stance(request) => handle_stance(ctx, actor, request),
            CombatAction::Hangback => handle_hangback(ctx, actor),
            CombatAction::Target(request) => handle_target(ctx, actor, request),
            CombatAction::Assess => handle_assess(ctx, actor),
            CombatAction::Appraise { target } => handle_appraise(ctx, actor, target),
        }
    }

    /// Run a command, including the automation meta verbs
    pub fn dispatch(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
        command: CombatCommand,
    ) -> Result<ActionOutcome> {
        match command {
            CombatCommand::Act(action) => self.perform(engine, sink, actor, &action),
            CombatCommand::Automate(action) => {
                if !action.takes_roundtime() {
                    sink.send(
                        actor,
                        Message::error(format!("You can't {} automatically.", action.label())),
                    );
                    return Ok(ActionOutcome::Rejected);
                }
                sink.send(
                    actor,
                    Message::success(format!(
                        "You will {} whenever you are ready, until you stop.",
                        action.label()
                    )),
                );
                self.automation.automate(actor, action);
                Ok(ActionOutcome::Performed)
            }
            CombatCommand::SetBuffer(actions) => {
                let steps: Vec<&str> = actions.iter().map(CombatAction::label).collect();
                sink.send(
                    actor,
                    Message::success(format!("Buffer set: {}.", steps.join(", "))),
                );
                self.automation.set_buffer(actor, actions);
                Ok(ActionOutcome::Performed)
            }
            CombatCommand::ExecuteBuffer => self.execute_buffer(sink, actor),
            CombatCommand::Stop => self.stop(sink, actor),
        }
    }

    pub fn attack(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
        target: &str,
        attack_move: Option<AttackMove>,
    ) -> Result<ActionOutcome> {
        let action = CombatAction::Attack {
            target: TargetRef::from_words(target),
            attack_move,
        };
        self.perform(engine, sink, actor, &action)
    }

    pub fn reload(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.perform(engine, sink, actor, &CombatAction::Reload)
    }

    pub fn check_ammo(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.perform(engine, sink, actor, &CombatAction::CheckAmmo)
    }

    pub fn advance(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
        target: &str,
    ) -> Result<ActionOutcome> {
        let action = CombatAction::Advance {
            target: TargetRef::from_words(target),
        };
        self.perform(engine, sink, actor, &action)
    }

    pub fn retreat(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.perform(engine, sink, actor, &CombatAction::Retreat)
    }

    pub fn close(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.perform(engine, sink, actor, &CombatAction::Close)
    }

    pub fn withdraw(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.perform(engine, sink, actor, &CombatAction::Withdraw)
    }

    pub fn flee(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.perform(engine, sink, actor, &CombatAction::Flee)
    }

    pub fn iaijutsu(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
        target: &str,
    ) -> Result<ActionOutcome> {
        let action = CombatAction::Iaijutsu {
            target: TargetRef::from_words(target),
        };
        self.perform(engine, sink, actor, &action)
    }

    pub fn parry(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.perform(engine, sink, actor, &CombatAction::Parry)
    }

    pub fn stance(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
        request: StanceRequest,
    ) -> Result<ActionOutcome> {
        self.perform(engine, sink, actor, &CombatAction::Stance(request))
    }

    pub fn hangback(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.perform(engine, sink, actor, &CombatAction::Hangback)
    }

    pub fn target(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
        request: TargetRequest,
    ) -> Result<ActionOutcome> {
        self.perform(engine, sink, actor, &CombatAction::Target(request))
    }

    pub fn assess(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        self.perform(engine, sink, actor, &CombatAction::Assess)
    }

    pub fn appraise(
        &mut self,
        engine: &mut dyn Engine,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
        target: &str,
    ) -> Result<ActionOutcome> {
        let action = CombatAction::Appraise {
            target: TargetRef::from_words(target),
        };
        self.perform(engine, sink, actor, &action)
    }

    /// `stop`: clear any automation
    pub fn stop(&mut self, sink: &mut dyn MessageSink, actor: &EntityId) -> Result<ActionOutcome> {
        if self.automation.stop(actor) {
            sink.send(actor, Message::success("You stop what you were doing."));
            Ok(ActionOutcome::Performed)
        } else {
            sink.send(actor, Message::error("You aren't doing anything automatically."));
            Ok(ActionOutcome::Rejected)
        }
    }

    /// `execute`: run the stored buffer one step per cleared roundtime
    pub fn execute_buffer(
        &mut self,
        sink: &mut dyn MessageSink,
        actor: &EntityId,
    ) -> Result<ActionOutcome> {
        if self.automation.start_buffer(actor) {
            sink.send(actor, Message::success("You begin your sequence."));
            Ok(ActionOutcome::Performed)
        } else {
            sink.send(actor, Message::error("Your buffer is empty."));
            Ok(ActionOutcome::Rejected)
        }
    }

    /// Drop automation for an entity leaving the world
    pub fn forget(&mut self, actor: &EntityId) {
        self.automation.forget(actor);
    }

    fn run_automation(&mut self, engine: &mut dyn Engine, sink: &mut dyn MessageSink) {
        for due in self.automation.take_due(engine) {
            match self.perform(engine, sink, &due.actor, &due.action) {
                Ok(ActionOutcome::Performed) => {
                    if due.finishes_sequence {
                        sink.send(&due.actor, Message::info("Your sequence is complete."));
                    }
                }
                Ok(ActionOutcome::Rejected) => {
                    self.automation.stop(&due.actor);
                    sink.send(
                        &due.actor,
                        Message::system(format!(
                            "Automation stopped: you couldn't {}.",
                            due.action.label()
                        )),
                    );
                }
                Err(e) => {
                    warn!(
                        actor = %due.actor,
                        action = due.action.label(),
                        error = %e,
                        "automated action failed"
                    );
                    self.automation.stop(&due.actor);
                    sink.send(&due.actor, Message::system("Something went wrong."));
                }
            }
        }
    }
}

impl System for CombatSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn update(&mut self, engine: &mut dyn Engine, sink: &mut dyn MessageSink, dt: f32) {
        self.run_automation(engine, sink);
        self.automation.regenerate(engine, &self.regen, dt);
    }
}
