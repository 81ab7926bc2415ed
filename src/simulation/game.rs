//! Game loop
//!
//! `Game` owns the world, the outbox and every system. All commands and
//! ticks run through it one at a time; the server only ever calls in
//! from its single simulation task.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::combat::action::ActionOutcome;
use crate::combat::dice::Dice;
use crate::combat::CombatSystem;
use crate::command::{parse_line, Command, ParseError, HELP};
use crate::components::{LogoutTimer, Posture};
use crate::content::{self, Prefabs, SPAWN_ROOM};
use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::ecs::{ComponentKind, Engine, EngineExt, World};
use crate::messaging::{Delivery, Message, MessageSink, Outbox};
use crate::systems::{
    describe_room, InteractionSystem, MovementSystem, NpcAiSystem, NpcIntent, PostureSystem,
    System, TimerSystem,
};

pub struct Game {
    world: World,
    outbox: Outbox,
    config: GameConfig,
    prefabs: Arc<Prefabs>,
    timers: TimerSystem,
    movement: MovementSystem,
    posture: PostureSystem,
    interaction: InteractionSystem,
    npc: NpcAiSystem,
    combat: CombatSystem,
}

impl Game {
    pub fn new(config: GameConfig, world: World) -> Self {
        let combat = CombatSystem::new(config.combat.clone(), config.regen.clone(), config.seed);
        Self::assemble(config, world, combat)
    }

    /// A game whose combat rolls come from `dice`
    pub fn with_dice(config: GameConfig, world: World, dice: Box<dyn Dice>) -> Self {
        let combat = CombatSystem::with_dice(config.combat.clone(), config.regen.clone(), dice);
        Self::assemble(config, world, combat)
    }

    fn assemble(config: GameConfig, world: World, combat: CombatSystem) -> Self {
        let prefabs = Arc::new(Prefabs::builtin());
        Self {
            world,
            outbox: Outbox::new(),
            prefabs: prefabs.clone(),
            timers: TimerSystem::new(),
            movement: MovementSystem::new(),
            posture: PostureSystem::new(config.combat.posture_roundtime),
            interaction: InteractionSystem::new(),
            npc: NpcAiSystem::new(config.npc.clone(), config.seed.wrapping_add(1)),
            combat: combat.with_prefabs(prefabs),
            config,
        }
    }

    /// Use `prefabs` for players' kit and for everything combat drops
    pub fn with_prefabs(mut self, prefabs: Prefabs) -> Self {
        let prefabs = Arc::new(prefabs);
        self.combat = self.combat.with_prefabs(prefabs.clone());
        self.prefabs = prefabs;
        self
    }

    pub fn prefabs(&self) -> &Prefabs {
        &self.prefabs
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn combat(&self) -> &CombatSystem {
        &self.combat
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn drain_deliveries(&mut self) -> Vec<Delivery> {
        self.outbox.drain()
    }

    /// Advance the simulation by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        self.world.advance(dt);

        self.timers.update(&mut self.world, &mut self.outbox, dt);
        for gone in self.timers.take_expired() {
            self.combat.forget(&gone);
        }

        self.combat.update(&mut self.world, &mut self.outbox, dt);
        self.npc.update(&mut self.world, &mut self.outbox, dt);

        for intent in self.npc.take_intents() {
            self.run_intent(intent);
        }
    }

    fn run_intent(&mut self, intent: NpcIntent) {
        let (npc, result) = match intent {
            NpcIntent::Stand { npc } => {
                let result = self.posture.handle_stand(&mut self.world, &mut self.outbox, &npc);
                (npc, result)
            }
            NpcIntent::Combat { npc, action } => {
                let result = self.combat.perform(&mut self.world, &mut self.outbox, &npc, &action);
                (npc, result)
            }
        };
        if let Err(e) = result {
            error!(npc = %npc, error = %e, "npc intent failed");
        }
    }

    /// Run one command for `actor`. This is where handler errors stop:
    /// they are logged and the actor gets a single generic message.
    pub fn execute(&mut self, actor: &EntityId, command: &Command) -> ActionOutcome {
        if self.world.get_entity(actor).is_none() {
            warn!(actor = %actor, "command from an entity not in the world");
            return ActionOutcome::Rejected;
        }
        match self.dispatch(actor, command) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(actor = %actor, command = ?command, error = %e, "command failed");
                self.outbox.send(actor, Message::system("Something went wrong."));
                ActionOutcome::Rejected
            }
        }
    }

    fn dispatch(&mut self, actor: &EntityId, command: &Command) -> Result<ActionOutcome> {
        let world = &mut self.world;
        let sink = &mut self.outbox;
        match command {
            Command::Combat(combat) => self.combat.dispatch(world, sink, actor, combat.clone()),
            Command::Move(direction) => self.movement.handle_move(world, sink, actor, *direction),
            Command::Posture(posture) => match posture {
                Posture::Standing => self.posture.handle_stand(world, sink, actor),
                Posture::Sitting => self.posture.handle_sit(world, sink, actor),
                Posture::Lying => self.posture.handle_lie(world, sink, actor),
            },
            Command::Enter(portal) => self.interaction.handle_enter(world, sink, actor, portal),
            Command::Look => {
                describe_room(world, sink, actor);
                Ok(ActionOutcome::Performed)
            }
            Command::Help => {
                sink.send(actor, Message::info(HELP));
                Ok(ActionOutcome::Performed)
            }
            Command::Quit => {
                self.combat.forget(actor);
                world.insert(
                    actor,
                    LogoutTimer {
                        remaining: self.config.logout_grace,
                    },
                )?;
                sink.send(actor, Message::system("Farewell."));
                Ok(ActionOutcome::Performed)
            }
        }
    }

    /// Parse and run a line of input
    pub fn execute_line(&mut self, actor: &EntityId, line: &str) -> ActionOutcome {
        match parse_line(line) {
            Ok(command) => self.execute(actor, &command),
            Err(ParseError::Empty) => ActionOutcome::Rejected,
            Err(e) => {
                self.outbox.send(actor, Message::error(e.to_string()));
                ActionOutcome::Rejected
            }
        }
    }

    /// Bring a player into the world, or reattach one still lingering
    pub fn spawn_player(&mut self, name: &str) -> Result<EntityId> {
        let id = EntityId::player(name);
        if self.world.get_entity(&id).is_some() {
            self.world.remove::<LogoutTimer>(&id);
            self.outbox.send(&id, Message::system("You take up where you left off."));
            describe_room(&self.world, &mut self.outbox, &id);
            info!(player = %id, "player reattached");
            return Ok(id);
        }

        let id = content::spawn_player(&mut self.world, &self.prefabs, name, SPAWN_ROOM)?;
        let display = self.world.name_of(&id);
        self.outbox.broadcast(
            SPAWN_ROOM,
            std::slice::from_ref(&id),
            Message::info(format!("{} appears.", display)),
        );
        self.outbox.send(&id, Message::system(format!("Welcome, {}.", display)));
        describe_room(&self.world, &mut self.outbox, &id);
        info!(player = %id, "player joined");
        Ok(id)
    }

    /// Connection lost: the character lingers for the grace period
    pub fn disconnect(&mut self, actor: &EntityId) {
        if self.world.get_entity(actor).is_none() {
            return;
        }
        let timer = LogoutTimer {
            remaining: self.config.logout_grace,
        };
        if let Err(e) = self.world.insert(actor, timer) {
            warn!(actor = %actor, error = %e, "could not start logout timer");
        }
        debug!(actor = %actor, "player disconnected");
    }

    /// Who a delivery reaches: the direct recipient, or every player in
    /// the room not excluded
    pub fn recipients(&self, delivery: &Delivery) -> Vec<EntityId> {
        match delivery {
            Delivery::Direct { to, .. } => vec![to.clone()],
            Delivery::Room { room, exclude, .. } => self
                .world
                .entities_at(*room)
                .into_iter()
                .filter(|id| !exclude.contains(id))
                .filter(|id| self.world.has_component(id, ComponentKind::Player))
                .collect(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.world.entities_with_component(ComponentKind::Player).len()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default(), World::new())
    }
}
