//! Countdown components: roundtime, readied parries, logout timers
//!
//! A countdown that reaches zero is removed, so absence always means
//! "ready".

use tracing::info;

use crate::components::{LogoutTimer, ParryReady, Roundtime};
use crate::core::types::EntityId;
use crate::combat::engagement::release_trackers;
use crate::ecs::{ComponentKind, Engine, EngineExt};
use crate::inventory::discard_belongings;
use crate::messaging::{Message, MessageSink};
use crate::systems::System;

#[derive(Debug, Default)]
pub struct TimerSystem {
    expired_logouts: Vec<EntityId>,
}

impl TimerSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities removed because their logout timer ran out
    pub fn take_expired(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.expired_logouts)
    }

    fn tick_roundtimes(engine: &mut dyn Engine, dt: f32) {
        for id in engine.entities_with_component(ComponentKind::Roundtime) {
            let done = match engine.component_mut::<Roundtime>(&id) {
                Some(rt) => {
                    rt.remaining -= dt;
                    rt.remaining <= 0.0
                }
                None => false,
            };
            if done {
                engine.remove_component(&id, ComponentKind::Roundtime);
            }
        }
    }

    fn tick_parries(engine: &mut dyn Engine, dt: f32) {
        for id in engine.entities_with_component(ComponentKind::ParryReady) {
            let done = match engine.component_mut::<ParryReady>(&id) {
                Some(parry) => {
                    parry.remaining -= dt;
                    parry.remaining <= 0.0
                }
                None => false,
            };
            if done {
                engine.remove_component(&id, ComponentKind::ParryReady);
            }
        }
    }

    fn tick_logouts(&mut self, engine: &mut dyn Engine, sink: &mut dyn MessageSink, dt: f32) {
        for id in engine.entities_with_component(ComponentKind::LogoutTimer) {
            let done = match engine.component_mut::<LogoutTimer>(&id) {
                Some(timer) => {
                    timer.remaining -= dt;
                    timer.remaining <= 0.0
                }
                None => false,
            };
            if !done {
                continue;
            }
            let name = engine.name_of(&id);
            if let Some(room) = engine.position_of(&id) {
                sink.broadcast(room, &[id.clone()], Message::info(format!("{} fades away.", name)));
            }
            release_trackers(engine, &id);
            let items = discard_belongings(engine, &id);
            engine.remove_entity(&id);
            info!(entity = %id, items, "logout timer expired");
            self.expired_logouts.push(id);
        }
    }
}

impl System for TimerSystem {
    fn name(&self) -> &'static str {
        "timers"
    }

    fn update(&mut self, engine: &mut dyn Engine, sink: &mut dyn MessageSink, dt: f32) {
        Self::tick_roundtimes(engine, dt);
        Self::tick_parries(engine, dt);
        self.tick_logouts(engine, sink, dt);
    }
}
