//! Tick-driven systems
//!
//! Each system owns one slice of behaviour. The game loop calls
//! `update` on every system once per tick; player commands reach the
//! same systems through their handler methods.

pub mod interaction;
pub mod movement;
pub mod npc;
pub mod posture;
pub mod timer;

pub use interaction::InteractionSystem;
pub use movement::{describe_room, MovementSystem};
pub use npc::{NpcAiSystem, NpcIntent};
pub use posture::PostureSystem;
pub use timer::TimerSystem;

use crate::ecs::Engine;
use crate::messaging::MessageSink;

pub trait System {
    fn name(&self) -> &'static str;

    /// Advance this system by `dt` seconds. Systems that only react to
    /// commands keep the default.
    fn update(&mut self, _engine: &mut dyn Engine, _sink: &mut dyn MessageSink, _dt: f32) {}
}
