//! ironmud - a multi-player text world on an ECS core with real-time combat

pub mod combat;
pub mod command;
pub mod components;
pub mod content;
pub mod core;
pub mod ecs;
pub mod inventory;
pub mod messaging;
pub mod server;
pub mod simulation;
pub mod systems;
