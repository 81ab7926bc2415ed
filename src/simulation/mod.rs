//! The running game: world, systems and the command boundary

pub mod game;

pub use game::Game;
