use serde::{Deserialize, Serialize};

/// Body posture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Posture {
    #[default]
    Standing,
    Sitting,
    Lying,
}

impl Posture {
    pub fn name(self) -> &'static str {
        match self {
            Posture::Standing => "standing",
            Posture::Sitting => "sitting",
            Posture::Lying => "lying down",
        }
    }
}

/// Posture component. Governs movement and some combat eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stance {
    pub current: Posture,
}

/// Marks a player-controlled entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player;

/// NPC behaviour state. Cooldowns are absolute world times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    /// Attacks players on sight
    pub aggressive: bool,
    /// Flavour lines emitted to the room
    pub barks: Vec<String>,
    /// Prefab dropped on death
    pub loot: Option<String>,
    pub next_think_at: f64,
    pub next_bark_at: f64,
}

impl Npc {
    pub fn aggressive() -> Self {
        Self {
            aggressive: true,
            barks: Vec::new(),
            loot: None,
            next_think_at: 0.0,
            next_bark_at: 0.0,
        }
    }

    pub fn passive() -> Self {
        Self {
            aggressive: false,
            ..Self::aggressive()
        }
    }
}

/// Session-only countdown until a disconnected player is removed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogoutTimer {
    pub remaining: f32,
}
