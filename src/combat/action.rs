//! Player-facing combat verbs as data
//!
//! `CombatAction` is everything a combatant can do in one step.
//! `CombatCommand` adds the meta verbs that drive automation, so an
//! automated step can never itself start or stop automation.

use serde::{Deserialize, Serialize};

use crate::components::{Limb, WeaponCategory};
use crate::core::types::EntityId;

/// How an action names its target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRef {
    /// Whoever the actor is already tracking
    Current,
    /// Name or keyword with optional ordinal ("2.goblin", "second goblin")
    Name(String),
    /// Exact entity (NPC AI)
    Id(EntityId),
}

impl TargetRef {
    pub fn from_words(words: &str) -> Self {
        let words = words.trim();
        if words.is_empty() {
            TargetRef::Current
        } else {
            TargetRef::Name(words.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackMove {
    Slash,
    Thrust,
    Bash,
    Punch,
    Kick,
    Shoot,
}

impl AttackMove {
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "slash" => Some(AttackMove::Slash),
            "thrust" | "stab" => Some(AttackMove::Thrust),
            "bash" => Some(AttackMove::Bash),
            "punch" => Some(AttackMove::Punch),
            "kick" => Some(AttackMove::Kick),
            "shoot" | "fire" => Some(AttackMove::Shoot),
            _ => None,
        }
    }

    /// Natural move for a weapon category
    pub fn default_for(category: Option<WeaponCategory>, ranged: bool) -> Self {
        if ranged {
            return AttackMove::Shoot;
        }
        match category {
            None | Some(WeaponCategory::Unarmed) => AttackMove::Punch,
            Some(WeaponCategory::Knife) | Some(WeaponCategory::Polearm) => AttackMove::Thrust,
            Some(WeaponCategory::Mace) => AttackMove::Bash,
            Some(_) => AttackMove::Slash,
        }
    }

    /// Strikes that don't use the wielded weapon
    pub fn is_unarmed(self) -> bool {
        matches!(self, AttackMove::Punch | AttackMove::Kick)
    }

    pub fn accuracy(self) -> f32 {
        match self {
            AttackMove::Thrust | AttackMove::Punch => 5.0,
            AttackMove::Slash | AttackMove::Shoot => 0.0,
            AttackMove::Bash | AttackMove::Kick => -5.0,
        }
    }

    pub fn damage_multiplier(self) -> f32 {
        match self {
            AttackMove::Slash | AttackMove::Shoot => 1.0,
            AttackMove::Thrust => 0.9,
            AttackMove::Bash => 1.1,
            AttackMove::Punch => 1.0,
            AttackMove::Kick => 1.3,
        }
    }

    /// Extra roundtime on top of the weapon's base cost
    pub fn extra_roundtime(self) -> f32 {
        match self {
            AttackMove::Kick => 1.0,
            AttackMove::Bash => 0.5,
            _ => 0.0,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            AttackMove::Slash => "slash",
            AttackMove::Thrust => "thrust",
            AttackMove::Bash => "bash",
            AttackMove::Punch => "punch",
            AttackMove::Kick => "kick",
            AttackMove::Shoot => "fire",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StancePreset {
    Offensive,
    Neutral,
    Defensive,
    Evasive,
    Guarded,
}

impl StancePreset {
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "offensive" | "offense" => Some(StancePreset::Offensive),
            "neutral" => Some(StancePreset::Neutral),
            "defensive" | "defense" => Some(StancePreset::Defensive),
            "evasive" | "evasion" => Some(StancePreset::Evasive),
            "guarded" | "shield" => Some(StancePreset::Guarded),
            _ => None,
        }
    }

    /// (evasion, parry, shield, aggression)
    pub fn values(self) -> (u32, u32, u32, f32) {
        match self {
            StancePreset::Offensive => (20, 15, 10, 0.9),
            StancePreset::Neutral => (34, 33, 33, 0.5),
            StancePreset::Defensive => (40, 35, 25, 0.2),
            StancePreset::Evasive => (70, 20, 10, 0.4),
            StancePreset::Guarded => (10, 30, 60, 0.3),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StancePreset::Offensive => "offensive",
            StancePreset::Neutral => "neutral",
            StancePreset::Defensive => "defensive",
            StancePreset::Evasive => "evasive",
            StancePreset::Guarded => "guarded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StanceRequest {
    Show,
    /// Back to the last custom split
    Reset,
    Preset(StancePreset),
    Custom {
        evasion: u32,
        parry: u32,
        shield: u32,
        aggression: Option<f32>,
    },
}

/// What `target` was asked to aim at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRequest {
    Limb(Limb),
    ClearLimb,
    Combatant(TargetRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatAction {
    Attack {
        target: TargetRef,
        attack_move: Option<AttackMove>,
    },
    Reload,
    CheckAmmo,
    Advance {
        target: TargetRef,
    },
    Retreat,
    Close,
    Withdraw,
    Flee,
    Iaijutsu {
        target: TargetRef,
    },
    Parry,
    Stance(StanceRequest),
    Hangback,
    Target(TargetRequest),
    Assess,
    Appraise {
        target: TargetRef,
    },
}

impl CombatAction {
    pub fn attack(target: &str) -> Self {
        CombatAction::Attack {
            target: TargetRef::from_words(target),
            attack_move: None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CombatAction::Attack { .. } => "attack",
            CombatAction::Reload => "reload",
            CombatAction::CheckAmmo => "check ammo",
            CombatAction::Advance { .. } => "advance",
            CombatAction::Retreat => "retreat",
            CombatAction::Close => "close",
            CombatAction::Withdraw => "withdraw",
            CombatAction::Flee => "flee",
            CombatAction::Iaijutsu { .. } => "iaijutsu",
            CombatAction::Parry => "parry",
            CombatAction::Stance(_) => "stance",
            CombatAction::Hangback => "hangback",
            CombatAction::Target(_) => "target",
            CombatAction::Assess => "assess",
            CombatAction::Appraise { .. } => "appraise",
        }
    }

    /// Whether performing this leaves the actor in roundtime. Only these
    /// can be repeated by automation.
    pub fn takes_roundtime(&self) -> bool {
        matches!(
            self,
            CombatAction::Attack { .. }
                | CombatAction::Reload
                | CombatAction::Advance { .. }
                | CombatAction::Retreat
                | CombatAction::Close
                | CombatAction::Withdraw
                | CombatAction::Flee
                | CombatAction::Iaijutsu { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatCommand {
    Act(CombatAction),
    /// Repeat an action every time roundtime clears
    Automate(CombatAction),
    /// Store a sequence for `execute`
    SetBuffer(Vec<CombatAction>),
    ExecuteBuffer,
    Stop,
}

/// Did the handler do anything?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Performed,
    Rejected,
}

impl ActionOutcome {
    pub fn performed(self) -> bool {
        self == ActionOutcome::Performed
    }
}
