//! Combat state components
//!
//! `CombatStats` is the authoritative combat state of anything that can
//! take damage. Roundtime, momentum and parry readiness are separate
//! components so their absence carries meaning.

use serde::{Deserialize, Serialize};

use crate::components::inventory::WeaponClass;
use crate::core::types::EntityId;

/// Spatial/relational closeness to the tracked opponent, farthest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum EngagementTier {
    #[default]
    Disengaged,
    LongRange,
    Missile,
    Polearm,
    Melee,
    CloseQuarters,
}

/// Coarse classification of a tier. Every "can this act / can this move"
/// guard goes through this one mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierClass {
    Disengaged,
    Ranged,
    Engaged,
}

impl EngagementTier {
    pub fn class(self) -> TierClass {
        match self {
            EngagementTier::Disengaged => TierClass::Disengaged,
            EngagementTier::LongRange | EngagementTier::Missile => TierClass::Ranged,
            EngagementTier::Polearm | EngagementTier::Melee | EngagementTier::CloseQuarters => {
                TierClass::Engaged
            }
        }
    }

    /// Polearm, melee or close quarters
    pub fn is_engaged(self) -> bool {
        self.class() == TierClass::Engaged
    }

    /// Tiers where hand-to-hand weapons reach
    pub fn is_close(self) -> bool {
        matches!(self, EngagementTier::Melee | EngagementTier::CloseQuarters)
    }

    /// One step closer; close quarters is the floor
    pub fn closer(self) -> Self {
        match self {
            EngagementTier::Disengaged => EngagementTier::LongRange,
            EngagementTier::LongRange => EngagementTier::Missile,
            EngagementTier::Missile => EngagementTier::Polearm,
            EngagementTier::Polearm => EngagementTier::Melee,
            EngagementTier::Melee | EngagementTier::CloseQuarters => EngagementTier::CloseQuarters,
        }
    }

    /// One step farther; backing off from long range disengages
    pub fn farther(self) -> Self {
        match self {
            EngagementTier::Disengaged | EngagementTier::LongRange => EngagementTier::Disengaged,
            EngagementTier::Missile => EngagementTier::LongRange,
            EngagementTier::Polearm => EngagementTier::Missile,
            EngagementTier::Melee => EngagementTier::Polearm,
            EngagementTier::CloseQuarters => EngagementTier::Melee,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EngagementTier::Disengaged => "disengaged",
            EngagementTier::LongRange => "at long range",
            EngagementTier::Missile => "at missile range",
            EngagementTier::Polearm => "at polearm range",
            EngagementTier::Melee => "at melee range",
            EngagementTier::CloseQuarters => "in close quarters",
        }
    }
}

/// Called-shot target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Limb {
    Head,
    Torso,
    Arms,
    Legs,
}

impl Limb {
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "head" => Some(Limb::Head),
            "torso" | "chest" | "body" => Some(Limb::Torso),
            "arm" | "arms" => Some(Limb::Arms),
            "leg" | "legs" => Some(Limb::Legs),
            _ => None,
        }
    }

    /// Penalty to hit when calling this limb
    pub fn aim_penalty(self) -> f32 {
        match self {
            Limb::Head => 20.0,
            Limb::Torso => 0.0,
            Limb::Arms | Limb::Legs => 10.0,
        }
    }

    /// Extra critical window (percent) for hard-to-hit vitals
    pub fn crit_bonus(self) -> f32 {
        match self {
            Limb::Head => 10.0,
            Limb::Torso => 0.0,
            Limb::Arms | Limb::Legs => 2.0,
        }
    }

    pub fn damage_multiplier(self) -> f32 {
        match self {
            Limb::Head => 1.5,
            Limb::Torso => 1.0,
            Limb::Arms => 0.8,
            Limb::Legs => 0.9,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Limb::Head => "head",
            Limb::Torso => "torso",
            Limb::Arms => "arms",
            Limb::Legs => "legs",
        }
    }
}

/// Authoritative combat state of a combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    /// Evasion + parry + shield never exceeds 100
    pub evasion: u32,
    pub parry: u32,
    pub shield: u32,
    pub base_evasion: u32,
    pub base_parry: u32,
    pub base_shield: u32,
    /// 0.0 (passive) to 1.0 (all-out)
    pub aggression: f32,
    pub base_aggression: f32,
    pub engagement_tier: EngagementTier,
    pub target_id: Option<EntityId>,
    pub is_hostile: bool,
    pub is_hanging_back: bool,
    pub target_limb: Option<Limb>,
    /// 0.0 (off balance) to 1.0 (perfectly set)
    pub balance: f32,
    /// 0 (fresh) to 100 (spent)
    pub fatigue: f32,
}

/// Upper bound on the evasion/parry/shield split
pub const DEFENSE_BUDGET: u32 = 100;

impl CombatStats {
    pub fn new(max_hp: i32, attack: i32, defense: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            attack,
            defense,
            evasion: 34,
            parry: 33,
            shield: 33,
            base_evasion: 34,
            base_parry: 33,
            base_shield: 33,
            aggression: 0.5,
            base_aggression: 0.5,
            engagement_tier: EngagementTier::Disengaged,
            target_id: None,
            is_hostile: false,
            is_hanging_back: false,
            target_limb: None,
            balance: 1.0,
            fatigue: 0.0,
        }
    }

    pub fn hostile(mut self) -> Self {
        self.is_hostile = true;
        self
    }

    pub fn with_defenses(mut self, evasion: u32, parry: u32, shield: u32) -> Self {
        self.evasion = evasion;
        self.parry = parry;
        self.shield = shield;
        self.base_evasion = evasion;
        self.base_parry = parry;
        self.base_shield = shield;
        self
    }

    pub fn defense_total(&self) -> u32 {
        self.evasion
            .saturating_add(self.parry)
            .saturating_add(self.shield)
    }

    /// Out of the fight until healed
    pub fn is_down(&self) -> bool {
        self.hp <= 0
    }

    /// Drop back to disengaged and forget the tracked opponent
    pub fn disengage(&mut self) {
        self.engagement_tier = EngagementTier::Disengaged;
        self.target_id = None;
    }

    /// Put evasion/parry/shield back to the stored baseline
    pub fn reset_defenses(&mut self) {
        self.evasion = self.base_evasion;
        self.parry = self.base_parry;
        self.shield = self.base_shield;
        self.aggression = self.base_aggression;
    }

    pub fn spend_balance(&mut self, amount: f32) {
        self.balance = (self.balance - amount).clamp(0.0, 1.0);
    }

    pub fn recover_balance(&mut self, amount: f32) {
        self.balance = (self.balance + amount).clamp(0.0, 1.0);
    }

    pub fn add_fatigue(&mut self, amount: f32) {
        self.fatigue = (self.fatigue + amount).clamp(0.0, 100.0);
    }

    pub fn recover_fatigue(&mut self, amount: f32) {
        self.fatigue = (self.fatigue - amount).max(0.0);
    }

    pub fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Apply damage; returns true if this blow took the combatant down
    pub fn take_damage(&mut self, amount: i32) -> bool {
        let was_up = !self.is_down();
        self.hp -= amount.max(0);
        was_up && self.is_down()
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        (self.hp.max(0) as f32 / self.max_hp as f32).clamp(0.0, 1.0)
    }
}

/// Action gate. While present with `remaining > 0` the entity cannot
/// initiate gated actions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roundtime {
    pub remaining: f32,
}

impl Roundtime {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }
}

/// Class resource spent by finishing moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Momentum {
    pub current: u32,
    pub max: u32,
}

impl Default for Momentum {
    fn default() -> Self {
        Self { current: 0, max: 100 }
    }
}

impl Momentum {
    pub fn gain(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }

    /// Spend `amount`. Does nothing and returns false if short; callers
    /// check thresholds before committing.
    pub fn consume(&mut self, amount: u32) -> bool {
        if self.current < amount {
            return false;
        }
        self.current -= amount;
        true
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

/// A readied reflexive parry, consumed by the next melee attack
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParryReady {
    pub remaining: f32,
}

/// Trained weapon skill levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub light_weapons: u32,
    pub medium_weapons: u32,
    pub heavy_weapons: u32,
    /// Footwork; scales maneuver costs
    pub melee: u32,
}

impl Skills {
    pub fn level_for(&self, class: WeaponClass) -> u32 {
        match class {
            WeaponClass::Light => self.light_weapons,
            WeaponClass::Medium => self.medium_weapons,
            WeaponClass::Heavy => self.heavy_weapons,
        }
    }
}
