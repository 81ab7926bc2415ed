//! Game configuration with documented constants
//!
//! All tuning numbers for pacing and combat are collected here. The
//! config is owned by the running `Game` and handed to systems; nothing
//! reads it through a global.

use serde::Deserialize;
use std::path::Path;

use crate::core::error::{MudError, Result};

/// Top-level configuration for the server binary and simulation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed simulation rate. At 10 Hz one tick is 100ms of game time.
    pub tick_rate_hz: u32,

    /// Address the line server binds to
    pub listen_addr: String,

    /// Seed for the combat and NPC random streams
    pub seed: u64,

    /// Seconds a disconnected player lingers before being removed
    pub logout_grace: f32,

    pub combat: CombatConfig,
    pub regen: RegenConfig,
    pub npc: NpcConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 10,
            listen_addr: "127.0.0.1:4000".to_string(),
            seed: 0x5EED_CAFE,
            logout_grace: 30.0,
            combat: CombatConfig::default(),
            regen: RegenConfig::default(),
            npc: NpcConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Seconds of game time covered by a single tick
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate_hz == 0 {
            return Err(MudError::InvalidConfig("tick_rate_hz must be positive".into()));
        }
        self.combat.validate()?;
        if self.regen.interval <= 0.0 {
            return Err(MudError::InvalidConfig("regen.interval must be positive".into()));
        }
        if self.npc.think_interval <= 0.0 {
            return Err(MudError::InvalidConfig("npc.think_interval must be positive".into()));
        }
        Ok(())
    }
}

/// A skill-scaled time cost: `max(floor, base - per_level * level)`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimeCost {
    pub base: f32,
    pub floor: f32,
    pub per_level: f32,
}

impl TimeCost {
    pub const fn new(base: f32, floor: f32, per_level: f32) -> Self {
        Self { base, floor, per_level }
    }

    pub fn for_level(&self, level: u32) -> f32 {
        (self.base - self.per_level * level as f32).max(self.floor)
    }
}

/// Combat pacing and resolution tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === ROUNDTIME ===
    /// Roundtime for a basic attack, scaled by the weapon's skill class
    pub attack_cost: TimeCost,

    /// Roundtime for advance/retreat/close/withdraw, scaled by melee skill
    pub maneuver_cost: TimeCost,

    /// Roundtime for reloading, scaled by the weapon's skill class
    ///
    /// At the defaults an untrained shooter takes 5s, a level 6 shooter
    /// hits the 2s floor.
    pub reload_cost: TimeCost,

    /// Flat roundtime after a flee attempt (success or not)
    pub flee_roundtime: f32,

    /// Roundtime for standing, sitting or lying down
    pub posture_roundtime: f32,

    // === HIT RESOLUTION ===
    /// Hit chance clamps (percent). Nothing is ever certain.
    pub min_hit_chance: f32,
    pub max_hit_chance: f32,

    /// Damage multiplier applied on a critical hit
    pub crit_multiplier: f32,

    /// Damage for an empty-handed strike
    pub unarmed_damage: i32,

    /// Offense lost while hanging back
    pub hangback_offense_penalty: f32,

    /// Defense gained while hanging back
    pub hangback_defense_bonus: f32,

    // === RESOURCES ===
    /// Balance spent on every swing, and again on a miss
    pub balance_per_attack: f32,
    pub balance_per_miss: f32,

    /// Fatigue accumulated per attack (0-100 scale)
    pub fatigue_per_attack: f32,

    /// Momentum earned on a landed hit / crit
    pub momentum_per_hit: u32,
    pub momentum_per_crit: u32,

    // === SPECIALS ===
    /// Momentum required (and consumed) by the draw-and-strike finisher
    pub iaijutsu_momentum_cost: u32,

    /// Damage multiplier for the finisher
    pub iaijutsu_multiplier: f32,

    /// Roundtime for the finisher, replacing the normal attack cost
    pub iaijutsu_roundtime: f32,

    // === DEFENSE ===
    /// How long a reflexive parry stays ready
    pub parry_window: f32,

    /// Balance spent to ready a parry
    pub parry_balance_cost: f32,

    // === MANEUVERS ===
    /// Baseline retreat/withdraw success chance before modifiers (percent)
    pub retreat_base_chance: f32,

    /// Baseline flee success chance before modifiers (percent)
    pub flee_base_chance: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_cost: TimeCost::new(3.0, 1.5, 0.2),
            maneuver_cost: TimeCost::new(2.0, 1.0, 0.1),
            reload_cost: TimeCost::new(5.0, 2.0, 0.5),
            flee_roundtime: 4.0,
            posture_roundtime: 1.0,

            min_hit_chance: 5.0,
            max_hit_chance: 95.0,
            crit_multiplier: 1.5,
            unarmed_damage: 2,
            hangback_offense_penalty: 15.0,
            hangback_defense_bonus: 10.0,

            balance_per_attack: 0.05,
            balance_per_miss: 0.05,
            fatigue_per_attack: 2.0,
            momentum_per_hit: 5,
            momentum_per_crit: 10,

            iaijutsu_momentum_cost: 50,
            iaijutsu_multiplier: 2.5,
            iaijutsu_roundtime: 4.0,

            parry_window: 2.0,
            parry_balance_cost: 0.1,

            retreat_base_chance: 60.0,
            flee_base_chance: 50.0,
        }
    }
}

impl CombatConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, cost) in [
            ("attack_cost", self.attack_cost),
            ("maneuver_cost", self.maneuver_cost),
            ("reload_cost", self.reload_cost),
        ] {
            if cost.floor > cost.base {
                return Err(MudError::InvalidConfig(format!(
                    "{name}: floor ({}) should be <= base ({})",
                    cost.floor, cost.base
                )));
            }
            if cost.floor < 0.0 || cost.per_level < 0.0 {
                return Err(MudError::InvalidConfig(format!(
                    "{name}: floor and per_level must be non-negative"
                )));
            }
        }

        if !(0.0..=100.0).contains(&self.min_hit_chance)
            || !(0.0..=100.0).contains(&self.max_hit_chance)
            || self.min_hit_chance > self.max_hit_chance
        {
            return Err(MudError::InvalidConfig(format!(
                "hit chance clamps out of order: {} .. {}",
                self.min_hit_chance, self.max_hit_chance
            )));
        }

        if self.iaijutsu_multiplier < 1.0 || self.crit_multiplier < 1.0 {
            return Err(MudError::InvalidConfig("damage multipliers must be >= 1.0".into()));
        }

        Ok(())
    }
}

/// Passive recovery on a fixed cadence
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegenConfig {
    /// Seconds between regeneration pulses
    pub interval: f32,
    /// Balance restored per pulse (0.0-1.0 scale)
    pub balance: f32,
    /// Fatigue removed per pulse (0-100 scale)
    pub fatigue: f32,
    /// HP restored per pulse, only while disengaged
    pub hp: i32,
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            interval: 3.0,
            balance: 0.05,
            fatigue: 3.0,
            hp: 1,
        }
    }
}

/// NPC behaviour pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    /// Seconds between decisions for a single NPC
    pub think_interval: f32,
    /// Seconds between flavour barks for a single NPC
    pub bark_interval: f32,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            think_interval: 1.0,
            bark_interval: 45.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_time_cost_respects_floor() {
        let cost = TimeCost::new(5.0, 2.0, 0.5);
        assert_eq!(cost.for_level(0), 5.0);
        assert_eq!(cost.for_level(2), 4.0);
        assert_eq!(cost.for_level(20), 2.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GameConfig::from_toml_str(
            r#"
            tick_rate_hz = 20
            [combat]
            iaijutsu_momentum_cost = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.tick_rate_hz, 20);
        assert_eq!(config.combat.iaijutsu_momentum_cost, 40);
        assert_eq!(config.combat.crit_multiplier, 1.5);
        assert_eq!(config.regen.interval, 3.0);
    }

    #[test]
    fn test_inverted_floor_rejected() {
        let mut config = GameConfig::default();
        config.combat.reload_cost = TimeCost::new(1.0, 3.0, 0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_seconds() {
        let config = GameConfig::default();
        assert!((config.tick_seconds() - 0.1).abs() < 1e-6);
    }
}
