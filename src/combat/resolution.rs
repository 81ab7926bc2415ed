//! Hit resolution
//!
//! Pure functions: ratings in, outcome out. Rolls are passed in so the
//! numbers can be checked without randomness.

use serde::Serialize;

use crate::components::{CombatStats, Limb, Posture};
use crate::core::config::CombatConfig;
use crate::combat::action::AttackMove;

/// How the defender avoided a blow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefenseUsed {
    Evade,
    Parry,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "result", content = "defense")]
pub enum HitOutcome {
    Crit,
    Hit,
    Miss(DefenseUsed),
}

impl HitOutcome {
    pub fn landed(self) -> bool {
        matches!(self, HitOutcome::Crit | HitOutcome::Hit)
    }

    pub fn label(self) -> &'static str {
        match self {
            HitOutcome::Crit => "crit",
            HitOutcome::Hit => "hit",
            HitOutcome::Miss(_) => "miss",
        }
    }
}

fn posture_offense_penalty(posture: Posture) -> f32 {
    match posture {
        Posture::Standing => 0.0,
        Posture::Sitting => 10.0,
        Posture::Lying => 25.0,
    }
}

fn posture_defense_penalty(posture: Posture) -> f32 {
    match posture {
        Posture::Standing => 0.0,
        Posture::Sitting => 10.0,
        Posture::Lying => 20.0,
    }
}

/// Attacker's offense for one strike
pub fn offense_rating(
    stats: &CombatStats,
    posture: Posture,
    attack_move: AttackMove,
    config: &CombatConfig,
) -> f32 {
    let mut offense = stats.attack as f32;
    offense += stats.aggression * 20.0;
    offense -= stats.fatigue * 0.2;
    offense += attack_move.accuracy();
    offense -= posture_offense_penalty(posture);
    if stats.is_hanging_back {
        offense -= config.hangback_offense_penalty;
    }
    if let Some(limb) = stats.target_limb {
        offense -= limb.aim_penalty();
    }
    offense
}

/// Defender's avoidance. The evasion/parry/shield split only counts as
/// far as the defender is balanced.
pub fn defense_rating(stats: &CombatStats, posture: Posture, config: &CombatConfig) -> f32 {
    let split = stats.evasion as f32 * 0.30 + stats.parry as f32 * 0.25 + stats.shield as f32 * 0.35;
    let mut defense = stats.defense as f32 + split * stats.balance;
    defense -= posture_defense_penalty(posture);
    if stats.is_hanging_back {
        defense += config.hangback_defense_bonus;
    }
    defense
}

/// Percent chance to land, clamped to the configured window
pub fn hit_chance(offense: f32, defense: f32, config: &CombatConfig) -> f32 {
    (50.0 + offense - defense).clamp(config.min_hit_chance, config.max_hit_chance)
}

/// Low rolls inside this window are critical
pub fn crit_window(chance: f32, limb: Option<Limb>) -> f32 {
    chance / 10.0 + limb.map(Limb::crit_bonus).unwrap_or(0.0)
}

/// Which defense turned the blow aside, weighted by the defender's split.
/// `pick` is uniform in [0, 1).
pub fn pick_defense(stats: &CombatStats, pick: f32) -> DefenseUsed {
    let total = stats.defense_total();
    if total == 0 {
        return DefenseUsed::Evade;
    }
    let point = pick.clamp(0.0, 0.999_999) * total as f32;
    if point < stats.evasion as f32 {
        DefenseUsed::Evade
    } else if point < (stats.evasion + stats.parry) as f32 {
        DefenseUsed::Parry
    } else {
        DefenseUsed::Block
    }
}

/// `roll` is uniform in [0, 100)
pub fn resolve_roll(chance: f32, crit_window: f32, roll: f32, defense: DefenseUsed) -> HitOutcome {
    if roll < crit_window.min(chance) {
        HitOutcome::Crit
    } else if roll < chance {
        HitOutcome::Hit
    } else {
        HitOutcome::Miss(defense)
    }
}

/// Final HP loss. Landed blows always do at least 1.
pub fn damage(
    base: i32,
    attack: i32,
    outcome: HitOutcome,
    multiplier: f32,
    limb: Option<Limb>,
    config: &CombatConfig,
) -> i32 {
    let raw = match outcome {
        HitOutcome::Miss(_) => return 0,
        HitOutcome::Hit => (base + attack / 5) as f32,
        HitOutcome::Crit => (base + attack / 5) as f32 * config.crit_multiplier,
    };
    let limb_factor = limb.map(Limb::damage_multiplier).unwrap_or(1.0);
    ((raw * multiplier * limb_factor).round() as i32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CombatConfig {
        CombatConfig::default()
    }

    #[test]
    fn test_hit_chance_clamped() {
        let cfg = config();
        assert_eq!(hit_chance(500.0, 0.0, &cfg), cfg.max_hit_chance);
        assert_eq!(hit_chance(0.0, 500.0, &cfg), cfg.min_hit_chance);
        assert_eq!(hit_chance(10.0, 10.0, &cfg), 50.0);
    }

    #[test]
    fn test_roll_bands() {
        assert_eq!(resolve_roll(60.0, 6.0, 2.0, DefenseUsed::Evade), HitOutcome::Crit);
        assert_eq!(resolve_roll(60.0, 6.0, 30.0, DefenseUsed::Evade), HitOutcome::Hit);
        assert_eq!(
            resolve_roll(60.0, 6.0, 75.0, DefenseUsed::Parry),
            HitOutcome::Miss(DefenseUsed::Parry)
        );
    }

    #[test]
    fn test_crit_never_exceeds_hit_chance() {
        assert_eq!(resolve_roll(5.0, 15.0, 7.0, DefenseUsed::Evade), HitOutcome::Miss(DefenseUsed::Evade));
    }

    #[test]
    fn test_hangback_trades_offense_for_defense() {
        let cfg = config();
        let mut stats = CombatStats::new(30, 10, 10);
        let off = offense_rating(&stats, Posture::Standing, AttackMove::Slash, &cfg);
        let def = defense_rating(&stats, Posture::Standing, &cfg);
        stats.is_hanging_back = true;
        assert!(offense_rating(&stats, Posture::Standing, AttackMove::Slash, &cfg) < off);
        assert!(defense_rating(&stats, Posture::Standing, &cfg) > def);
    }

    #[test]
    fn test_called_head_shot_harder_but_deadlier() {
        let cfg = config();
        let mut stats = CombatStats::new(30, 10, 10);
        let plain = offense_rating(&stats, Posture::Standing, AttackMove::Slash, &cfg);
        stats.target_limb = Some(Limb::Head);
        assert!(offense_rating(&stats, Posture::Standing, AttackMove::Slash, &cfg) < plain);
        assert!(crit_window(50.0, Some(Limb::Head)) > crit_window(50.0, None));
        assert!(
            damage(10, 0, HitOutcome::Hit, 1.0, Some(Limb::Head), &cfg)
                > damage(10, 0, HitOutcome::Hit, 1.0, None, &cfg)
        );
    }

    #[test]
    fn test_off_balance_defender_is_easier_to_hit() {
        let cfg = config();
        let mut stats = CombatStats::new(30, 10, 10);
        let set = defense_rating(&stats, Posture::Standing, &cfg);
        stats.balance = 0.2;
        assert!(defense_rating(&stats, Posture::Standing, &cfg) < set);
    }

    #[test]
    fn test_pick_defense_weighted() {
        let stats = CombatStats::new(10, 1, 1).with_defenses(50, 30, 20);
        assert_eq!(pick_defense(&stats, 0.1), DefenseUsed::Evade);
        assert_eq!(pick_defense(&stats, 0.6), DefenseUsed::Parry);
        assert_eq!(pick_defense(&stats, 0.95), DefenseUsed::Block);

        let bare = CombatStats::new(10, 1, 1).with_defenses(0, 0, 0);
        assert_eq!(pick_defense(&bare, 0.5), DefenseUsed::Evade);
    }

    #[test]
    fn test_damage_scaling() {
        let cfg = config();
        assert_eq!(damage(10, 10, HitOutcome::Miss(DefenseUsed::Evade), 1.0, None, &cfg), 0);
        assert_eq!(damage(10, 10, HitOutcome::Hit, 1.0, None, &cfg), 12);
        assert_eq!(damage(10, 10, HitOutcome::Hit, 2.5, None, &cfg), 30);
        assert_eq!(damage(10, 10, HitOutcome::Crit, 1.0, None, &cfg), 18);
        assert_eq!(damage(0, 0, HitOutcome::Hit, 0.1, None, &cfg), 1);
    }
}
