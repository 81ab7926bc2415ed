//! Prefab catalog
//!
//! A prefab is a named list of components plus the gear spawned with it.
//! The built-in catalog covers the stock weapons, ammo, containers and
//! NPC templates; more can be loaded from TOML.

use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::components::{
    CombatStats, Container, Identity, Inventory, Item, Magazine, Momentum, Npc, Position, Skills,
    Weapon, WeaponCategory, BACKPACK_SLOT,
};
use crate::core::error::{MudError, Result};
use crate::core::types::{EntityId, GridPos};
use crate::ecs::{Component, Engine, EngineExt, Entity};
use crate::inventory::{equip, put_in_hand, stow};

/// Where a piece of gear goes on the entity that carries it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Hand,
    /// Equipment slot
    Slot(String),
    /// Inside the container equipped in this slot
    Inside(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gear {
    pub prefab: String,
    pub placement: Placement,
}

impl Gear {
    pub fn new(prefab: &str, placement: Placement) -> Self {
        Self {
            prefab: prefab.to_string(),
            placement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefab {
    pub name: String,
    pub components: Vec<Component>,
    #[serde(default)]
    pub gear: Vec<Gear>,
}

impl Prefab {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            components: Vec::new(),
            gear: Vec::new(),
        }
    }

    pub fn with(mut self, component: impl Into<Component>) -> Self {
        self.components.push(component.into());
        self
    }

    pub fn carrying(mut self, prefab: &str, placement: Placement) -> Self {
        self.gear.push(Gear::new(prefab, placement));
        self
    }
}

#[derive(Debug, Deserialize)]
struct PrefabFile {
    #[serde(default)]
    prefab: Vec<Prefab>,
}

#[derive(Debug, Clone, Default)]
pub struct Prefabs {
    by_name: AHashMap<String, Prefab>,
}

impl Prefabs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prefab, replacing any with the same name
    pub fn register(&mut self, prefab: Prefab) {
        self.by_name.insert(prefab.name.to_lowercase(), prefab);
    }

    pub fn get(&self, name: &str) -> Option<&Prefab> {
        self.by_name.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Add every `[[prefab]]` table in a TOML document. Returns how many
    /// were registered.
    pub fn extend_from_toml(&mut self, text: &str) -> Result<usize> {
        let file: PrefabFile = toml::from_str(text)?;
        let count = file.prefab.len();
        for prefab in file.prefab {
            self.register(prefab);
        }
        Ok(count)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let text = std::fs::read_to_string(path)?;
        let count = self.extend_from_toml(&text)?;
        info!(path = %path.display(), count, "loaded prefabs");
        Ok(count)
    }

    /// A fresh, unplaced entity built from the named prefab. Gear is not
    /// spawned; use `spawn` for that.
    pub fn instantiate(&self, name: &str) -> Result<Entity> {
        let prefab = self
            .get(name)
            .ok_or_else(|| MudError::PrefabNotFound(name.to_string()))?;
        let mut entity = Entity::new(EntityId::generate());
        for component in &prefab.components {
            entity.add_component(component.clone());
        }
        Ok(entity)
    }

    /// Spawn the named prefab with its gear. `pos` of `None` leaves the
    /// entity unplaced, ready to be carried.
    pub fn spawn(&self, engine: &mut dyn Engine, name: &str, pos: Option<GridPos>) -> Result<EntityId> {
        let mut entity = self.instantiate(name)?;
        if let Some(pos) = pos {
            entity.add_component(Position::from(pos));
        }
        let id = entity.id().clone();
        engine.add_entity(entity)?;

        let gear = self.get(name).map(|p| p.gear.clone()).unwrap_or_default();
        self.outfit(engine, &id, &gear)?;
        debug!(id = %id, prefab = name, "spawned prefab");
        Ok(id)
    }

    /// Spawn each piece of gear and put it where it belongs on `owner`
    pub fn outfit(&self, engine: &mut dyn Engine, owner: &EntityId, gear: &[Gear]) -> Result<()> {
        for piece in gear {
            let item = self.spawn(engine, &piece.prefab, None)?;
            let placed = match &piece.placement {
                Placement::Hand => put_in_hand(engine, owner, &item)?,
                Placement::Slot(slot) => {
                    equip(engine, owner, slot, &item)?;
                    true
                }
                Placement::Inside(slot) => {
                    let container = engine
                        .component::<Inventory>(owner)
                        .and_then(|inv| inv.equipment.get(slot).cloned());
                    match container {
                        Some(container) => stow(engine, &container, &item)?,
                        None => false,
                    }
                }
            };
            if !placed {
                engine.remove_entity(&item);
                return Err(MudError::InvalidPrefab(format!(
                    "{} has no room for {} ({:?})",
                    owner, piece.prefab, piece.placement
                )));
            }
        }
        Ok(())
    }

    /// The stock catalog
    pub fn builtin() -> Self {
        let mut prefabs = Self::new();
        for prefab in builtin_prefabs() {
            prefabs.register(prefab);
        }
        prefabs
    }
}

fn item(name: &str, keywords: &[&str], weight: f32) -> Prefab {
    Prefab::new(name)
        .with(Identity::new(name).with_keywords(keywords))
        .with(Item::new(name, weight))
}

fn loaded(mut weapon: Weapon) -> Weapon {
    weapon.current_ammo = weapon.mag_size;
    weapon
}

fn builtin_prefabs() -> Vec<Prefab> {
    vec![
        // weapons
        item("rusty knife", &["knife"], 0.5)
            .with(Weapon::melee("rusty knife", WeaponCategory::Knife, 6)),
        item("katana", &["sword", "blade"], 1.5)
            .with(Weapon::melee("katana", WeaponCategory::Katana, 12)),
        item("iron mace", &["mace"], 3.0)
            .with(Weapon::melee("iron mace", WeaponCategory::Mace, 11)),
        item("guard spear", &["spear", "polearm"], 3.5)
            .with(Weapon::melee("guard spear", WeaponCategory::Polearm, 10)),
        item("9mm pistol", &["pistol", "gun"], 1.0).with(
            loaded(Weapon::ranged("9mm pistol", WeaponCategory::Pistol, 5, 12, "9mm", 8))
                .with_magazine_type("9mm magazine"),
        ),
        item("hunting rifle", &["rifle", "gun"], 4.0).with(loaded(Weapon::ranged(
            "hunting rifle",
            WeaponCategory::Rifle,
            8,
            5,
            "7.62mm",
            14,
        ))),
        // ammunition
        item("9mm magazine", &["magazine", "mag"], 0.5).with(Magazine {
            name: "9mm magazine".to_string(),
            ammo_type: "9mm".to_string(),
            current_ammo: 12,
        }),
        Prefab::new("box of 7.62mm rounds")
            .with(Identity::new("box of 7.62mm rounds").with_keywords(&["box", "rounds", "ammo"]))
            .with(
                Item::new("box of 7.62mm rounds", 0.4)
                    .with_quantity(3)
                    .with_attribute("ammo_type", "7.62mm"),
            ),
        // containers
        item("ammo belt", &["belt"], 0.5)
            .with(Container::new(4.0)),
        item("backpack", &["pack"], 1.0)
            .with(Container::new(20.0)),
        // loot
        item("goblin ear", &["ear", "trophy"], 0.1),
        // npcs
        npc("goblin", &["gob"], 30, 8, 6, true)
            .with(Npc {
                barks: vec![
                    "snarls and bares its teeth.".to_string(),
                    "mutters something about shiny things.".to_string(),
                ],
                loot: Some("goblin ear".to_string()),
                ..Npc::aggressive()
            })
            .carrying("rusty knife", Placement::Hand),
        npc("bandit", &["raider"], 45, 10, 8, true)
            .with(Npc {
                barks: vec!["checks the street with a nervous glance.".to_string()],
                loot: Some("9mm magazine".to_string()),
                ..Npc::aggressive()
            })
            .carrying("9mm pistol", Placement::Hand)
            .carrying("ammo belt", Placement::Slot("belt".to_string()))
            .carrying("9mm magazine", Placement::Inside("belt".to_string())),
        npc("ronin", &["swordsman"], 60, 14, 12, false)
            .with(Npc::passive())
            .with(Skills {
                medium_weapons: 5,
                melee: 3,
                ..Skills::default()
            })
            .carrying("katana", Placement::Hand),
        npc("sewer rat", &["rat"], 8, 3, 2, false)
            .with(Npc {
                barks: vec!["squeaks.".to_string()],
                ..Npc::passive()
            }),
    ]
}

fn npc(name: &str, keywords: &[&str], hp: i32, attack: i32, defense: i32, hostile: bool) -> Prefab {
    let stats = CombatStats::new(hp, attack, defense);
    Prefab::new(name)
        .with(Identity::new(name).with_keywords(keywords))
        .with(if hostile { stats.hostile() } else { stats })
        .with(Inventory::default())
        .with(Momentum::default())
}

/// Gear every new player starts with
pub fn starter_kit() -> Vec<Gear> {
    vec![
        Gear::new("9mm pistol", Placement::Hand),
        Gear::new("ammo belt", Placement::Slot("belt".to_string())),
        Gear::new("9mm magazine", Placement::Inside("belt".to_string())),
        Gear::new("backpack", Placement::Slot(BACKPACK_SLOT.to_string())),
        Gear::new("9mm magazine", Placement::Inside(BACKPACK_SLOT.to_string())),
        Gear::new("katana", Placement::Inside(BACKPACK_SLOT.to_string())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::World;

    #[test]
    fn test_unknown_prefab() {
        let prefabs = Prefabs::builtin();
        assert!(matches!(
            prefabs.instantiate("dragon"),
            Err(MudError::PrefabNotFound(name)) if name == "dragon"
        ));
    }

    #[test]
    fn test_instantiate_gives_fresh_ids() {
        let prefabs = Prefabs::builtin();
        let a = prefabs.instantiate("9mm magazine").unwrap();
        let b = prefabs.instantiate("9mm magazine").unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.get::<Magazine>().unwrap().current_ammo, 12);
        assert!(a.get::<Position>().is_none());
    }

    #[test]
    fn test_spawn_npc_with_gear() {
        let prefabs = Prefabs::builtin();
        let mut world = World::new();
        let bandit = prefabs
            .spawn(&mut world, "bandit", Some(GridPos::new(1, 1)))
            .unwrap();

        assert_eq!(world.position_of(&bandit), Some(GridPos::new(1, 1)));
        let inv = world.component::<Inventory>(&bandit).unwrap().clone();
        let pistol = inv.right_hand.clone().unwrap();
        assert_eq!(world.component::<Weapon>(&pistol).unwrap().current_ammo, 12);
        assert!(world.position_of(&pistol).is_none());

        let belt = inv.equipment.get("belt").unwrap();
        let bag = world.component::<Container>(belt).unwrap();
        assert_eq!(bag.items.len(), 1);
        assert!((bag.current_weight - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_gear_without_container_is_rejected() {
        let mut prefabs = Prefabs::builtin();
        prefabs.register(
            npc("broken", &[], 10, 1, 1, false).carrying("9mm magazine", Placement::Inside("belt".into())),
        );
        let mut world = World::new();
        let result = prefabs.spawn(&mut world, "broken", Some(GridPos::new(0, 0)));
        assert!(matches!(result, Err(MudError::InvalidPrefab(_))));
    }

    #[test]
    fn test_load_from_toml() {
        let text = r#"
            [[prefab]]
            name = "ration"

            [[prefab.components]]
            kind = "Identity"
            data = { name = "ration", keywords = ["food"] }

            [[prefab.components]]
            kind = "Item"
            data = { name = "ration", weight = 0.25, quantity = 2, attributes = {} }
        "#;
        let mut prefabs = Prefabs::new();
        assert_eq!(prefabs.extend_from_toml(text).unwrap(), 1);
        let ration = prefabs.instantiate("Ration").unwrap();
        assert_eq!(ration.get::<Item>().unwrap().quantity, 2);
        assert!(ration.get::<Identity>().unwrap().matches("food"));
    }
}
