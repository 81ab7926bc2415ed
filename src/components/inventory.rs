//! Inventory, item and weapon components
//!
//! Weapon properties follow the "one weapon = one category" model: the
//! category decides skill class, reach and whether the weapon needs ammo.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::EntityId;

/// Equipment slot that holds the backpack. Reload searches it last.
pub const BACKPACK_SLOT: &str = "back";

/// Hands plus named equipment slots. Every id appears in at most one
/// hand, slot or container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub left_hand: Option<EntityId>,
    pub right_hand: Option<EntityId>,
    pub equipment: BTreeMap<String, EntityId>,
}

impl Inventory {
    pub fn holds(&self, id: &EntityId) -> bool {
        self.left_hand.as_ref() == Some(id)
            || self.right_hand.as_ref() == Some(id)
            || self.equipment.values().any(|e| e == id)
    }

    pub fn hands(&self) -> impl Iterator<Item = &EntityId> {
        self.right_hand.iter().chain(self.left_hand.iter())
    }

    /// Clear `id` from whichever hand or slot holds it
    pub fn release(&mut self, id: &EntityId) -> bool {
        if self.right_hand.as_ref() == Some(id) {
            self.right_hand = None;
            return true;
        }
        if self.left_hand.as_ref() == Some(id) {
            self.left_hand = None;
            return true;
        }
        let slot = self
            .equipment
            .iter()
            .find(|(_, e)| *e == id)
            .map(|(slot, _)| slot.clone());
        match slot {
            Some(slot) => {
                self.equipment.remove(&slot);
                true
            }
            None => false,
        }
    }
}

/// Generic item data. `weight` is per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub weight: f32,
    pub quantity: u32,
    pub slot: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl Item {
    pub fn new(name: impl Into<String>, weight: f32) -> Self {
        Self {
            name: name.into(),
            weight,
            quantity: 1,
            slot: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_slot(mut self, slot: &str) -> Self {
        self.slot = Some(slot.to_string());
        self
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn total_weight(&self) -> f32 {
        self.weight * self.quantity as f32
    }

    /// Ammo type of a loose-ammo item without a `Magazine` component
    pub fn ammo_type(&self) -> Option<&str> {
        self.attributes.get("ammo_type").map(String::as_str)
    }
}

/// Holds item ids; `current_weight` always equals the sum of contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub items: Vec<EntityId>,
    pub current_weight: f32,
    pub max_weight: f32,
}

impl Container {
    pub fn new(max_weight: f32) -> Self {
        Self {
            items: Vec::new(),
            current_weight: 0.0,
            max_weight,
        }
    }

    pub fn has_room_for(&self, weight: f32) -> bool {
        self.current_weight + weight <= self.max_weight + f32::EPSILON
    }
}

/// A charge of ammunition, usually stacked via `Item::quantity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Magazine {
    pub name: String,
    pub ammo_type: String,
    pub current_ammo: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponCategory {
    Unarmed,
    Knife,
    Sword,
    Katana,
    Axe,
    Mace,
    Polearm,
    Pistol,
    Smg,
    Rifle,
    Shotgun,
    MachineGun,
    Launcher,
}

/// Skill bucket a weapon trains and draws on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponClass {
    Light,
    Medium,
    Heavy,
}

impl WeaponCategory {
    pub fn class(self) -> WeaponClass {
        match self {
            WeaponCategory::Unarmed
            | WeaponCategory::Knife
            | WeaponCategory::Pistol
            | WeaponCategory::Smg => WeaponClass::Light,
            WeaponCategory::Sword
            | WeaponCategory::Katana
            | WeaponCategory::Axe
            | WeaponCategory::Mace
            | WeaponCategory::Rifle
            | WeaponCategory::Shotgun => WeaponClass::Medium,
            WeaponCategory::Polearm | WeaponCategory::MachineGun | WeaponCategory::Launcher => {
                WeaponClass::Heavy
            }
        }
    }

    pub fn parse(word: &str) -> Option<Self> {
        let category = match word.to_lowercase().as_str() {
            "unarmed" => WeaponCategory::Unarmed,
            "knife" => WeaponCategory::Knife,
            "sword" => WeaponCategory::Sword,
            "katana" => WeaponCategory::Katana,
            "axe" => WeaponCategory::Axe,
            "mace" => WeaponCategory::Mace,
            "polearm" => WeaponCategory::Polearm,
            "pistol" => WeaponCategory::Pistol,
            "smg" => WeaponCategory::Smg,
            "rifle" => WeaponCategory::Rifle,
            "shotgun" => WeaponCategory::Shotgun,
            "machine_gun" => WeaponCategory::MachineGun,
            "launcher" => WeaponCategory::Launcher,
            _ => return None,
        };
        Some(category)
    }
}

/// Weapon data. `range == 0` means melee: no ammo, no magazine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub category: WeaponCategory,
    pub range: u32,
    pub mag_size: u32,
    pub current_ammo: u32,
    pub ammo_type: Option<String>,
    pub magazine_type: Option<String>,
    pub damage: i32,
}

impl Weapon {
    pub fn melee(name: impl Into<String>, category: WeaponCategory, damage: i32) -> Self {
        Self {
            name: name.into(),
            category,
            range: 0,
            mag_size: 0,
            current_ammo: 0,
            ammo_type: None,
            magazine_type: None,
            damage,
        }
    }

    pub fn ranged(
        name: impl Into<String>,
        category: WeaponCategory,
        range: u32,
        mag_size: u32,
        ammo_type: &str,
        damage: i32,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            range,
            mag_size,
            current_ammo: 0,
            ammo_type: Some(ammo_type.to_string()),
            magazine_type: None,
            damage,
        }
    }

    pub fn with_magazine_type(mut self, magazine_type: &str) -> Self {
        self.magazine_type = Some(magazine_type.to_string());
        self
    }

    pub fn is_melee(&self) -> bool {
        self.range == 0
    }

    /// Does this magazine fit: declared magazine type first, ammo type second
    pub fn accepts(&self, magazine: &Magazine) -> bool {
        if let Some(kind) = &self.magazine_type {
            if magazine.name.eq_ignore_ascii_case(kind) || magazine.ammo_type.eq_ignore_ascii_case(kind) {
                return true;
            }
        }
        match &self.ammo_type {
            Some(ammo) => magazine.ammo_type.eq_ignore_ascii_case(ammo),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_release_clears_single_location() {
        let sword = EntityId::from("sword");
        let mut inv = Inventory {
            right_hand: Some(sword.clone()),
            ..Default::default()
        };
        assert!(inv.holds(&sword));
        assert!(inv.release(&sword));
        assert!(!inv.holds(&sword));
        assert!(!inv.release(&sword));
    }

    #[test]
    fn test_weapon_accepts_magazine_type_or_ammo() {
        let pistol = Weapon::ranged("pistol", WeaponCategory::Pistol, 5, 12, "9mm", 6)
            .with_magazine_type("9mm");
        let mag = Magazine {
            name: "9mm".into(),
            ammo_type: "9mm".into(),
            current_ammo: 12,
        };
        let wrong = Magazine {
            name: "rifle magazine".into(),
            ammo_type: "5.56".into(),
            current_ammo: 30,
        };
        assert!(pistol.accepts(&mag));
        assert!(!pistol.accepts(&wrong));
    }

    #[test]
    fn test_weapon_class_mapping() {
        assert_eq!(WeaponCategory::Pistol.class(), WeaponClass::Light);
        assert_eq!(WeaponCategory::Rifle.class(), WeaponClass::Medium);
        assert_eq!(WeaponCategory::MachineGun.class(), WeaponClass::Heavy);
    }

    #[test]
    fn test_item_total_weight() {
        let item = Item::new("9mm magazine", 0.25).with_quantity(4);
        assert!((item.total_weight() - 1.0).abs() < 1e-6);
    }
}
