//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use ironmud::combat::{CombatSystem, FixedDice};
use ironmud::components::{
    CombatStats, Container, Identity, Inventory, Item, Magazine, Momentum, Position, Stance,
    Weapon,
};
use ironmud::content::Prefabs;
use ironmud::core::config::{CombatConfig, RegenConfig};
use ironmud::core::types::{EntityId, GridPos};
use ironmud::ecs::{Component, Engine, Entity, World};
use ironmud::inventory::{equip, put_in_hand, stow};
use ironmud::messaging::Outbox;

pub const HALL: GridPos = GridPos::new(0, 0);
pub const YARD: GridPos = GridPos::new(0, 1);

/// A two-room world with a combat system whose rolls are scripted
pub struct Arena {
    pub world: World,
    pub outbox: Outbox,
    pub combat: CombatSystem,
}

impl Arena {
    pub fn new(dice: FixedDice) -> Self {
        let mut world = World::new();
        world.add_room(HALL, "Hall", "A bare hall.");
        world.add_room(YARD, "Yard", "A muddy yard.");
        Self {
            world,
            outbox: Outbox::new(),
            combat: CombatSystem::with_dice(
                CombatConfig::default(),
                RegenConfig::default(),
                Box::new(dice),
            ),
        }
    }

    /// Loot and drops come from `prefabs`
    pub fn with_prefabs(mut self, prefabs: Prefabs) -> Self {
        self.combat = self.combat.with_prefabs(Arc::new(prefabs));
        self
    }

    pub fn fighter(&mut self, name: &str, pos: GridPos) -> EntityId {
        let id = EntityId::from(name);
        self.world
            .add_entity(
                Entity::new(id.clone())
                    .with(Identity::new(name))
                    .with(Position::from(pos))
                    .with(CombatStats::new(50, 10, 10))
                    .with(Inventory::default())
                    .with(Momentum::default())
                    .with(Stance::default()),
            )
            .unwrap();
        id
    }

    pub fn item(&mut self, id: &str, components: Vec<Component>) -> EntityId {
        let id = EntityId::from(id);
        let mut entity = Entity::new(id.clone());
        for component in components {
            entity.add_component(component);
        }
        self.world.add_entity(entity).unwrap();
        id
    }

    pub fn wield(&mut self, owner: &EntityId, weapon: Weapon) -> EntityId {
        let name = format!("{}-{}", owner, weapon.name);
        let id = self.item(
            &name,
            vec![
                Identity::new(weapon.name.clone()).into(),
                Item::new(weapon.name.clone(), 1.0).into(),
                weapon.into(),
            ],
        );
        assert!(put_in_hand(&mut self.world, owner, &id).unwrap());
        id
    }

    pub fn equip_container(&mut self, owner: &EntityId, slot: &str) -> EntityId {
        let id = self.item(
            &format!("{}-{}", owner, slot),
            vec![Item::new(slot, 0.5).into(), Container::new(20.0).into()],
        );
        equip(&mut self.world, owner, slot, &id).unwrap();
        id
    }

    /// A stack of loaded 9mm magazines stowed in `container`
    pub fn magazines(&mut self, id: &str, container: &EntityId, quantity: u32, rounds: u32) -> EntityId {
        let mags = self.item(
            id,
            vec![
                Item::new("9mm magazine", 0.5).with_quantity(quantity).into(),
                Magazine {
                    name: "9mm magazine".to_string(),
                    ammo_type: "9mm".to_string(),
                    current_ammo: rounds,
                }
                .into(),
            ],
        );
        assert!(stow(&mut self.world, container, &mags).unwrap());
        mags
    }

    /// Every entity's components, ordered, for before/after comparison
    pub fn state(&self) -> Vec<(EntityId, Vec<Component>)> {
        world_state(&self.world)
    }
}

pub fn world_state(world: &World) -> Vec<(EntityId, Vec<Component>)> {
    let mut state: Vec<(EntityId, Vec<Component>)> = world
        .entities()
        .map(|e| {
            let mut components: Vec<Component> = e.components().cloned().collect();
            components.sort_by_key(Component::kind);
            (e.id().clone(), components)
        })
        .collect();
    state.sort_by(|a, b| a.0.cmp(&b.0));
    state
}
