//! Reloading and ammunition checks
//!
//! Sources are searched in a fixed order: the off hand, equipped
//! containers other than the backpack, the backpack, then the ground.

use tracing::debug;

use crate::components::{Container, Inventory, Item, Magazine, Weapon, BACKPACK_SLOT};
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::combat::action::ActionOutcome;
use crate::combat::context::{apply_roundtime, ensure_ready, skill_level, CombatContext};
use crate::ecs::{Engine, EngineExt};
use crate::inventory::{consume_one, off_hand_item, weapon_of, ItemLocation};
use crate::messaging::Message;

/// A usable ammunition stack and where it was found
#[derive(Debug, Clone, PartialEq)]
pub struct AmmoSource {
    pub item: EntityId,
    pub location: ItemLocation,
    /// Rounds one unit of this stack puts in the weapon
    pub charge: u32,
    pub name: String,
}

/// Rounds one unit of `item` would load, if it fits the weapon at all
fn charge_for(engine: &dyn Engine, item: &EntityId, weapon: &Weapon) -> Option<u32> {
    let stack = engine.component::<Item>(item)?;
    if stack.quantity == 0 {
        return None;
    }
    match engine.component::<Magazine>(item) {
        Some(magazine) => {
            (weapon.accepts(magazine) && magazine.current_ammo > 0).then_some(magazine.current_ammo)
        }
        None => {
            let wanted = weapon.ammo_type.as_deref()?;
            (stack.ammo_type() == Some(wanted)).then_some(weapon.mag_size)
        }
    }
}

/// Every candidate stack in search order
fn ammo_sources(
    engine: &dyn Engine,
    actor: &EntityId,
    weapon_id: &EntityId,
    weapon: &Weapon,
) -> Vec<AmmoSource> {
    let mut candidates: Vec<(EntityId, ItemLocation)> = Vec::new();

    if let Some(item) = off_hand_item(engine, actor, weapon_id) {
        candidates.push((item, ItemLocation::Hand { owner: actor.clone() }));
    }

    if let Some(inv) = engine.component::<Inventory>(actor) {
        let worn = inv
            .equipment
            .iter()
            .filter(|(slot, _)| slot.as_str() != BACKPACK_SLOT)
            .map(|(_, id)| id);
        let backpack = inv.equipment.get(BACKPACK_SLOT);
        for container in worn.chain(backpack) {
            if let Some(bag) = engine.component::<Container>(container) {
                for item in &bag.items {
                    candidates.push((
                        item.clone(),
                        ItemLocation::Container {
                            container: container.clone(),
                        },
                    ));
                }
            }
        }
    }

    if let Some(pos) = engine.position_of(actor) {
        for item in engine.entities_at(pos) {
            if &item != actor && engine.component::<Item>(&item).is_some() {
                candidates.push((item, ItemLocation::Ground));
            }
        }
    }

    candidates
        .into_iter()
        .filter_map(|(item, location)| {
            let charge = charge_for(engine, &item, weapon)?;
            let name = engine.component::<Item>(&item)?.name.clone();
            Some(AmmoSource {
                item,
                location,
                charge,
                name,
            })
        })
        .collect()
}

/// The stack `reload` would use
pub fn find_ammo(engine: &dyn Engine, actor: &EntityId) -> Option<AmmoSource> {
    let (weapon_id, weapon) = weapon_of(engine, actor)?;
    ammo_sources(engine, actor, &weapon_id, weapon).into_iter().next()
}

/// `reload`
pub fn handle_reload(ctx: &mut CombatContext<'_>, actor: &EntityId) -> Result<ActionOutcome> {
    if !ensure_ready(ctx.engine, ctx.sink, actor) {
        return Ok(ActionOutcome::Rejected);
    }
    let Some((weapon_id, weapon)) = weapon_of(ctx.engine, actor).map(|(id, w)| (id, w.clone()))
    else {
        return ctx.reject(actor, "You aren't holding a weapon.");
    };
    if weapon.is_melee() {
        return ctx.reject(actor, format!("Your {} doesn't take ammunition.", weapon.name));
    }
    if weapon.current_ammo >= weapon.mag_size {
        return ctx.reject(actor, format!("Your {} is already fully loaded.", weapon.name));
    }

    let Some(source) = ammo_sources(ctx.engine, actor, &weapon_id, &weapon)
        .into_iter()
        .next()
    else {
        return ctx.reject(actor, format!("You have no ammunition for your {}.", weapon.name));
    };

    consume_one(ctx.engine, &source.item, &source.location)?;
    let loaded = source.charge.min(weapon.mag_size);
    ctx.engine.require_mut::<Weapon>(&weapon_id)?.current_ammo = loaded;

    let seconds = ctx
        .config
        .reload_cost
        .for_level(skill_level(ctx.engine, actor, weapon.category.class()));
    apply_roundtime(ctx.engine, actor, seconds)?;

    debug!(actor = %actor, item = %source.item, location = ?source.location, loaded, "reloaded");
    ctx.tell(
        actor,
        Message::success(format!(
            "You load a {} into your {}. ({}/{})",
            source.name, weapon.name, loaded, weapon.mag_size
        )),
    );
    if let Some(room) = ctx.engine.position_of(actor) {
        let name = ctx.engine.name_of(actor);
        ctx.sink.broadcast(
            room,
            &[actor.clone()],
            Message::info(format!("{} reloads their {}.", name, weapon.name)),
        );
    }
    Ok(ActionOutcome::Performed)
}

/// `check ammo`: not an action, so no roundtime gate
pub fn handle_check_ammo(ctx: &mut CombatContext<'_>, actor: &EntityId) -> Result<ActionOutcome> {
    let Some((weapon_id, weapon)) = weapon_of(ctx.engine, actor).map(|(id, w)| (id, w.clone()))
    else {
        return ctx.reject(actor, "You aren't holding a weapon.");
    };
    if weapon.is_melee() {
        return ctx.reject(actor, format!("Your {} doesn't use ammunition.", weapon.name));
    }

    let sources = ammo_sources(ctx.engine, actor, &weapon_id, &weapon);
    let spare: u32 = sources
        .iter()
        .filter(|s| s.location != ItemLocation::Ground)
        .filter_map(|s| ctx.engine.component::<Item>(&s.item).map(|i| i.quantity))
        .sum();

    ctx.tell(
        actor,
        Message::info(format!(
            "Your {} has {}/{} rounds loaded. You carry {} spare reload{}.",
            weapon.name,
            weapon.current_ammo,
            weapon.mag_size,
            spare,
            if spare == 1 { "" } else { "s" }
        )),
    );
    Ok(ActionOutcome::Performed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{CombatStats, Position, Roundtime, Skills, WeaponCategory};
    use crate::core::config::CombatConfig;
    use crate::combat::dice::FixedDice;
    use crate::content::Prefabs;
    use crate::ecs::{Entity, World};
    use crate::messaging::Outbox;

    struct Rig {
        world: World,
        outbox: Outbox,
        config: CombatConfig,
        dice: FixedDice,
        actor: EntityId,
        pistol: EntityId,
    }

    impl Rig {
        fn new() -> Self {
            let mut world = World::new();
            let actor = EntityId::from("gunner");
            let pistol = EntityId::from("pistol");
            world
                .add_entity(
                    Entity::new(pistol.clone()).with(
                        Weapon::ranged("pistol", WeaponCategory::Pistol, 5, 12, "9mm", 8)
                            .with_magazine_type("9mm"),
                    ),
                )
                .unwrap();
            world
                .add_entity(
                    Entity::new(actor.clone())
                        .with(Position::new(0, 0))
                        .with(CombatStats::new(30, 10, 10))
                        .with(Skills::default())
                        .with(Inventory {
                            right_hand: Some(pistol.clone()),
                            ..Inventory::default()
                        }),
                )
                .unwrap();
            Self {
                world,
                outbox: Outbox::new(),
                config: CombatConfig::default(),
                dice: FixedDice::always(50.0),
                actor,
                pistol,
            }
        }

        fn magazine(&mut self, id: &str, quantity: u32, rounds: u32) -> EntityId {
            let id = EntityId::from(id);
            self.world
                .add_entity(
                    Entity::new(id.clone())
                        .with(Item::new("9mm magazine", 0.5).with_quantity(quantity))
                        .with(Magazine {
                            name: "9mm magazine".into(),
                            ammo_type: "9mm".into(),
                            current_ammo: rounds,
                        }),
                )
                .unwrap();
            id
        }

        fn container(&mut self, id: &str, slot: &str, items: &[&EntityId]) -> EntityId {
            let id = EntityId::from(id);
            let mut bag = Container::new(20.0);
            for item in items {
                bag.items.push((*item).clone());
                bag.current_weight += self.world.component::<Item>(item).unwrap().total_weight();
            }
            self.world.add_entity(Entity::new(id.clone()).with(bag)).unwrap();
            self.world
                .component_mut::<Inventory>(&self.actor)
                .unwrap()
                .equipment
                .insert(slot.to_string(), id.clone());
            id
        }

        fn reload(&mut self) -> ActionOutcome {
            let mut ctx = CombatContext {
                engine: &mut self.world,
                sink: &mut self.outbox,
                config: &self.config,
                dice: &mut self.dice,
                prefabs: &Prefabs::new(),
            };
            handle_reload(&mut ctx, &self.actor).unwrap()
        }

        fn ammo(&self) -> u32 {
            self.world.component::<Weapon>(&self.pistol).unwrap().current_ammo
        }
    }

    #[test]
    fn test_reload_from_belt_sets_charge_and_roundtime() {
        let mut rig = Rig::new();
        let mags = rig.magazine("mags", 2, 12);
        let belt = rig.container("belt", "waist", &[&mags]);

        assert_eq!(rig.reload(), ActionOutcome::Performed);
        assert_eq!(rig.ammo(), 12);
        assert_eq!(rig.world.component::<Item>(&mags).unwrap().quantity, 1);
        let belt_weight = rig.world.component::<Container>(&belt).unwrap().current_weight;
        assert!((belt_weight - 0.5).abs() < 1e-6);
        let rt = rig.world.component::<Roundtime>(&rig.actor).unwrap();
        assert_eq!(rt.remaining, rig.config.reload_cost.for_level(0));
    }

    #[test]
    fn test_belt_preferred_over_backpack() {
        let mut rig = Rig::new();
        let belt_mags = rig.magazine("belt-mags", 1, 12);
        let pack_mags = rig.magazine("pack-mags", 3, 12);
        rig.container("pack", BACKPACK_SLOT, &[&pack_mags]);
        rig.container("belt", "waist", &[&belt_mags]);

        rig.reload();
        assert!(rig.world.get_entity(&belt_mags).is_none());
        assert_eq!(rig.world.component::<Item>(&pack_mags).unwrap().quantity, 3);
    }

    #[test]
    fn test_backpack_used_when_nothing_else() {
        let mut rig = Rig::new();
        let pack_mags = rig.magazine("pack-mags", 3, 10);
        rig.container("pack", BACKPACK_SLOT, &[&pack_mags]);

        rig.reload();
        assert_eq!(rig.ammo(), 10);
        assert_eq!(rig.world.component::<Item>(&pack_mags).unwrap().quantity, 2);
    }

    #[test]
    fn test_off_hand_comes_first() {
        let mut rig = Rig::new();
        let belt_mags = rig.magazine("belt-mags", 1, 12);
        rig.container("belt", "waist", &[&belt_mags]);
        let held = rig.magazine("held", 1, 7);
        rig.world.component_mut::<Inventory>(&rig.actor).unwrap().left_hand = Some(held.clone());

        rig.reload();
        assert_eq!(rig.ammo(), 7);
        assert!(rig.world.get_entity(&held).is_none());
        assert!(rig
            .world
            .component::<Inventory>(&rig.actor)
            .unwrap()
            .left_hand
            .is_none());
    }

    #[test]
    fn test_legacy_ammo_loads_full_magazine() {
        let mut rig = Rig::new();
        let rounds = EntityId::from("box");
        rig.world
            .add_entity(
                Entity::new(rounds.clone())
                    .with(Item::new("box of 9mm", 1.0).with_attribute("ammo_type", "9mm"))
                    .with(Position::new(0, 0)),
            )
            .unwrap();

        assert_eq!(rig.reload(), ActionOutcome::Performed);
        assert_eq!(rig.ammo(), 12);
        assert!(rig.world.get_entity(&rounds).is_none());
    }

    #[test]
    fn test_rejects_without_ammo_and_when_full() {
        let mut rig = Rig::new();
        assert_eq!(rig.reload(), ActionOutcome::Rejected);
        assert!(rig.world.component::<Roundtime>(&rig.actor).is_none());

        rig.world.component_mut::<Weapon>(&rig.pistol).unwrap().current_ammo = 12;
        let mags = rig.magazine("mags", 1, 12);
        rig.container("belt", "waist", &[&mags]);
        assert_eq!(rig.reload(), ActionOutcome::Rejected);
        assert_eq!(rig.world.component::<Item>(&mags).unwrap().quantity, 1);
    }

    #[test]
    fn test_wrong_calibre_ignored() {
        let mut rig = Rig::new();
        let wrong = EntityId::from("wrong");
        rig.world
            .add_entity(
                Entity::new(wrong.clone())
                    .with(Item::new("rifle magazine", 0.8))
                    .with(Magazine {
                        name: "rifle magazine".into(),
                        ammo_type: "5.56".into(),
                        current_ammo: 30,
                    }),
            )
            .unwrap();
        rig.container("belt", "waist", &[&wrong]);
        assert_eq!(rig.reload(), ActionOutcome::Rejected);
    }
}
