//! Container and hand bookkeeping shared by every handler that moves items
//!
//! Container weight is updated at each mutation here, never recomputed
//! lazily, so `current_weight` always equals the sum of contents.

use tracing::warn;

use crate::components::{Container, Inventory, Item, Weapon};
use crate::core::error::{MudError, Result};
use crate::core::types::EntityId;
use crate::ecs::{ComponentKind, Engine, EngineExt};

/// Where an item currently lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemLocation {
    Hand { owner: EntityId },
    Container { container: EntityId },
    Ground,
}

/// Weight of an item stack, zero for weightless entities
fn weight_of(engine: &dyn Engine, item: &EntityId) -> f32 {
    engine
        .component::<Item>(item)
        .map(Item::total_weight)
        .unwrap_or(0.0)
}

/// Put `item` into `container`. Returns false if it would overflow.
pub fn stow(engine: &mut dyn Engine, container: &EntityId, item: &EntityId) -> Result<bool> {
    let weight = weight_of(engine, item);
    {
        let bag = engine.require_mut::<Container>(container)?;
        if bag.items.contains(item) {
            return Ok(true);
        }
        if !bag.has_room_for(weight) {
            return Ok(false);
        }
        bag.items.push(item.clone());
        bag.current_weight += weight;
    }
    engine.remove_component(item, ComponentKind::Position);
    Ok(true)
}

/// Destroy everything `owner` holds or wears, emptying containers
/// recursively. Returns how many entities were removed.
pub fn discard_belongings(engine: &mut dyn Engine, owner: &EntityId) -> usize {
    let Some(inv) = engine.component::<Inventory>(owner).cloned() else {
        return 0;
    };
    let mut pending: Vec<EntityId> = inv.hands().chain(inv.equipment.values()).cloned().collect();
    let mut removed = 0;
    while let Some(item) = pending.pop() {
        if let Some(bag) = engine.component::<Container>(&item) {
            pending.extend(bag.items.iter().cloned());
        }
        if engine.remove_entity(&item).is_some() {
            removed += 1;
        }
    }
    if let Some(inv) = engine.component_mut::<Inventory>(owner) {
        *inv = Inventory::default();
    }
    removed
}

/// Take `item` out of `container`. Returns false if it was not inside.
pub fn take_out(engine: &mut dyn Engine, container: &EntityId, item: &EntityId) -> Result<bool> {
    let weight = weight_of(engine, item);
    let bag = engine.require_mut::<Container>(container)?;
    let Some(index) = bag.items.iter().position(|i| i == item) else {
        return Ok(false);
    };
    bag.items.remove(index);
    bag.current_weight = (bag.current_weight - weight).max(0.0);
    Ok(true)
}

/// Use up one unit of a stack. When the stack is exhausted the item is
/// detached from its location and destroyed. Returns true if destroyed.
pub fn consume_one(
    engine: &mut dyn Engine,
    item: &EntityId,
    location: &ItemLocation,
) -> Result<bool> {
    let (unit_weight, remaining) = {
        let stack = engine.require_mut::<Item>(item)?;
        stack.quantity = stack.quantity.saturating_sub(1);
        (stack.weight, stack.quantity)
    };

    if let ItemLocation::Container { container } = location {
        let bag = engine.require_mut::<Container>(container)?;
        bag.current_weight = (bag.current_weight - unit_weight).max(0.0);
    }

    if remaining > 0 {
        return Ok(false);
    }

    match location {
        ItemLocation::Hand { owner } => {
            if let Some(inv) = engine.component_mut::<Inventory>(owner) {
                inv.release(item);
            }
        }
        ItemLocation::Container { container } => {
            let bag = engine.require_mut::<Container>(container)?;
            bag.items.retain(|i| i != item);
        }
        ItemLocation::Ground => {}
    }

    if engine.remove_entity(item).is_none() {
        warn!(item = %item, "consumed item vanished before removal");
    }
    Ok(true)
}

/// The weapon the actor fights with: right hand first, then left
pub fn wielded_weapon(engine: &dyn Engine, actor: &EntityId) -> Option<EntityId> {
    let inv = engine.component::<Inventory>(actor)?;
    inv.hands()
        .find(|id| engine.has_component(id, ComponentKind::Weapon))
        .cloned()
}

/// Whatever the actor holds in the hand not carrying `weapon`
pub fn off_hand_item(engine: &dyn Engine, actor: &EntityId, weapon: &EntityId) -> Option<EntityId> {
    let inv = engine.component::<Inventory>(actor)?;
    inv.hands().find(|id| *id != weapon).cloned()
}

/// Move an item into the actor's empty hand (right preferred)
pub fn put_in_hand(engine: &mut dyn Engine, actor: &EntityId, item: &EntityId) -> Result<bool> {
    let placed = {
        let inv = engine.require_mut::<Inventory>(actor)?;
        if inv.right_hand.is_none() {
            inv.right_hand = Some(item.clone());
            true
        } else if inv.left_hand.is_none() {
            inv.left_hand = Some(item.clone());
            true
        } else {
            false
        }
    };
    if placed {
        engine.remove_component(item, ComponentKind::Position);
    }
    Ok(placed)
}

/// Weapon data for the wielded weapon, if any
pub fn weapon_of<'a>(engine: &'a dyn Engine, actor: &EntityId) -> Option<(EntityId, &'a Weapon)> {
    let id = wielded_weapon(engine, actor)?;
    let weapon = engine.component::<Weapon>(&id)?;
    Some((id, weapon))
}

/// Equip `item` into a named slot
pub fn equip(engine: &mut dyn Engine, actor: &EntityId, slot: &str, item: &EntityId) -> Result<()> {
    if engine.get_entity(item).is_none() {
        return Err(MudError::EntityNotFound(item.clone()));
    }
    engine
        .require_mut::<Inventory>(actor)?
        .equipment
        .insert(slot.to_string(), item.clone());
    engine.remove_component(item, ComponentKind::Position);
    Ok(())
}
