//! Game content: the prefab catalog, player creation and the demo map

pub mod prefabs;

use crate::components::{
    CombatStats, Identity, Inventory, Momentum, Player, Portal, Position, Skills, Stance,
};
use crate::core::error::{MudError, Result};
use crate::core::types::{EntityId, GridPos};
use crate::ecs::{Engine, Entity, World};

pub use prefabs::{starter_kit, Gear, Placement, Prefab, Prefabs};

/// Where new players appear
pub const SPAWN_ROOM: GridPos = GridPos::new(0, 0);

/// Create a player character carrying the starter kit
pub fn spawn_player(
    engine: &mut dyn Engine,
    prefabs: &Prefabs,
    name: &str,
    pos: GridPos,
) -> Result<EntityId> {
    let id = EntityId::player(name);
    if engine.get_entity(&id).is_some() {
        return Err(MudError::DuplicateEntity(id));
    }
    let entity = Entity::new(id.clone())
        .with(Identity::new(name))
        .with(Player)
        .with(Position::from(pos))
        .with(CombatStats::new(100, 12, 10))
        .with(Skills {
            light_weapons: 2,
            medium_weapons: 2,
            heavy_weapons: 0,
            melee: 1,
        })
        .with(Momentum::default())
        .with(Stance::default())
        .with(Inventory::default());
    engine.add_entity(entity)?;
    prefabs.outfit(engine, &id, &starter_kit())?;
    Ok(id)
}

fn portal(world: &mut World, name: &str, at: GridPos, destination: GridPos) -> Result<()> {
    world.add_entity(
        Entity::new(EntityId::generate())
            .with(Identity::new(name))
            .with(Position::from(at))
            .with(Portal {
                name: name.to_string(),
                destination,
            }),
    )
}

/// A small town for the binary: a square, a market, an alley with a
/// trapdoor down to a cellar, and a few locals
pub fn demo_world(world: &mut World, prefabs: &Prefabs) -> Result<()> {
    let square = SPAWN_ROOM;
    let market = GridPos::new(0, 1);
    let alley = GridPos::new(1, 1);
    let guardhouse = GridPos::new(-1, 0);
    let cellar = GridPos::new(10, 10);

    world.add_room(
        square,
        "Gate Square",
        "Cobbles worn smooth by carts surround a dry fountain. The market lies north.",
    );
    world.add_room(
        market,
        "Market Row",
        "Shuttered stalls lean against each other. An alley opens to the east.",
    );
    world.add_room(
        alley,
        "Narrow Alley",
        "Refuse piles against damp walls. A rotten trapdoor is set into the ground.",
    );
    world.add_room(
        guardhouse,
        "Guardhouse",
        "An empty weapon rack and a cold brazier. Someone left in a hurry.",
    );
    world.add_room(
        cellar,
        "Flooded Cellar",
        "Ankle-deep water ripples in the dark. A ladder leads back up.",
    );

    portal(world, "trapdoor", alley, cellar)?;
    portal(world, "ladder", cellar, alley)?;

    let locals = [
        ("ronin", square),
        ("goblin", alley),
        ("bandit", market),
        ("sewer rat", cellar),
        ("guard spear", guardhouse),
        ("box of 7.62mm rounds", guardhouse),
        ("hunting rifle", guardhouse),
    ];
    for (name, room) in locals {
        prefabs.spawn(world, name, Some(room))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Container, Weapon, BACKPACK_SLOT};
    use crate::ecs::{ComponentKind, EngineExt};

    #[test]
    fn test_player_starter_kit() {
        let mut world = World::new();
        let prefabs = Prefabs::builtin();
        let id = spawn_player(&mut world, &prefabs, "Ayla", SPAWN_ROOM).unwrap();
        assert_eq!(id, EntityId::player("ayla"));

        let inv = world.component::<Inventory>(&id).unwrap().clone();
        let pistol = inv.right_hand.clone().unwrap();
        assert!(world.component::<Weapon>(&pistol).is_some());
        let pack = inv.equipment.get(BACKPACK_SLOT).unwrap();
        assert_eq!(world.component::<Container>(pack).unwrap().items.len(), 2);

        assert!(matches!(
            spawn_player(&mut world, &prefabs, "ayla", SPAWN_ROOM),
            Err(MudError::DuplicateEntity(_))
        ));
    }

    #[test]
    fn test_demo_world_populated() {
        let mut world = World::new();
        demo_world(&mut world, &Prefabs::builtin()).unwrap();
        assert!(world.room_exists(GridPos::new(10, 10)));
        assert_eq!(world.entities_with_component(ComponentKind::Portal).len(), 2);
        assert_eq!(world.entities_with_component(ComponentKind::Npc).len(), 4);
        assert!(!world.entities_at(GridPos::new(-1, 0)).is_empty());
    }
}
