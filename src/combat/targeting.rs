//! Finding a combatant in the actor's room by name and ordinal

use crate::components::{CombatStats, Identity};
use crate::core::types::EntityId;
use crate::combat::action::TargetRef;
use crate::ecs::{Engine, EngineExt};

const ORDINAL_WORDS: [&str; 10] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

/// Split "2.goblin", "second goblin" or "goblin" into (index, name)
pub fn parse_ordinal(text: &str) -> (usize, String) {
    let text = text.trim().to_lowercase();

    if let Some((number, rest)) = text.split_once('.') {
        if let Ok(n) = number.parse::<usize>() {
            if n > 0 && !rest.is_empty() {
                return (n - 1, rest.trim().to_string());
            }
        }
    }

    if let Some((first, rest)) = text.split_once(' ') {
        if let Some(index) = ORDINAL_WORDS.iter().position(|w| *w == first) {
            return (index, rest.trim().to_string());
        }
    }

    (0, text)
}

/// Combatants sharing the actor's room, excluding the actor, in spawn order
pub fn combatants_near(engine: &dyn Engine, actor: &EntityId) -> Vec<EntityId> {
    let Some(pos) = engine.position_of(actor) else {
        return Vec::new();
    };
    engine
        .entities_at(pos)
        .into_iter()
        .filter(|id| id != actor)
        .filter(|id| engine.component::<CombatStats>(id).is_some())
        .collect()
}

/// Does `other` stand in the same room as `actor`?
pub fn same_room(engine: &dyn Engine, actor: &EntityId, other: &EntityId) -> bool {
    match (engine.position_of(actor), engine.position_of(other)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Resolve a target reference to a combatant in the actor's room
pub fn resolve_target(engine: &dyn Engine, actor: &EntityId, target: &TargetRef) -> Option<EntityId> {
    match target {
        TargetRef::Current => {
            let tracked = engine.component::<CombatStats>(actor)?.target_id.clone()?;
            same_room(engine, actor, &tracked).then_some(tracked)
        }
        TargetRef::Id(id) => {
            let present = id != actor
                && engine.component::<CombatStats>(id).is_some()
                && same_room(engine, actor, id);
            present.then(|| id.clone())
        }
        TargetRef::Name(text) => {
            let (index, name) = parse_ordinal(text);
            combatants_near(engine, actor)
                .into_iter()
                .filter(|id| {
                    engine
                        .component::<Identity>(id)
                        .map(|ident| ident.matches(&name))
                        .unwrap_or(false)
                })
                .nth(index)
        }
    }
}
