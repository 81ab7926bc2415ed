//! Closed set of component kinds
//!
//! Every component type is a variant of `Component`, tagged by the
//! fieldless `ComponentKind`. `ComponentData` gives typed access without
//! runtime type erasure.

use serde::{Deserialize, Serialize};

use crate::components::{
    CombatStats, Container, Identity, Inventory, Item, LogoutTimer, Magazine, Momentum, Npc,
    ParryReady, Player, Portal, Position, Roundtime, Skills, Stance, Weapon,
};

/// Typed view of one `Component` variant
pub trait ComponentData: Sized + Into<Component> {
    const KIND: ComponentKind;

    fn from_component(component: &Component) -> Option<&Self>;
    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
    fn try_from_component(component: Component) -> Option<Self>;
}

/// Components that may be mutated in place. `Position` is excluded: the
/// world's spatial index must see every move, so positions change only
/// through `Engine::add_component`.
pub trait MutableComponent: ComponentData {}

macro_rules! component_kinds {
    ($( $variant:ident ( $ty:ty ) ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "kind", content = "data")]
        pub enum Component {
            $( $variant($ty), )*
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum ComponentKind {
            $( $variant, )*
        }

        impl ComponentKind {
            pub const ALL: &'static [ComponentKind] = &[ $( ComponentKind::$variant, )* ];
        }

        impl Component {
            pub fn kind(&self) -> ComponentKind {
                match self {
                    $( Component::$variant(_) => ComponentKind::$variant, )*
                }
            }
        }

        $(
            impl ComponentData for $ty {
                const KIND: ComponentKind = ComponentKind::$variant;

                fn from_component(component: &Component) -> Option<&Self> {
                    match component {
                        Component::$variant(value) => Some(value),
                        _ => None,
                    }
                }

                fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                    match component {
                        Component::$variant(value) => Some(value),
                        _ => None,
                    }
                }

                fn try_from_component(component: Component) -> Option<Self> {
                    match component {
                        Component::$variant(value) => Some(value),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Component {
                fn from(value: $ty) -> Self {
                    Component::$variant(value)
                }
            }
        )*
    };
}

component_kinds! {
    Position(Position),
    Identity(Identity),
    Player(Player),
    Npc(Npc),
    Inventory(Inventory),
    Stance(Stance),
    CombatStats(CombatStats),
    Roundtime(Roundtime),
    Momentum(Momentum),
    Weapon(Weapon),
    Magazine(Magazine),
    Item(Item),
    Container(Container),
    Skills(Skills),
    Portal(Portal),
    LogoutTimer(LogoutTimer),
    ParryReady(ParryReady),
}

impl MutableComponent for Identity {}
impl MutableComponent for Player {}
impl MutableComponent for Npc {}
impl MutableComponent for Inventory {}
impl MutableComponent for Stance {}
impl MutableComponent for CombatStats {}
impl MutableComponent for Roundtime {}
impl MutableComponent for Momentum {}
impl MutableComponent for Weapon {}
impl MutableComponent for Magazine {}
impl MutableComponent for Item {}
impl MutableComponent for Container {}
impl MutableComponent for Skills {}
impl MutableComponent for Portal {}
impl MutableComponent for LogoutTimer {}
impl MutableComponent for ParryReady {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let c: Component = Roundtime::new(2.0).into();
        assert_eq!(c.kind(), ComponentKind::Roundtime);
        assert_eq!(<Roundtime as ComponentData>::KIND, ComponentKind::Roundtime);
    }

    #[test]
    fn test_typed_lookup_rejects_other_variant() {
        let c: Component = Momentum::default().into();
        assert!(Roundtime::from_component(&c).is_none());
        assert!(Momentum::from_component(&c).is_some());
    }

    #[test]
    fn test_all_kinds_listed() {
        assert_eq!(ComponentKind::ALL.len(), 17);
    }
}
