//! Attribute routing
//!
//! Maps every virtual attribute name a presenter exposes to the slot and
//! local attribute behind it. Resolution is a table lookup; multi-part keys
//! such as `user_birthday(3i)` resolve through their base name.

use indexmap::IndexMap;

use crate::domain::AttributeKind;

use super::composite::{self, Fragment};
use super::definition::{CollisionPolicy, Entry, SlotDef};

/// Where a virtual attribute lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Attribute `local` of the record in slot `slot`
    Slot {
        slot: usize,
        local: &'static str,
        kind: AttributeKind,
    },
    /// Attribute held by the presenter itself
    Own { index: usize },
}

impl Route {
    pub fn kind(&self) -> Option<AttributeKind> {
        match self {
            Route::Slot { kind, .. } => Some(*kind),
            Route::Own { .. } => None,
        }
    }
}

/// Result of resolving a virtual name
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Attribute(Route),
    Composite {
        route: Route,
        base: &'a str,
        fragment: Fragment,
    },
    NotFound,
}

/// A name claimed by more than one registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub name: String,
    pub kept: String,
    pub shadowed: String,
}

#[derive(Debug, Clone)]
struct RouteEntry {
    route: Route,
    owner: String,
}

/// Virtual name to route, in registration order
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: IndexMap<String, RouteEntry>,
    collisions: Vec<Collision>,
}

impl RoutingTable {
    pub(crate) fn build(
        slots: &[SlotDef],
        own_attributes: &[String],
        order: &[Entry],
        policy: CollisionPolicy,
    ) -> Self {
        let mut table = Self::default();

        for entry in order {
            match *entry {
                Entry::Slot(index) => {
                    let slot = &slots[index];
                    for def in slot.attributes() {
                        let route = Route::Slot {
                            slot: index,
                            local: def.name,
                            kind: def.kind,
                        };
                        table.insert(slot.virtual_name(def.name), route, slot.name(), policy);
                    }
                }
                Entry::Own(index) => {
                    let name = own_attributes[index].clone();
                    table.insert(name, Route::Own { index }, "self", policy);
                }
            }
        }

        table
    }

    fn insert(&mut self, name: String, route: Route, owner: &str, policy: CollisionPolicy) {
        let Some(existing) = self.routes.get_mut(&name) else {
            self.routes.insert(
                name,
                RouteEntry {
                    route,
                    owner: owner.to_string(),
                },
            );
            return;
        };

        let (kept, shadowed) = match policy {
            CollisionPolicy::FirstRegistered => (existing.owner.clone(), owner.to_string()),
            CollisionPolicy::LastRegistered => {
                let previous = std::mem::replace(
                    existing,
                    RouteEntry {
                        route,
                        owner: owner.to_string(),
                    },
                );
                (owner.to_string(), previous.owner)
            }
        };
        self.collisions.push(Collision {
            name,
            kept,
            shadowed,
        });
    }

    pub fn get(&self, name: &str) -> Option<Route> {
        self.routes.get(name).map(|entry| entry.route)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Slot or `self` owning a virtual name
    pub fn owner(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(|entry| entry.owner.as_str())
    }

    /// Every exposed virtual name, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn resolve<'a>(&self, name: &'a str) -> Resolution<'a> {
        if let Some(route) = self.get(name) {
            return Resolution::Attribute(route);
        }
        match composite::parse_key(name) {
            Some((base, fragment)) => match self.get(base) {
                Some(route) => Resolution::Composite {
                    route,
                    base,
                    fragment,
                },
                None => Resolution::NotFound,
            },
            None => Resolution::NotFound,
        }
    }
}
