//! Planetary systems: ordered body lists with a name index
//!
//! A [`PlanetarySystem`] groups the bodies orbiting a star or another body.
//! Lookup is case-insensitive over primary names, aliases, and localized
//! names, with non-localized names taking precedence on collision. Deep
//! search recurses into satellite systems.

use crate::body::{Body, BodyRef};
use crate::selection::StarRef;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub type SystemRef = Rc<RefCell<PlanetarySystem>>;

pub struct PlanetarySystem {
    star: Weak<RefCell<crate::selection::Star>>,
    primary: Weak<RefCell<Body>>,
    bodies: Vec<BodyRef>,
    /// Lowercased name -> body. Non-localized names always win collisions.
    index: HashMap<String, Weak<RefCell<Body>>>,
}

impl PlanetarySystem {
    /// The system directly around a star.
    pub fn around_star(star: &StarRef) -> SystemRef {
        Rc::new(RefCell::new(PlanetarySystem {
            star: Rc::downgrade(star),
            primary: Weak::new(),
            bodies: Vec::new(),
            index: HashMap::new(),
        }))
    }

    /// A satellite system around `primary`. Inherits the star from the
    /// primary's own system, so temperature estimates keep working for
    /// moons of moons.
    pub fn around_body(primary: &BodyRef) -> SystemRef {
        let star = primary
            .borrow()
            .system()
            .map(|s| s.borrow().star_weak())
            .unwrap_or_default();
        let system = Rc::new(RefCell::new(PlanetarySystem {
            star,
            primary: Rc::downgrade(primary),
            bodies: Vec::new(),
            index: HashMap::new(),
        }));
        primary.borrow_mut().set_satellites(system.clone());
        system
    }

    pub fn star(&self) -> Option<StarRef> {
        self.star.upgrade()
    }

    pub(crate) fn star_weak(&self) -> Weak<RefCell<crate::selection::Star>> {
        self.star.clone()
    }

    /// The body this system orbits, if it is a satellite system.
    pub fn primary(&self) -> Option<BodyRef> {
        self.primary.upgrade()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Bodies in insertion order.
    pub fn bodies(&self) -> &[BodyRef] {
        &self.bodies
    }

    /// Position of a body in the insertion order, if it is a member.
    pub fn get_order(&self, body: &BodyRef) -> Option<usize> {
        self.bodies.iter().position(|b| Rc::ptr_eq(b, body))
    }

    /// Add a body, wiring its back-reference and indexing its names.
    pub fn add_body(this: &SystemRef, body: &BodyRef) {
        body.borrow_mut().attach_to_system(this);
        let mut system = this.borrow_mut();
        system.index_body_names(body);
        system.bodies.push(body.clone());
    }

    /// Remove a body and every index entry pointing at it.
    pub fn remove_body(&mut self, body: &BodyRef) {
        if let Some(pos) = self.bodies.iter().position(|b| Rc::ptr_eq(b, body)) {
            self.bodies.remove(pos);
            self.unindex_body_names(body);
        }
    }

    /// Swap `old` for `new` in place, preserving list order. Old index
    /// entries are dropped before the new body's names go in, so a body
    /// reusing one of the old names resolves to the replacement.
    pub fn replace_body(this: &SystemRef, old: &BodyRef, new: &BodyRef) {
        let pos = {
            let system = this.borrow();
            system.bodies.iter().position(|b| Rc::ptr_eq(b, old))
        };
        let Some(pos) = pos else {
            log::warn!(
                "replace_body: {} is not a member of this system",
                old.borrow().get_name(false)
            );
            return;
        };
        new.borrow_mut().attach_to_system(this);
        let mut system = this.borrow_mut();
        system.unindex_body_names(old);
        system.index_body_names(new);
        system.bodies[pos] = new.clone();
    }

    /// Register an additional alias for a member body.
    pub fn add_alias(&mut self, body: &BodyRef, alias: &str) {
        self.index
            .insert(alias.to_lowercase(), Rc::downgrade(body));
    }

    pub fn remove_alias(&mut self, alias: &str) {
        self.index.remove(&alias.to_lowercase());
    }

    fn index_body_names(&mut self, body: &BodyRef) {
        let weak = Rc::downgrade(body);
        let b = body.borrow();
        for name in b.names() {
            self.index.insert(name.to_lowercase(), weak.clone());
        }
        // Localized names only fill vacant slots.
        if b.has_localized_name() {
            self.index
                .entry(b.get_localized_name().to_lowercase())
                .or_insert(weak);
        }
    }

    fn unindex_body_names(&mut self, body: &BodyRef) {
        let b = body.borrow();
        for name in b.names() {
            self.remove_entry_for(&name.to_lowercase(), body);
        }
        if b.has_localized_name() {
            self.remove_entry_for(&b.get_localized_name().to_lowercase(), body);
        }
    }

    fn remove_entry_for(&mut self, key: &str, body: &BodyRef) {
        if let Some(existing) = self.index.get(key) {
            if existing.upgrade().is_some_and(|b| Rc::ptr_eq(&b, body)) {
                self.index.remove(key);
            }
        }
    }

    /// Find a body by name, case-insensitively. `i18n` additionally matches
    /// localized names; non-localized names win when both match different
    /// bodies. `deep_search` recurses into satellite systems.
    pub fn find(&self, name: &str, deep_search: bool, i18n: bool) -> Option<BodyRef> {
        let key = name.to_lowercase();
        if let Some(body) = self.index.get(&key).and_then(Weak::upgrade) {
            let matched = {
                let b = body.borrow();
                b.names().iter().any(|n| n.to_lowercase() == key)
                    || (i18n && b.get_localized_name().to_lowercase() == key)
            };
            if matched {
                return Some(body);
            }
        }
        if deep_search {
            for body in &self.bodies {
                let satellites = body.borrow().get_satellites();
                if let Some(satellites) = satellites {
                    if let Some(found) = satellites.borrow().find(name, true, i18n) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Collect names starting with `prefix`, case-insensitively.
    pub fn get_completion(&self, prefix: &str, i18n: bool, deep_search: bool) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        let mut completions = Vec::new();
        for body in &self.bodies {
            let b = body.borrow();
            for name in b.names() {
                if name.to_lowercase().starts_with(&prefix) {
                    completions.push(name.clone());
                }
            }
            if i18n && b.has_localized_name() {
                let localized = b.get_localized_name();
                if localized.to_lowercase().starts_with(&prefix) {
                    completions.push(localized);
                }
            }
            if deep_search {
                if let Some(satellites) = b.get_satellites() {
                    completions.extend(
                        satellites
                            .borrow()
                            .get_completion(&prefix, i18n, true),
                    );
                }
            }
        }
        completions
    }

    /// Pre-order traversal over this system and all satellite systems.
    /// `visit` returns false to abort; the return value is false iff the
    /// traversal was aborted.
    pub fn traverse(&self, visit: &mut dyn FnMut(&BodyRef) -> bool) -> bool {
        for body in &self.bodies {
            if !visit(body) {
                return false;
            }
            let satellites = body.borrow().get_satellites();
            if let Some(satellites) = satellites {
                if !satellites.borrow().traverse(visit) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Star;

    fn test_star() -> StarRef {
        Star::new("Sol", 695_700.0, 5772.0, 1.0).into_ref()
    }

    #[test]
    fn test_find_case_insensitive_with_aliases() {
        let star = test_star();
        let system = PlanetarySystem::around_star(&star);

        let earth = Body::new("Earth");
        PlanetarySystem::add_body(&system, &earth);
        Body::add_alias(&earth, "Sol III");

        let system = system.borrow();
        assert!(system.find("earth", false, false).is_some());
        assert!(system.find("SOL iii", false, false).is_some());
        assert!(system.find("venus", false, false).is_none());
    }

    #[test]
    fn test_localized_name_requires_i18n_and_loses_collisions() {
        let star = test_star();
        let system = PlanetarySystem::around_star(&star);

        let mars = Body::new("Mars");
        mars.borrow_mut().set_localized_name("Ares");
        PlanetarySystem::add_body(&system, &mars);

        // A body whose plain name collides with another body's localized
        // name takes the slot.
        let rival = Body::new("Ares");
        PlanetarySystem::add_body(&system, &rival);

        let system = system.borrow();
        assert!(Rc::ptr_eq(
            &system.find("ares", false, true).unwrap(),
            &rival
        ));
        // Without i18n the localized name never matches Mars.
        let hit = system.find("ares", false, false).unwrap();
        assert!(Rc::ptr_eq(&hit, &rival));
    }

    #[test]
    fn test_deep_search_reaches_grandchildren() {
        let star = test_star();
        let system = PlanetarySystem::around_star(&star);

        let jupiter = Body::new("Jupiter");
        PlanetarySystem::add_body(&system, &jupiter);
        let moons = PlanetarySystem::around_body(&jupiter);
        let io = Body::new("Io");
        PlanetarySystem::add_body(&moons, &io);

        let system = system.borrow();
        assert!(system.find("io", false, false).is_none());
        let found = system.find("Io", true, false).unwrap();
        assert!(Rc::ptr_eq(&found, &io));

        // Satellite systems inherit the star reference.
        assert!(moons.borrow().star().is_some());
    }

    #[test]
    fn test_replace_body_moves_index_entries() {
        let star = test_star();
        let system = PlanetarySystem::around_star(&star);

        let old = Body::new("Planet Nine");
        Body::add_alias(&old, "P9");
        PlanetarySystem::add_body(&system, &old);

        let new = Body::new("Planet Nine");
        PlanetarySystem::replace_body(&system, &old, &new);

        let sys = system.borrow();
        assert_eq!(sys.len(), 1);
        assert!(Rc::ptr_eq(
            &sys.find("planet nine", false, false).unwrap(),
            &new
        ));
        // The old body's alias no longer resolves.
        assert!(sys.find("P9", false, false).is_none());
    }

    #[test]
    fn test_remove_body_clears_index() {
        let star = test_star();
        let system = PlanetarySystem::around_star(&star);
        let body = Body::new("Vulcan");
        PlanetarySystem::add_body(&system, &body);

        assert_eq!(system.borrow().get_order(&body), Some(0));
        system.borrow_mut().remove_body(&body);
        let sys = system.borrow();
        assert!(sys.is_empty());
        assert!(sys.find("vulcan", false, false).is_none());
        assert_eq!(sys.get_order(&body), None);
    }

    #[test]
    fn test_completion_and_traversal() {
        let star = test_star();
        let system = PlanetarySystem::around_star(&star);
        for name in ["Mercury", "Mars", "Venus"] {
            PlanetarySystem::add_body(&system, &Body::new(name));
        }
        let mars = system.borrow().find("Mars", false, false).unwrap();
        let moons = PlanetarySystem::around_body(&mars);
        PlanetarySystem::add_body(&moons, &Body::new("Phobos"));
        PlanetarySystem::add_body(&moons, &Body::new("Deimos"));

        let mut completions = system.borrow().get_completion("me", false, false);
        assert_eq!(completions, vec!["Mercury".to_string()]);
        completions = system.borrow().get_completion("ph", false, true);
        assert_eq!(completions, vec!["Phobos".to_string()]);

        let mut visited = Vec::new();
        system.borrow().traverse(&mut |body| {
            visited.push(body.borrow().get_name(false));
            true
        });
        assert_eq!(visited, vec!["Mercury", "Mars", "Phobos", "Deimos", "Venus"]);

        // Aborted traversal reports false.
        let mut count = 0;
        let completed = system.borrow().traverse(&mut |_| {
            count += 1;
            count < 2
        });
        assert!(!completed);
        assert_eq!(count, 2);
    }
}
