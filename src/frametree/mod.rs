//! Frame hierarchy bookkeeping
//!
//! A [`FrameTree`] hangs off any body that has satellites: a non-owning list
//! of the child bodies whose default frames center on it, a dirty flag, and
//! an aggregate classification mask over the children. Invalidation is
//! pull-based: mutations set the flag and climb toward the root without
//! recomputing anything; consumers that cache derived state (culling radii,
//! render-side orbit samples) check and clear the flag once per query pass.

use crate::body::{BodyRef, ClassificationMask};
use crate::MAX_FRAME_DEPTH;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::body::Body;

pub struct FrameTree {
    owner: Weak<RefCell<Body>>,
    children: RefCell<Vec<Weak<RefCell<Body>>>>,
    changed: Cell<bool>,
}

impl FrameTree {
    pub fn new(owner: Weak<RefCell<Body>>) -> Self {
        FrameTree {
            owner,
            children: RefCell::new(Vec::new()),
            changed: Cell::new(true),
        }
    }

    /// The body this tree hangs off, if still alive.
    pub fn owner(&self) -> Option<BodyRef> {
        self.owner.upgrade()
    }

    pub fn add_child(&self, child: &BodyRef) {
        self.children.borrow_mut().push(Rc::downgrade(child));
        self.mark_updated();
    }

    pub fn remove_child(&self, child: &BodyRef) {
        let mut children = self.children.borrow_mut();
        let before = children.len();
        children.retain(|c| !c.ptr_eq(&Rc::downgrade(child)));
        if children.len() != before {
            drop(children);
            self.mark_updated();
        }
    }

    /// Live child bodies. Children dropped elsewhere are pruned from the
    /// returned list (not from the tree; pruning storage would be a mutation
    /// during what may be a read pass).
    pub fn children(&self) -> Vec<BodyRef> {
        let children = self.children.borrow();
        let live: Vec<BodyRef> = children.iter().filter_map(Weak::upgrade).collect();
        if live.len() != children.len() {
            log::warn!(
                "frame tree lost {} dangling child reference(s)",
                children.len() - live.len()
            );
        }
        live
    }

    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    /// Set the dirty flag and climb to the root of the hierarchy, marking
    /// each ancestor tree on the way. No recomputation happens here.
    pub fn mark_updated(&self) {
        self.changed.set(true);

        // Climb via the owning body's parent system primary. The hierarchy
        // is finite; the depth cap only guards malformed graphs.
        let mut current = self.parent_tree();
        let mut depth = 0;
        while let Some(tree) = current {
            tree.changed.set(true);
            depth += 1;
            if depth > MAX_FRAME_DEPTH {
                log::warn!("frame tree parent chain exceeds {MAX_FRAME_DEPTH} levels; cycle?");
                break;
            }
            current = tree.parent_tree();
        }
    }

    fn parent_tree(&self) -> Option<Rc<FrameTree>> {
        let owner = self.owner.upgrade()?;
        let system = owner.try_borrow().ok()?.system()?;
        let primary = system.try_borrow().ok()?.primary()?;
        let tree = primary.try_borrow().ok()?.frame_tree();
        tree
    }

    pub fn is_updated(&self) -> bool {
        self.changed.get()
    }

    pub fn reset_updated(&self) {
        self.changed.set(false);
    }

    /// Bitwise union of the classifications of all direct (live) children.
    /// Recomputed on demand; the cost is one pass over the child list.
    pub fn child_class_mask(&self) -> ClassificationMask {
        self.children()
            .iter()
            .fold(ClassificationMask::empty(), |mask, child| {
                mask | child.borrow().classification().mask()
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::body::{Body, BodyClassification};

    #[test]
    fn test_child_class_mask_unions_children() {
        let parent = Body::new("parent");
        let tree = Body::get_or_create_frame_tree(&parent);

        let moon = Body::new("moon");
        moon.borrow_mut().set_classification(BodyClassification::Moon);
        let rock = Body::new("rock");
        rock.borrow_mut()
            .set_classification(BodyClassification::Asteroid);

        tree.add_child(&moon);
        tree.add_child(&rock);

        let mask = tree.child_class_mask();
        assert!(mask.contains(BodyClassification::Moon));
        assert!(mask.contains(BodyClassification::Asteroid));
        assert!(!mask.contains(BodyClassification::Planet));
    }

    #[test]
    fn test_dropped_children_are_pruned_from_view() {
        let parent = Body::new("parent");
        let tree = Body::get_or_create_frame_tree(&parent);
        {
            let ephemeral = Body::new("ephemeral");
            tree.add_child(&ephemeral);
            assert_eq!(tree.children().len(), 1);
        }
        assert_eq!(tree.children().len(), 0);
        // Storage still remembers the slot; only the view filters it.
        assert_eq!(tree.child_count(), 1);
    }

    #[test]
    fn test_mark_updated_sets_flag_without_recompute() {
        let parent = Body::new("parent");
        let tree = Body::get_or_create_frame_tree(&parent);
        tree.reset_updated();
        assert!(!tree.is_updated());
        tree.mark_updated();
        assert!(tree.is_updated());
        tree.reset_updated();
        assert!(!tree.is_updated());
    }
}
