#![forbid(unsafe_code)]

//! Reference [`ReparentService`] backed by a layout snapshot.

use std::collections::BTreeSet;
use std::sync::Arc;

use gesso_core::ElementPath;
use gesso_layout::LayoutMetadataMap;
use gesso_strategies::commands::reparent_element;
use gesso_strategies::{ReparentOutcome, ReparentService, WhenToRun};

/// Allows a move when the new parent exists, accepts children and is not
/// inside the moved element. Locked elements never move.
#[derive(Debug, Clone)]
pub struct TreeReparentService {
    metadata: Arc<LayoutMetadataMap>,
    locked: BTreeSet<ElementPath>,
}

impl TreeReparentService {
    #[must_use]
    pub fn new(metadata: Arc<LayoutMetadataMap>) -> Self {
        Self {
            metadata,
            locked: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_locked(mut self, path: ElementPath) -> Self {
        self.locked.insert(path);
        self
    }

    /// Follow a newly published snapshot.
    pub fn set_metadata(&mut self, metadata: Arc<LayoutMetadataMap>) {
        self.metadata = metadata;
    }
}

impl ReparentService for TreeReparentService {
    fn is_allowed_to_reparent(&self, target: &ElementPath, new_parent: &ElementPath) -> bool {
        if self.locked.contains(target) || !self.metadata.contains(target) {
            return false;
        }
        if new_parent == target || new_parent.is_descendant_of(target) {
            return false;
        }
        self.metadata
            .get(new_parent)
            .is_some_and(|parent| parent.accepts_children)
    }

    fn reparent_outcome(
        &self,
        target: &ElementPath,
        new_parent: &ElementPath,
        index: Option<usize>,
    ) -> Option<ReparentOutcome> {
        if !self.is_allowed_to_reparent(target, new_parent) {
            return None;
        }
        let uid = target.last_uid()?;
        Some(ReparentOutcome {
            commands: vec![reparent_element(
                WhenToRun::Always,
                target,
                new_parent,
                index,
            )],
            new_path: new_parent.append(uid),
        })
    }
}
