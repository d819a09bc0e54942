#![forbid(unsafe_code)]

//! External reparent legality and outcome computation.
//!
//! The document store knows which structural moves are legal (component
//! boundaries, locked elements, text-only containers) and how a move
//! rewrites the tree. Strategies ask through [`ReparentService`] and never
//! construct reparent edits themselves.

use gesso_core::ElementPath;

use crate::commands::Command;

/// Structural move computed by the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct ReparentOutcome {
    /// Commands that perform the move.
    pub commands: Vec<Command>,
    /// Path of the element after the move.
    pub new_path: ElementPath,
}

/// Legality checks and edits for moving an element to a new parent.
pub trait ReparentService {
    /// Whether `target` may become a child of `new_parent`.
    fn is_allowed_to_reparent(&self, target: &ElementPath, new_parent: &ElementPath) -> bool;

    /// Commands moving `target` under `new_parent` at `index` (appended when
    /// `None`), or `None` when the move cannot be expressed.
    fn reparent_outcome(
        &self,
        target: &ElementPath,
        new_parent: &ElementPath,
        index: Option<usize>,
    ) -> Option<ReparentOutcome>;
}

/// Service that refuses every move.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReparent;

impl ReparentService for NoReparent {
    fn is_allowed_to_reparent(&self, _target: &ElementPath, _new_parent: &ElementPath) -> bool {
        false
    }

    fn reparent_outcome(
        &self,
        _target: &ElementPath,
        _new_parent: &ElementPath,
        _index: Option<usize>,
    ) -> Option<ReparentOutcome> {
        None
    }
}
