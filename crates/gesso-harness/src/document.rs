#![forbid(unsafe_code)]

//! Transactional in-memory document store.
//!
//! [`MemoryDocument`] keeps committed state (tree, selection and editor
//! state) plus an optional transient copy of all three. A transient flush
//! rebuilds the copy from the committed state, so each flush replaces the
//! previous patch instead of stacking on it. A commit applies to the
//! committed state and drops the copy.
//!
//! # Invariants
//!
//! 1. `apply_commands` is all-or-nothing: commands run against a clone and
//!    the clone replaces the live state only when every command succeeded.
//! 2. `discard_transient` restores exactly the committed tree, selection and
//!    editor state.
//! 3. A reparented element keeps its UID; it and all its descendants are
//!    re-keyed under the new parent.

use std::collections::BTreeMap;

use gesso_core::{CursorIcon, ElementPath};
use gesso_layout::{GridCellCoordinates, LayoutMetadataMap, PropertyBag};
use gesso_runtime::{DocumentStore, DocumentStoreError, FlushPhase};
use gesso_strategies::{Command, ElementsToRerender, GridControlsTarget};

// ============================================================================
// Document tree
// ============================================================================

/// Authored properties and child order of every element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTree {
    props: BTreeMap<ElementPath, PropertyBag>,
    /// Child order keyed by parent; roots sit under the empty path.
    children: BTreeMap<ElementPath, Vec<ElementPath>>,
}

impl DocumentTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree mirroring a layout snapshot: authored props and document order.
    #[must_use]
    pub fn from_metadata(metadata: &LayoutMetadataMap) -> Self {
        let mut tree = Self::new();
        let mut ordered: Vec<_> = metadata.all_sorted();
        ordered.sort_by(|a, b| {
            a.element_path
                .depth()
                .cmp(&b.element_path.depth())
                .then(a.index_in_parent.cmp(&b.index_in_parent))
                .then_with(|| a.element_path.cmp(&b.element_path))
        });
        for meta in ordered {
            tree.insert(meta.element_path.clone(), meta.props.clone());
        }
        tree
    }

    /// Append `path` to its parent's children.
    pub fn insert(&mut self, path: ElementPath, props: PropertyBag) {
        let parent = path.parent_path();
        let siblings = self.children.entry(parent).or_default();
        if !siblings.contains(&path) {
            siblings.push(path.clone());
        }
        self.props.insert(path, props);
    }

    #[must_use]
    pub fn contains(&self, path: &ElementPath) -> bool {
        self.props.contains_key(path)
    }

    #[must_use]
    pub fn props(&self, path: &ElementPath) -> Option<&PropertyBag> {
        self.props.get(path)
    }

    #[must_use]
    pub fn children(&self, parent: &ElementPath) -> &[ElementPath] {
        self.children.get(parent).map_or(&[], Vec::as_slice)
    }

    /// Every parent with its ordered children, ordered by parent path.
    pub fn child_lists(&self) -> impl Iterator<Item = (&ElementPath, &[ElementPath])> {
        self.children
            .iter()
            .filter(|(_, children)| !children.is_empty())
            .map(|(parent, children)| (parent, children.as_slice()))
    }

    /// Position of `path` among its siblings.
    #[must_use]
    pub fn index_of(&self, path: &ElementPath) -> Option<usize> {
        self.children(&path.parent_path())
            .iter()
            .position(|child| child == path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    fn props_mut(&mut self, path: &ElementPath) -> Result<&mut PropertyBag, DocumentStoreError> {
        self.props
            .get_mut(path)
            .ok_or_else(|| DocumentStoreError::MissingElement { path: path.clone() })
    }

    fn reorder(&mut self, element: &ElementPath, index: usize) -> Result<(), DocumentStoreError> {
        if !self.contains(element) {
            return Err(DocumentStoreError::MissingElement {
                path: element.clone(),
            });
        }
        let siblings = self.children.entry(element.parent_path()).or_default();
        siblings.retain(|child| child != element);
        let index = index.min(siblings.len());
        siblings.insert(index, element.clone());
        Ok(())
    }

    fn reparent(
        &mut self,
        element: &ElementPath,
        new_parent: &ElementPath,
        index: Option<usize>,
    ) -> Result<ElementPath, DocumentStoreError> {
        let invalid = |reason: &str| DocumentStoreError::InvalidCommand {
            kind: "reparent_element",
            path: element.clone(),
            reason: reason.to_owned(),
        };
        if !self.contains(element) {
            return Err(DocumentStoreError::MissingElement {
                path: element.clone(),
            });
        }
        if !new_parent.is_empty() && !self.contains(new_parent) {
            return Err(DocumentStoreError::MissingElement {
                path: new_parent.clone(),
            });
        }
        if new_parent == element || new_parent.is_descendant_of(element) {
            return Err(invalid("cannot move an element into itself"));
        }
        let uid = element
            .last_uid()
            .ok_or_else(|| invalid("element has no uid"))?;
        let moved = new_parent.append(uid);
        if moved != *element && self.contains(&moved) {
            return Err(invalid("target parent already has a child with this uid"));
        }

        if let Some(siblings) = self.children.get_mut(&element.parent_path()) {
            siblings.retain(|child| child != element);
        }

        let subtree: Vec<ElementPath> = self
            .props
            .keys()
            .filter(|path| *path == element || path.is_descendant_of(element))
            .cloned()
            .collect();
        for old in &subtree {
            let Some(new) = rebase(old, element, &moved) else {
                continue;
            };
            if let Some(props) = self.props.remove(old) {
                self.props.insert(new.clone(), props);
            }
            if let Some(children) = self.children.remove(old) {
                let children = children
                    .iter()
                    .filter_map(|child| rebase(child, element, &moved))
                    .collect();
                self.children.insert(new, children);
            }
        }

        let siblings = self.children.entry(new_parent.clone()).or_default();
        let index = index.map_or(siblings.len(), |index| index.min(siblings.len()));
        siblings.insert(index, moved.clone());
        Ok(moved)
    }
}

/// `path` with its `from` prefix replaced by `to`.
fn rebase(path: &ElementPath, from: &ElementPath, to: &ElementPath) -> Option<ElementPath> {
    if path == from {
        return Some(to.clone());
    }
    let (from_last, from_head) = from.parts().split_last()?;
    let parts = path.parts();
    if parts.len() < from.parts().len() || parts[..from_head.len()] != *from_head {
        return None;
    }
    let shared = &parts[from_head.len()];
    let tail_uids = shared.strip_prefix(from_last.as_slice())?;

    let mut rebased: Vec<Vec<String>> = to.parts().to_vec();
    match rebased.last_mut() {
        Some(last) => last.extend(tail_uids.iter().cloned()),
        None => rebased.push(tail_uids.to_vec()),
    }
    rebased.extend(parts[from_head.len() + 1..].iter().cloned());
    Some(ElementPath::from_parts(rebased))
}

// ============================================================================
// Editor state
// ============================================================================

/// Grid placeholder overlay requested by the last flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridControlsView {
    pub target: GridControlsTarget,
    pub target_cell: Option<GridCellCoordinates>,
    pub root_cell: Option<GridCellCoordinates>,
}

/// Editor-only state written by commands that do not touch the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub cursor: Option<CursorIcon>,
    pub grid_controls: Option<GridControlsView>,
    pub elements_to_rerender: Option<ElementsToRerender>,
}

/// One accepted flush.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushRecord {
    pub phase: FlushPhase,
    pub commands: Vec<Command>,
}

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
struct LiveState {
    tree: DocumentTree,
    selection: Vec<ElementPath>,
    editor: EditorState,
}

impl LiveState {
    fn apply(&mut self, command: &Command) -> Result<(), DocumentStoreError> {
        match command {
            Command::SetProperty {
                element,
                property,
                value,
                ..
            } => {
                self.tree.props_mut(element)?.set(property.clone(), value.clone());
            }
            Command::DeleteProperties {
                element,
                properties,
                ..
            } => {
                let props = self.tree.props_mut(element)?;
                for property in properties {
                    props.remove(property);
                }
            }
            Command::ReorderElement { element, index, .. } => {
                self.tree.reorder(element, *index)?;
            }
            Command::ReparentElement {
                element,
                new_parent,
                index,
                ..
            } => {
                let moved = self.tree.reparent(element, new_parent, *index)?;
                for selected in &mut self.selection {
                    if let Some(rebased) = rebase(selected, element, &moved) {
                        *selected = rebased;
                    }
                }
            }
            Command::UpdateSelectedViews { paths, .. } => {
                self.selection = paths.clone();
            }
            Command::ShowGridControls {
                target,
                target_cell,
                root_cell,
                ..
            } => {
                self.editor.grid_controls = Some(GridControlsView {
                    target: target.clone(),
                    target_cell: *target_cell,
                    root_cell: *root_cell,
                });
            }
            Command::SetCursor { cursor, .. } => self.editor.cursor = Some(*cursor),
            Command::SetElementsToRerender { elements, .. } => {
                self.editor.elements_to_rerender = Some(elements.clone());
            }
        }
        Ok(())
    }
}

/// In-memory [`DocumentStore`] with transient patches and a flush log.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    committed: LiveState,
    /// Tree, selection and editor state of the last transient flush.
    transient: Option<LiveState>,
    flushes: Vec<FlushRecord>,
}

impl MemoryDocument {
    #[must_use]
    pub fn new(tree: DocumentTree, selection: Vec<ElementPath>) -> Self {
        Self {
            committed: LiveState {
                tree,
                selection,
                editor: EditorState::default(),
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_metadata(metadata: &LayoutMetadataMap, selection: Vec<ElementPath>) -> Self {
        Self::new(DocumentTree::from_metadata(metadata), selection)
    }

    #[must_use]
    pub fn committed(&self) -> &DocumentTree {
        &self.committed.tree
    }

    /// The transient patch, if one is applied.
    #[must_use]
    pub fn transient(&self) -> Option<&DocumentTree> {
        self.transient.as_ref().map(|state| &state.tree)
    }

    /// What the canvas shows: the transient patch when present.
    #[must_use]
    pub fn view(&self) -> &DocumentTree {
        &self.live().tree
    }

    #[must_use]
    pub fn editor(&self) -> &EditorState {
        &self.live().editor
    }

    #[must_use]
    pub fn selection(&self) -> &[ElementPath] {
        &self.live().selection
    }

    /// Selection as of the last commit, ignoring any transient patch.
    #[must_use]
    pub fn committed_selection(&self) -> &[ElementPath] {
        &self.committed.selection
    }

    /// Every accepted flush, oldest first.
    #[must_use]
    pub fn flushes(&self) -> &[FlushRecord] {
        &self.flushes
    }

    /// Number of accepted committed transactions.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.flushes
            .iter()
            .filter(|flush| flush.phase == FlushPhase::Commit)
            .count()
    }

    fn live(&self) -> &LiveState {
        self.transient.as_ref().unwrap_or(&self.committed)
    }
}

impl DocumentStore for MemoryDocument {
    fn apply_commands(
        &mut self,
        commands: &[Command],
        phase: FlushPhase,
    ) -> Result<(), DocumentStoreError> {
        let mut next = self.committed.clone();
        for command in commands {
            next.apply(command)?;
        }

        match phase {
            FlushPhase::Transient => self.transient = Some(next),
            FlushPhase::Commit => {
                self.committed = next;
                self.transient = None;
            }
        }
        self.flushes.push(FlushRecord {
            phase,
            commands: commands.to_vec(),
        });
        Ok(())
    }

    fn discard_transient(&mut self) {
        self.transient = None;
    }

    fn current_selection(&self) -> Vec<ElementPath> {
        self.live().selection.clone()
    }

    fn set_selection(&mut self, selection: Vec<ElementPath>) {
        if let Some(transient) = &mut self.transient {
            transient.selection.clone_from(&selection);
        }
        self.committed.selection = selection;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesso_layout::PropertyPath;
    use gesso_strategies::WhenToRun;
    use gesso_strategies::commands::{
        reorder_element, reparent_element, set_cursor, set_property, update_selected_views,
    };

    fn path(s: &str) -> ElementPath {
        s.parse().expect("valid path")
    }

    fn tree() -> DocumentTree {
        let mut tree = DocumentTree::new();
        for p in ["root", "root/a", "root/b", "root/c", "root/a/x", "board"] {
            tree.insert(path(p), PropertyBag::new());
        }
        tree
    }

    fn document() -> MemoryDocument {
        MemoryDocument::new(tree(), vec![path("root/a")])
    }

    #[test]
    fn transient_flushes_replace_each_other() {
        let mut doc = document();
        let width = |w: f64| {
            vec![set_property(
                WhenToRun::Always,
                &path("root/a"),
                PropertyPath::style("width"),
                w,
            )]
        };
        doc.apply_commands(&width(10.0), FlushPhase::Transient).expect("flush");
        doc.apply_commands(&[], FlushPhase::Transient).expect("flush");
        assert_eq!(doc.view(), doc.committed());

        doc.apply_commands(&width(20.0), FlushPhase::Transient).expect("flush");
        let props = doc.view().props(&path("root/a")).expect("a");
        assert_eq!(props.style_number("width"), Some(20.0));
        assert_eq!(
            doc.committed().props(&path("root/a")).expect("a").style_number("width"),
            None
        );

        doc.discard_transient();
        assert!(doc.transient().is_none());
        assert_eq!(doc.view(), &tree());
    }

    #[test]
    fn transient_selection_and_cursor_do_not_leak() {
        let mut doc = document();
        doc.apply_commands(
            &[
                reparent_element(WhenToRun::Always, &path("root/a"), &path("board"), None),
                set_cursor(WhenToRun::MidInteraction, CursorIcon::Reparent),
            ],
            FlushPhase::Transient,
        )
        .expect("flush");
        assert_eq!(doc.selection(), &[path("board/a")]);
        assert_eq!(doc.editor().cursor, Some(CursorIcon::Reparent));
        assert_eq!(doc.committed_selection(), &[path("root/a")]);

        doc.apply_commands(
            &[reorder_element(WhenToRun::Always, &path("root/a"), 1)],
            FlushPhase::Transient,
        )
        .expect("flush");
        assert_eq!(doc.selection(), &[path("root/a")]);
        assert_eq!(doc.editor().cursor, None);

        doc.apply_commands(
            &[set_cursor(WhenToRun::MidInteraction, CursorIcon::Move)],
            FlushPhase::Transient,
        )
        .expect("flush");
        doc.discard_transient();
        assert_eq!(doc.editor(), &EditorState::default());
        assert_eq!(doc.selection(), &[path("root/a")]);
    }

    #[test]
    fn failed_flush_applies_nothing() {
        let mut doc = document();
        let commands = vec![
            set_cursor(WhenToRun::Always, CursorIcon::Move),
            update_selected_views(WhenToRun::Always, vec![path("root/b")]),
            reorder_element(WhenToRun::Always, &path("nope"), 0),
        ];
        let err = doc
            .apply_commands(&commands, FlushPhase::Commit)
            .expect_err("missing element");
        assert_eq!(err, DocumentStoreError::MissingElement { path: path("nope") });
        assert_eq!(doc.committed(), &tree());
        assert_eq!(doc.selection(), &[path("root/a")]);
        assert_eq!(doc.editor(), &EditorState::default());
        assert!(doc.flushes().is_empty());
    }

    #[test]
    fn reorder_clamps_to_sibling_count() {
        let mut doc = document();
        doc.apply_commands(
            &[reorder_element(WhenToRun::Always, &path("root/a"), 9)],
            FlushPhase::Commit,
        )
        .expect("commit");
        assert_eq!(
            doc.committed().children(&path("root")),
            &[path("root/b"), path("root/c"), path("root/a")]
        );
        assert_eq!(doc.commit_count(), 1);
    }

    #[test]
    fn reparent_moves_subtree_and_selection() {
        let mut doc = document();
        doc.apply_commands(
            &[reparent_element(
                WhenToRun::Always,
                &path("root/a"),
                &path("board"),
                None,
            )],
            FlushPhase::Commit,
        )
        .expect("commit");
        let tree = doc.committed();
        assert!(!tree.contains(&path("root/a")));
        assert!(tree.contains(&path("board/a")));
        assert!(tree.contains(&path("board/a/x")));
        assert_eq!(tree.children(&path("board/a")), &[path("board/a/x")]);
        assert_eq!(tree.children(&path("root")), &[path("root/b"), path("root/c")]);
        assert_eq!(doc.selection(), &[path("board/a")]);
    }

    #[test]
    fn reparent_into_own_subtree_is_invalid() {
        let mut doc = document();
        let err = doc
            .apply_commands(
                &[reparent_element(
                    WhenToRun::Always,
                    &path("root/a"),
                    &path("root/a/x"),
                    Some(0),
                )],
                FlushPhase::Commit,
            )
            .expect_err("cycle");
        assert!(matches!(
            err,
            DocumentStoreError::InvalidCommand {
                kind: "reparent_element",
                ..
            }
        ));
    }

    #[test]
    fn rebase_handles_scene_parts() {
        let from = path("app/scene:root/a");
        let to = path("app/scene:root/board/a");
        assert_eq!(rebase(&path("app/scene:root/a/b:inner"), &from, &to), Some(path("app/scene:root/board/a/b:inner")));
        assert_eq!(rebase(&path("app/scene:root/ab"), &from, &to), None);
        assert_eq!(rebase(&path("app/other:root/a"), &from, &to), None);
    }
}
