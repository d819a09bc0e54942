#![forbid(unsafe_code)]

//! Per-element layout metadata snapshots.
//!
//! A [`LayoutMetadataMap`] is produced by the external measurement pass after
//! every render. It is built once, wrapped in an `Arc`, and never mutated
//! afterwards; a new render publishes a new map.
//!
//! # Invariants
//!
//! 1. Keys are unique; insertion order is irrelevant.
//! 2. Child enumeration is in document order (`index_in_parent`, then path).
//! 3. Lookups of unknown paths return `None`, never panic.

use gesso_core::{CanvasPoint, CanvasRect, ElementPath, MaybeInfiniteRect};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::grid::{GridCellGlobalFrames, GridContainerProperties, GridElementProperties};
use crate::props::PropertyBag;

/// CSS-like positioning mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionMode {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl PositionMode {
    /// Taken out of the parent's flow (`absolute` or `fixed`).
    #[inline]
    pub const fn is_absolute(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }

    /// Participates in the parent's flow or flex layout.
    #[inline]
    pub const fn is_in_flow(self) -> bool {
        !self.is_absolute()
    }
}

/// How a container lays out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSystem {
    #[default]
    Flow,
    Flex,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexDirection {
    #[default]
    Row,
    RowReverse,
    Column,
    ColumnReverse,
}

impl FlexDirection {
    #[inline]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Row | Self::RowReverse)
    }

    #[inline]
    pub const fn is_reversed(self) -> bool {
        matches!(self, Self::RowReverse | Self::ColumnReverse)
    }
}

/// Measurements only the renderer can provide.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialSizeMeasurements {
    pub position: PositionMode,
    pub parent_layout_system: LayoutSystem,
    pub layout_system_for_children: Option<LayoutSystem>,
    pub parent_flex_direction: Option<FlexDirection>,
    pub flex_direction: Option<FlexDirection>,
    /// Cell frames of the parent grid, if the parent is a grid.
    pub parent_grid_cell_global_frames: Option<GridCellGlobalFrames>,
    /// Cell frames of this element, if it is a grid.
    pub grid_cell_global_frames: Option<GridCellGlobalFrames>,
    pub parent_container_grid_properties: GridContainerProperties,
    pub container_grid_properties: GridContainerProperties,
    /// Measured placement of this element inside its parent grid.
    pub element_grid_properties: GridElementProperties,
    pub immediate_parent_bounds: Option<CanvasRect>,
    /// Absolutely positioned children are placed relative to this element.
    pub provides_bounds_for_absolute_children: bool,
}

/// Snapshot of one element instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMetadata {
    pub element_path: ElementPath,
    /// Position among its siblings in document order.
    #[serde(default)]
    pub index_in_parent: usize,
    #[serde(default)]
    pub global_frame: MaybeInfiniteRect,
    #[serde(default)]
    pub special_size_measurements: SpecialSizeMeasurements,
    #[serde(default)]
    pub props: PropertyBag,
    #[serde(default)]
    pub accepts_children: bool,
    /// The element forwards `style` to its rendered root, so the tool fully
    /// controls its layout properties.
    #[serde(default = "default_true")]
    pub honours_style_props: bool,
    /// Fragments and similar wrappers render no box of their own.
    #[serde(default)]
    pub is_fragment_like: bool,
}

fn default_true() -> bool {
    true
}

impl ElementMetadata {
    /// Minimal metadata for `path`.
    #[must_use]
    pub fn new(element_path: ElementPath) -> Self {
        Self {
            element_path,
            index_in_parent: 0,
            global_frame: MaybeInfiniteRect::Infinite,
            special_size_measurements: SpecialSizeMeasurements::default(),
            props: PropertyBag::default(),
            accepts_children: false,
            honours_style_props: true,
            is_fragment_like: false,
        }
    }

    /// Measured frame, `None` while unmeasured.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> Option<CanvasRect> {
        self.global_frame.as_finite()
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> PositionMode {
        self.special_size_measurements.position
    }

    #[inline]
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.position().is_absolute()
    }

    #[must_use]
    pub fn is_grid_item(&self) -> bool {
        self.special_size_measurements.parent_layout_system == LayoutSystem::Grid
    }

    #[must_use]
    pub fn is_grid_container(&self) -> bool {
        self.special_size_measurements.layout_system_for_children == Some(LayoutSystem::Grid)
    }

    #[must_use]
    pub fn is_flex_container(&self) -> bool {
        self.special_size_measurements.layout_system_for_children == Some(LayoutSystem::Flex)
    }

    /// Measured frame contains `point`.
    #[must_use]
    pub fn contains_point(&self, point: CanvasPoint) -> bool {
        self.frame().is_some_and(|frame| frame.contains_point(point))
    }
}

/// Immutable per-render snapshot of every element's metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutMetadataMap {
    elements: FxHashMap<ElementPath, ElementMetadata>,
}

impl LayoutMetadataMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one element. Used while building a snapshot.
    pub fn insert(&mut self, metadata: ElementMetadata) {
        self.elements.insert(metadata.element_path.clone(), metadata);
    }

    #[must_use]
    pub fn get(&self, path: &ElementPath) -> Option<&ElementMetadata> {
        self.elements.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &ElementPath) -> bool {
        self.elements.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn parent_of(&self, path: &ElementPath) -> Option<&ElementMetadata> {
        if path.is_empty() {
            return None;
        }
        self.get(&path.parent_path())
    }

    /// Every element, ordered by path. Iteration over the backing map is
    /// unordered, so callers that need determinism go through here.
    #[must_use]
    pub fn all_sorted(&self) -> Vec<&ElementMetadata> {
        let mut all: Vec<&ElementMetadata> = self.elements.values().collect();
        all.sort_by(|a, b| a.element_path.cmp(&b.element_path));
        all
    }

    /// Direct children of `path` in document order.
    #[must_use]
    pub fn children_of(&self, path: &ElementPath) -> Vec<&ElementMetadata> {
        let mut children: Vec<&ElementMetadata> = self
            .elements
            .values()
            .filter(|meta| meta.element_path.is_child_of(path))
            .collect();
        sort_document_order(&mut children);
        children
    }

    /// Siblings of `path` in document order, excluding `path` itself.
    #[must_use]
    pub fn siblings_of(&self, path: &ElementPath) -> Vec<&ElementMetadata> {
        let mut siblings: Vec<&ElementMetadata> = self
            .elements
            .values()
            .filter(|meta| meta.element_path.is_sibling_of(path))
            .collect();
        sort_document_order(&mut siblings);
        siblings
    }

    /// Strict descendants of `path`, ordered by path.
    #[must_use]
    pub fn descendants_of(&self, path: &ElementPath) -> Vec<&ElementMetadata> {
        let mut descendants: Vec<&ElementMetadata> = self
            .elements
            .values()
            .filter(|meta| meta.element_path.is_descendant_of(path))
            .collect();
        descendants.sort_by(|a, b| a.element_path.cmp(&b.element_path));
        descendants
    }

    /// Replace fragment-like paths with their children, recursively.
    ///
    /// Fragments render no box of their own, so operations on them really
    /// act on their children. Unknown paths are kept as they are.
    #[must_use]
    pub fn flatten_fragment_like(&self, paths: &[ElementPath]) -> Vec<ElementPath> {
        let mut flattened = Vec::with_capacity(paths.len());
        for path in paths {
            self.flatten_into(path, &mut flattened);
        }
        gesso_core::unique_element_paths(&flattened)
    }

    fn flatten_into(&self, path: &ElementPath, out: &mut Vec<ElementPath>) {
        match self.get(path) {
            Some(meta) if meta.is_fragment_like => {
                for child in self.children_of(path) {
                    self.flatten_into(&child.element_path, out);
                }
            }
            _ => out.push(path.clone()),
        }
    }
}

impl FromIterator<ElementMetadata> for LayoutMetadataMap {
    fn from_iter<T: IntoIterator<Item = ElementMetadata>>(iter: T) -> Self {
        let mut map = Self::new();
        for metadata in iter {
            map.insert(metadata);
        }
        map
    }
}

fn sort_document_order(elements: &mut [&ElementMetadata]) {
    elements.sort_by(|a, b| {
        a.index_in_parent
            .cmp(&b.index_in_parent)
            .then_with(|| a.element_path.cmp(&b.element_path))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> ElementPath {
        s.parse().expect("valid path")
    }

    fn element(p: &str, index: usize) -> ElementMetadata {
        ElementMetadata {
            index_in_parent: index,
            ..ElementMetadata::new(path(p))
        }
    }

    #[test]
    fn children_follow_document_order() {
        let map: LayoutMetadataMap = [
            element("sb/root", 0),
            element("sb/root/c", 2),
            element("sb/root/a", 0),
            element("sb/root/b", 1),
            element("sb/root/b/nested", 0),
        ]
        .into_iter()
        .collect();

        let children: Vec<String> = map
            .children_of(&path("sb/root"))
            .iter()
            .map(|m| m.element_path.to_string())
            .collect();
        assert_eq!(children, vec!["sb/root/a", "sb/root/b", "sb/root/c"]);

        let siblings: Vec<String> = map
            .siblings_of(&path("sb/root/b"))
            .iter()
            .map(|m| m.element_path.to_string())
            .collect();
        assert_eq!(siblings, vec!["sb/root/a", "sb/root/c"]);
        assert_eq!(map.descendants_of(&path("sb/root")).len(), 4);
    }

    #[test]
    fn fragments_flatten_to_children() {
        let mut fragment = element("sb/root/frag", 0);
        fragment.is_fragment_like = true;
        let map: LayoutMetadataMap = [
            element("sb/root", 0),
            fragment,
            element("sb/root/frag/x", 0),
            element("sb/root/frag/y", 1),
            element("sb/root/z", 1),
        ]
        .into_iter()
        .collect();

        let flattened = map.flatten_fragment_like(&[path("sb/root/frag"), path("sb/root/z")]);
        assert_eq!(
            flattened,
            vec![path("sb/root/frag/x"), path("sb/root/frag/y"), path("sb/root/z")]
        );
    }

    #[test]
    fn unknown_paths_are_none() {
        let map = LayoutMetadataMap::new();
        assert!(map.get(&path("sb/missing")).is_none());
        assert!(map.parent_of(&path("sb/missing")).is_none());
        assert!(map.children_of(&path("sb")).is_empty());
    }

    #[test]
    fn unmeasured_element_contains_nothing() {
        let meta = element("sb/root", 0);
        assert!(meta.frame().is_none());
        assert!(!meta.contains_point(CanvasPoint::new(0.0, 0.0)));
    }

    #[test]
    fn metadata_defaults_from_json() {
        let meta: ElementMetadata =
            serde_json::from_str(r#"{"element_path":"sb/root"}"#).expect("deserialize");
        assert!(meta.honours_style_props);
        assert_eq!(meta.position(), PositionMode::Static);
        assert!(!meta.global_frame.is_finite());
    }
}
