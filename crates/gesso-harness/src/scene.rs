#![forbid(unsafe_code)]

//! Declarative scene fixtures.
//!
//! [`SceneBuilder`] lays out a small document the way the renderer would
//! measure it. Children inherit their parent's layout system, flex
//! direction, bounds and grid cell frames, and `index_in_parent` follows
//! insertion order, so a fixture only states what differs from a plain
//! static element.
//!
//! ```rust,ignore
//! let scene = SceneBuilder::new()
//!     .flex("root", CanvasRect::new(0.0, 0.0, 300.0, 100.0), FlexDirection::Row)
//!     .element("root/a", CanvasRect::new(0.0, 0.0, 100.0, 100.0))
//!     .element("root/b", CanvasRect::new(100.0, 0.0, 100.0, 100.0))
//!     .select("root/a")
//!     .build()?;
//! ```

use std::fmt;
use std::sync::Arc;

use gesso_core::{
    CanvasPoint, CanvasRect, ElementPath, ElementPathParseError, MaybeInfiniteRect,
};
use gesso_layout::{
    ElementMetadata, FlexDirection, GridCellCoordinates, GridCellGlobalFrames,
    GridContainerProperties, GridElementProperties, GridTemplate, LayoutMetadataMap,
    LayoutSystem, PositionMode, PropertyBag,
};

use crate::document::MemoryDocument;
use crate::reparent::TreeReparentService;

/// Why a fixture could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    InvalidPath(ElementPathParseError),
    DuplicateElement { path: ElementPath },
    /// The parent of a non-root element was not added first.
    MissingParent { path: ElementPath },
    NotAGrid { path: ElementPath },
    CellOutOfGrid {
        path: ElementPath,
        cell: GridCellCoordinates,
    },
    UnknownSelection { path: ElementPath },
    /// A modifier was called before any element was added.
    NoElement,
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPath(error) => write!(f, "invalid element path: {error}"),
            Self::DuplicateElement { path } => write!(f, "element {path} added twice"),
            Self::MissingParent { path } => write!(f, "parent of {path} is not in the scene"),
            Self::NotAGrid { path } => write!(f, "{path} is not a grid container"),
            Self::CellOutOfGrid { path, cell } => write!(
                f,
                "cell (row {}, column {}) is outside the grid of {path}",
                cell.row, cell.column
            ),
            Self::UnknownSelection { path } => write!(f, "selected element {path} is not in the scene"),
            Self::NoElement => write!(f, "no element to modify"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPath(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ElementPathParseError> for SceneError {
    fn from(error: ElementPathParseError) -> Self {
        Self::InvalidPath(error)
    }
}

/// Builder for a measured layout snapshot and a selection.
///
/// The first error is kept and reported by [`SceneBuilder::build`]; later
/// calls are ignored once an error has been recorded.
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    elements: Vec<ElementMetadata>,
    selection: Vec<ElementPath>,
    error: Option<SceneError>,
}

impl SceneBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A static leaf element.
    #[must_use]
    pub fn element(self, path: &str, frame: CanvasRect) -> Self {
        self.add(path, frame, |_| Ok(()))
    }

    /// A container laying out its children with `layout`.
    #[must_use]
    pub fn container(self, path: &str, frame: CanvasRect, layout: LayoutSystem) -> Self {
        self.add(path, frame, |meta| {
            make_container(meta, layout);
            Ok(())
        })
    }

    #[must_use]
    pub fn flex(self, path: &str, frame: CanvasRect, direction: FlexDirection) -> Self {
        self.add(path, frame, |meta| {
            make_container(meta, LayoutSystem::Flex);
            meta.special_size_measurements.flex_direction = Some(direction);
            Ok(())
        })
    }

    /// A flow container that absolutely positioned children are placed in.
    #[must_use]
    pub fn absolute_board(self, path: &str, frame: CanvasRect) -> Self {
        self.add(path, frame, |meta| {
            make_container(meta, LayoutSystem::Flow);
            meta.special_size_measurements
                .provides_bounds_for_absolute_children = true;
            Ok(())
        })
    }

    /// A `rows` x `columns` grid of square `cell_size` cells with `1fr`
    /// templates, its top-left corner at `origin`.
    #[must_use]
    pub fn grid(
        self,
        path: &str,
        origin: CanvasPoint,
        rows: usize,
        columns: usize,
        cell_size: f64,
    ) -> Self {
        let frame = CanvasRect::new(
            origin.x,
            origin.y,
            columns as f64 * cell_size,
            rows as f64 * cell_size,
        );
        self.add(path, frame, |meta| {
            make_container(meta, LayoutSystem::Grid);
            let m = &mut meta.special_size_measurements;
            m.grid_cell_global_frames = Some(GridCellGlobalFrames::uniform(
                origin, rows, columns, cell_size, cell_size, 0.0,
            ));
            m.container_grid_properties = GridContainerProperties {
                grid_template_columns: Some(GridTemplate::repeat(columns, "1fr")),
                grid_template_rows: Some(GridTemplate::repeat(rows, "1fr")),
            };
            Ok(())
        })
    }

    /// A grid item occupying exactly `cell` of its parent grid, with the
    /// four longhand placement properties authored.
    #[must_use]
    pub fn grid_item(mut self, path: &str, cell: GridCellCoordinates) -> Self {
        if self.error.is_some() {
            return self;
        }
        let parsed = match path.parse::<ElementPath>() {
            Ok(parsed) => parsed,
            Err(error) => return self.fail(error.into()),
        };
        let parent_path = parsed.parent_path();
        let frames = self
            .find(&parent_path)
            .and_then(|parent| parent.special_size_measurements.grid_cell_global_frames.as_ref());
        let Some(frames) = frames else {
            return self.fail(SceneError::NotAGrid { path: parent_path });
        };
        let Some(frame) = frames.cell_frame(cell) else {
            return self.fail(SceneError::CellOutOfGrid {
                path: parent_path,
                cell,
            });
        };
        self.add(path, frame, |meta| {
            meta.special_size_measurements.element_grid_properties =
                GridElementProperties::at_cell(cell);
            meta.props = PropertyBag::new()
                .with_style("gridColumnStart", cell.column)
                .with_style("gridColumnEnd", cell.column + 1)
                .with_style("gridRowStart", cell.row)
                .with_style("gridRowEnd", cell.row + 1);
            Ok(())
        })
    }

    /// Make the last element absolutely positioned, authoring `left`, `top`,
    /// `width` and `height` relative to its parent.
    #[must_use]
    pub fn absolute(self) -> Self {
        self.modify_last(|meta| {
            let m = &mut meta.special_size_measurements;
            m.position = PositionMode::Absolute;
            let frame = meta.global_frame.as_finite().unwrap_or_default();
            let origin = m
                .immediate_parent_bounds
                .map_or(CanvasPoint::new(0.0, 0.0), |bounds| bounds.origin());
            meta.props = std::mem::take(&mut meta.props)
                .with_style("position", "absolute")
                .with_style("left", frame.x - origin.x)
                .with_style("top", frame.y - origin.y)
                .with_style("width", frame.width)
                .with_style("height", frame.height);
        })
    }

    #[must_use]
    pub fn positioned(self, position: PositionMode) -> Self {
        self.modify_last(|meta| meta.special_size_measurements.position = position)
    }

    /// Merge `props` into the last element's authored properties.
    #[must_use]
    pub fn props(self, props: PropertyBag) -> Self {
        self.modify_last(|meta| {
            for (path, value) in props.iter() {
                meta.props.set(path.clone(), value.clone());
            }
        })
    }

    /// The last element ignores `style`, so layout strategies leave it alone.
    #[must_use]
    pub fn ignores_style(self) -> Self {
        self.modify_last(|meta| meta.honours_style_props = false)
    }

    #[must_use]
    pub fn select(mut self, path: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        match path.parse::<ElementPath>() {
            Ok(parsed) => {
                self.selection.push(parsed);
                self
            }
            Err(error) => self.fail(error.into()),
        }
    }

    pub fn build(self) -> Result<Scene, SceneError> {
        let Self {
            elements,
            selection,
            error,
        } = self;
        if let Some(error) = error {
            return Err(error);
        }
        if let Some(path) = selection
            .iter()
            .find(|path| !elements.iter().any(|meta| meta.element_path == **path))
        {
            return Err(SceneError::UnknownSelection { path: path.clone() });
        }
        Ok(Scene {
            metadata: Arc::new(elements.into_iter().collect()),
            selection,
        })
    }

    fn add(
        mut self,
        path: &str,
        frame: CanvasRect,
        configure: impl FnOnce(&mut ElementMetadata) -> Result<(), SceneError>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let parsed = match path.parse::<ElementPath>() {
            Ok(parsed) => parsed,
            Err(error) => return self.fail(error.into()),
        };
        if self.find(&parsed).is_some() {
            return self.fail(SceneError::DuplicateElement { path: parsed });
        }

        let parent_path = parsed.parent_path();
        let mut meta = ElementMetadata::new(parsed.clone());
        meta.global_frame = MaybeInfiniteRect::Finite(frame);
        if !parent_path.is_empty() {
            let Some(parent) = self.find(&parent_path) else {
                return self.fail(SceneError::MissingParent { path: parsed });
            };
            inherit_from_parent(&mut meta, parent);
        }
        meta.index_in_parent = self
            .elements
            .iter()
            .filter(|other| other.element_path.parent_path() == parent_path)
            .count();

        if let Err(error) = configure(&mut meta) {
            return self.fail(error);
        }
        self.elements.push(meta);
        self
    }

    fn modify_last(mut self, modify: impl FnOnce(&mut ElementMetadata)) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.elements.last_mut() {
            Some(meta) => {
                modify(meta);
                self
            }
            None => self.fail(SceneError::NoElement),
        }
    }

    fn find(&self, path: &ElementPath) -> Option<&ElementMetadata> {
        self.elements.iter().find(|meta| meta.element_path == *path)
    }

    fn fail(mut self, error: SceneError) -> Self {
        self.error.get_or_insert(error);
        self
    }
}

fn make_container(meta: &mut ElementMetadata, layout: LayoutSystem) {
    meta.accepts_children = true;
    meta.special_size_measurements.layout_system_for_children = Some(layout);
}

fn inherit_from_parent(meta: &mut ElementMetadata, parent: &ElementMetadata) {
    let from = &parent.special_size_measurements;
    let m = &mut meta.special_size_measurements;
    m.parent_layout_system = from.layout_system_for_children.unwrap_or_default();
    m.parent_flex_direction = from.flex_direction;
    m.parent_grid_cell_global_frames = from.grid_cell_global_frames.clone();
    m.parent_container_grid_properties = from.container_grid_properties.clone();
    m.immediate_parent_bounds = parent.frame();
}

/// A built fixture: one layout snapshot plus the selection.
#[derive(Debug, Clone)]
pub struct Scene {
    pub metadata: Arc<LayoutMetadataMap>,
    pub selection: Vec<ElementPath>,
}

impl Scene {
    #[must_use]
    pub fn get(&self, path: &ElementPath) -> Option<&ElementMetadata> {
        self.metadata.get(path)
    }

    /// A document whose committed state mirrors the snapshot.
    #[must_use]
    pub fn document(&self) -> MemoryDocument {
        MemoryDocument::from_metadata(&self.metadata, self.selection.clone())
    }

    #[must_use]
    pub fn reparent_service(&self) -> TreeReparentService {
        TreeReparentService::new(Arc::clone(&self.metadata))
    }
}
