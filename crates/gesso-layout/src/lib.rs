#![forbid(unsafe_code)]

//! Layout metadata model for the Gesso interaction engine.
//!
//! # Role in Gesso
//! The renderer measures the document after every render and publishes a
//! [`LayoutMetadataMap`]. Strategies only ever read it. This crate also holds
//! the geometry helpers that re-derive sibling order and grid placement from
//! those measurements.
//!
//! # Primary responsibilities
//! - **metadata**: immutable per-element snapshots and tree queries.
//! - **props**: authored attribute values keyed by property path.
//! - **grid**: cell frames, templates, placement, and row-major sorting.
//! - **ordering**: insertion indices and reorder progress along a layout axis.

pub mod grid;
pub mod metadata;
pub mod ordering;
pub mod props;

pub use grid::{
    GridAxis, GridCellCoordinates, GridCellGlobalFrames, GridCellOffset, GridContainerProperties,
    GridDimension, GridElementProperties, GridPlacement, GridPosition, GridSpan, GridTemplate,
    OriginalElementGridConfiguration, SortableGridElement, TargetGridCellData,
    original_element_grid_configuration, sort_elements_by_grid_position, target_grid_cell_data,
};
pub use metadata::{
    ElementMetadata, FlexDirection, LayoutMetadataMap, LayoutSystem, PositionMode,
    SpecialSizeMeasurements,
};
pub use ordering::{ReorderAxis, insertion_index, reorder_progress};
pub use props::{AttributeValue, PropertyBag, PropertyPath};
