#![forbid(unsafe_code)]

//! Grid container geometry and placement.
//!
//! Cell coordinates are 1-based, matching CSS grid line numbers: the cell in
//! the first row and first column is `(1, 1)` and a 1x1 item placed there has
//! `grid-row: 1 / 2`.
//!
//! # Invariants
//!
//! 1. [`GridCellGlobalFrames`] rows are ordered top to bottom, cells left to right.
//! 2. [`target_grid_cell_data`] never yields a root cell below `(1, 1)`.
//! 3. [`sort_elements_by_grid_position`] is stable: auto-placed elements keep
//!    their relative order.

use gesso_core::{CanvasPoint, CanvasRect, ElementPath};
use serde::{Deserialize, Serialize};

use crate::props::{AttributeValue, PropertyBag};

/// 1-based row/column of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCellCoordinates {
    pub row: i32,
    pub column: i32,
}

impl GridCellCoordinates {
    #[inline]
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }
}

/// Size of an element in grid tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSpan {
    pub width: i32,
    pub height: i32,
}

impl GridSpan {
    pub const SINGLE_CELL: Self = Self {
        width: 1,
        height: 1,
    };
}

/// Measured on-screen frames of every cell of one grid container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridCellGlobalFrames {
    rows: Vec<Vec<CanvasRect>>,
}

impl GridCellGlobalFrames {
    #[must_use]
    pub fn new(rows: Vec<Vec<CanvasRect>>) -> Self {
        Self { rows }
    }

    /// Uniform grid of `rows x columns` cells starting at `origin`.
    #[must_use]
    pub fn uniform(
        origin: CanvasPoint,
        rows: usize,
        columns: usize,
        cell_width: f64,
        cell_height: f64,
        gap: f64,
    ) -> Self {
        let rows = (0..rows)
            .map(|row| {
                (0..columns)
                    .map(|column| {
                        CanvasRect::new(
                            origin.x + column as f64 * (cell_width + gap),
                            origin.y + row as f64 * (cell_height + gap),
                            cell_width,
                            cell_height,
                        )
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<CanvasRect>] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    #[must_use]
    pub fn cell_frame(&self, coords: GridCellCoordinates) -> Option<CanvasRect> {
        let row = usize::try_from(coords.row.checked_sub(1)?).ok()?;
        let column = usize::try_from(coords.column.checked_sub(1)?).ok()?;
        self.rows.get(row)?.get(column).copied()
    }

    fn cells(&self) -> impl Iterator<Item = (GridCellCoordinates, CanvasRect)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells.iter().enumerate().map(move |(column, frame)| {
                (
                    GridCellCoordinates::new(track_number(row), track_number(column)),
                    *frame,
                )
            })
        })
    }

    /// Cell whose frame contains `point`. Gaps between cells map to `None`.
    #[must_use]
    pub fn cell_under_point(&self, point: CanvasPoint) -> Option<GridCellCoordinates> {
        self.cells()
            .find(|(_, frame)| frame.contains_point(point))
            .map(|(coords, _)| coords)
    }

    /// Cell whose center is nearest to `point`; first wins on ties.
    #[must_use]
    pub fn closest_cell_to_point(&self, point: CanvasPoint) -> Option<GridCellCoordinates> {
        if let Some(exact) = self.cell_under_point(point) {
            return Some(exact);
        }
        let mut best: Option<(GridCellCoordinates, f64)> = None;
        for (coords, frame) in self.cells() {
            let distance = point.delta_from(frame.center()).length();
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((coords, distance));
            }
        }
        best.map(|(coords, _)| coords)
    }

    /// Cells overlapping `frame` by a positive area.
    #[must_use]
    pub fn cells_covered_by(&self, frame: &CanvasRect) -> Vec<GridCellCoordinates> {
        self.cells()
            .filter(|(_, cell)| cell.intersection(frame).is_some())
            .map(|(coords, _)| coords)
            .collect()
    }
}

fn track_number(index: usize) -> i32 {
    i32::try_from(index).map_or(i32::MAX, |index| index.saturating_add(1))
}

/// One track of a grid template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDimension {
    /// Authored size, e.g. `1fr` or `120px`.
    pub size: String,
    /// Name of the line at the start of this track (`[sidebar] 1fr`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_name: Option<String>,
}

impl GridDimension {
    #[must_use]
    pub fn new(size: impl Into<String>) -> Self {
        Self {
            size: size.into(),
            line_name: None,
        }
    }

    #[must_use]
    pub fn named(size: impl Into<String>, line_name: impl Into<String>) -> Self {
        Self {
            size: size.into(),
            line_name: Some(line_name.into()),
        }
    }
}

/// Row or column template of a grid container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridTemplate {
    Dimensions { dimensions: Vec<GridDimension> },
    /// Template the tool could not parse into tracks.
    Fallback { value: String },
}

impl GridTemplate {
    #[must_use]
    pub fn dimensions(dimensions: Vec<GridDimension>) -> Self {
        Self::Dimensions { dimensions }
    }

    /// `count` tracks of `size`.
    #[must_use]
    pub fn repeat(count: usize, size: &str) -> Self {
        Self::Dimensions {
            dimensions: (0..count).map(|_| GridDimension::new(size)).collect(),
        }
    }

    #[must_use]
    pub fn track_count(&self) -> Option<usize> {
        match self {
            Self::Dimensions { dimensions } => Some(dimensions.len()),
            Self::Fallback { .. } => None,
        }
    }

    /// Name of 1-based line `line`, if the author named it.
    #[must_use]
    pub fn line_name(&self, line: i32) -> Option<&str> {
        let Self::Dimensions { dimensions } = self else {
            return None;
        };
        let index = usize::try_from(line.checked_sub(1)?).ok()?;
        dimensions.get(index)?.line_name.as_deref()
    }

    /// 1-based number of the line called `name`.
    #[must_use]
    pub fn line_number(&self, name: &str) -> Option<i32> {
        let Self::Dimensions { dimensions } = self else {
            return None;
        };
        dimensions
            .iter()
            .position(|dimension| dimension.line_name.as_deref() == Some(name))
            .map(track_number)
    }

    /// Authored text form, e.g. `[a] 1fr 1fr`.
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Self::Dimensions { dimensions } => dimensions
                .iter()
                .map(|dimension| match &dimension.line_name {
                    Some(name) => format!("[{name}] {}", dimension.size),
                    None => dimension.size.clone(),
                })
                .collect::<Vec<_>>()
                .join(" "),
            Self::Fallback { value } => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridAxis {
    Column,
    Row,
}

/// Computed templates of a grid container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridContainerProperties {
    pub grid_template_columns: Option<GridTemplate>,
    pub grid_template_rows: Option<GridTemplate>,
}

impl GridContainerProperties {
    #[must_use]
    pub fn template(&self, axis: GridAxis) -> Option<&GridTemplate> {
        match axis {
            GridAxis::Column => self.grid_template_columns.as_ref(),
            GridAxis::Row => self.grid_template_rows.as_ref(),
        }
    }

    /// Both templates were measured.
    #[must_use]
    pub fn has_templates(&self) -> bool {
        self.grid_template_columns.is_some() && self.grid_template_rows.is_some()
    }

    /// Column count used to linearize row-major order; 1 when unknown.
    #[must_use]
    pub fn columns_count(&self) -> usize {
        self.grid_template_columns
            .as_ref()
            .and_then(GridTemplate::track_count)
            .unwrap_or(1)
            .max(1)
    }

    /// Attribute value to author for `line`: the line's name when the
    /// template names it, the number otherwise.
    #[must_use]
    pub fn line_value(&self, axis: GridAxis, line: i32) -> AttributeValue {
        match self.template(axis).and_then(|template| template.line_name(line)) {
            Some(name) => AttributeValue::String(name.to_owned()),
            None => AttributeValue::Number(f64::from(line)),
        }
    }

    /// Resolve an authored start/end value to a line number.
    #[must_use]
    pub fn resolve_line(&self, axis: GridAxis, value: &AttributeValue) -> Option<i32> {
        match value {
            AttributeValue::Number(number) => Some(*number as i32),
            AttributeValue::String(text) => {
                let text = text.trim();
                text.parse::<i32>().ok().or_else(|| {
                    self.template(axis)
                        .and_then(|template| template.line_number(text))
                })
            }
            AttributeValue::Bool(_) | AttributeValue::Expression { .. } => None,
        }
    }
}

/// One measured or authored grid line position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum GridPosition {
    Auto,
    Line(i32),
    Span(i32),
    Named(String),
}

impl GridPosition {
    /// Numeric line, if this is one.
    #[must_use]
    pub const fn numerical(&self) -> Option<i32> {
        match self {
            Self::Line(line) => Some(*line),
            _ => None,
        }
    }
}

/// Measured placement of a grid item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridElementProperties {
    pub grid_column_start: Option<GridPosition>,
    pub grid_column_end: Option<GridPosition>,
    pub grid_row_start: Option<GridPosition>,
    pub grid_row_end: Option<GridPosition>,
}

impl GridElementProperties {
    /// Placement occupying exactly `coords`.
    #[must_use]
    pub fn at_cell(coords: GridCellCoordinates) -> Self {
        Self {
            grid_column_start: Some(GridPosition::Line(coords.column)),
            grid_column_end: Some(GridPosition::Line(coords.column + 1)),
            grid_row_start: Some(GridPosition::Line(coords.row)),
            grid_row_end: Some(GridPosition::Line(coords.row + 1)),
        }
    }

    fn root_and_span(&self) -> Option<(GridCellCoordinates, GridSpan)> {
        let column = self.grid_column_start.as_ref()?.numerical()?;
        let row = self.grid_row_start.as_ref()?.numerical()?;
        let width = track_extent(column, self.grid_column_end.as_ref());
        let height = track_extent(row, self.grid_row_end.as_ref());
        Some((GridCellCoordinates::new(row, column), GridSpan { width, height }))
    }
}

fn track_extent(start: i32, end: Option<&GridPosition>) -> i32 {
    match end {
        Some(GridPosition::Line(end)) if *end > start => end - start,
        Some(GridPosition::Span(span)) if *span > 0 => *span,
        _ => 1,
    }
}

/// Concrete placement written as the four longhand properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPlacement {
    pub column_start: i32,
    pub column_end: i32,
    pub row_start: i32,
    pub row_end: i32,
}

impl GridPlacement {
    /// Placement of a `span`-sized element rooted at `root`.
    #[must_use]
    pub const fn new(root: GridCellCoordinates, span: GridSpan) -> Self {
        Self {
            column_start: root.column,
            column_end: root.column + span.width,
            row_start: root.row,
            row_end: root.row + span.height,
        }
    }

    #[must_use]
    pub const fn root(&self) -> GridCellCoordinates {
        GridCellCoordinates::new(self.row_start, self.column_start)
    }

    #[must_use]
    pub const fn span(&self) -> GridSpan {
        GridSpan {
            width: self.column_end - self.column_start,
            height: self.row_end - self.row_start,
        }
    }

    /// Read a placement back from authored longhand properties.
    ///
    /// A missing end means a single track; `span N` ends are honoured.
    #[must_use]
    pub fn from_props(props: &PropertyBag, container: &GridContainerProperties) -> Option<Self> {
        let column_start = container.resolve_line(
            GridAxis::Column,
            props.get_style("gridColumnStart")?,
        )?;
        let row_start = container.resolve_line(GridAxis::Row, props.get_style("gridRowStart")?)?;
        let column_end =
            read_end(props, "gridColumnEnd", GridAxis::Column, container, column_start)?;
        let row_end = read_end(props, "gridRowEnd", GridAxis::Row, container, row_start)?;
        Some(Self {
            column_start,
            column_end,
            row_start,
            row_end,
        })
    }
}

impl From<GridPlacement> for GridElementProperties {
    fn from(placement: GridPlacement) -> Self {
        Self {
            grid_column_start: Some(GridPosition::Line(placement.column_start)),
            grid_column_end: Some(GridPosition::Line(placement.column_end)),
            grid_row_start: Some(GridPosition::Line(placement.row_start)),
            grid_row_end: Some(GridPosition::Line(placement.row_end)),
        }
    }
}

fn read_end(
    props: &PropertyBag,
    name: &str,
    axis: GridAxis,
    container: &GridContainerProperties,
    start: i32,
) -> Option<i32> {
    let Some(value) = props.get_style(name) else {
        return Some(start + 1);
    };
    if let Some(span) = value
        .as_str()
        .and_then(|text| text.trim().strip_prefix("span"))
    {
        return span.trim().parse::<i32>().ok().map(|span| start + span);
    }
    container.resolve_line(axis, value)
}

/// Grab point of the dragged element, in tracks from its root cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCellOffset {
    pub row: i32,
    pub column: i32,
}

/// Span of the element and where inside it the pointer grabbed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalElementGridConfiguration {
    pub original_cell_bounds: GridSpan,
    pub mouse_cell_pos_in_original_element: GridCellOffset,
}

impl OriginalElementGridConfiguration {
    /// A freshly reparented element: one cell, grabbed at its root.
    pub const REPARENTED: Self = Self {
        original_cell_bounds: GridSpan::SINGLE_CELL,
        mouse_cell_pos_in_original_element: GridCellOffset { row: 0, column: 0 },
    };
}

/// Resolve the element's original span and the grab offset at drag start.
///
/// Measured numeric placement wins; otherwise the cells the element's frame
/// covers are used. Returns `None` when the drag did not start over the grid.
#[must_use]
pub fn original_element_grid_configuration(
    frames: &GridCellGlobalFrames,
    drag_start: CanvasPoint,
    element_frame: Option<CanvasRect>,
    measured: &GridElementProperties,
) -> Option<OriginalElementGridConfiguration> {
    let dragging_from = frames.closest_cell_to_point(drag_start)?;
    let (root, span) = measured
        .root_and_span()
        .or_else(|| covered_root_and_span(frames, element_frame?))
        .unwrap_or((dragging_from, GridSpan::SINGLE_CELL));

    let offset = GridCellOffset {
        row: (dragging_from.row - root.row).clamp(0, (span.height - 1).max(0)),
        column: (dragging_from.column - root.column).clamp(0, (span.width - 1).max(0)),
    };
    Some(OriginalElementGridConfiguration {
        original_cell_bounds: span,
        mouse_cell_pos_in_original_element: offset,
    })
}

fn covered_root_and_span(
    frames: &GridCellGlobalFrames,
    frame: CanvasRect,
) -> Option<(GridCellCoordinates, GridSpan)> {
    let covered = frames.cells_covered_by(&frame);
    let min_row = covered.iter().map(|c| c.row).min()?;
    let max_row = covered.iter().map(|c| c.row).max()?;
    let min_column = covered.iter().map(|c| c.column).min()?;
    let max_column = covered.iter().map(|c| c.column).max()?;
    Some((
        GridCellCoordinates::new(min_row, min_column),
        GridSpan {
            width: max_column - min_column + 1,
            height: max_row - min_row + 1,
        },
    ))
}

/// Cell under the pointer and the root cell the element should occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGridCellData {
    pub target_cell_coords: GridCellCoordinates,
    pub target_root_cell: GridCellCoordinates,
}

/// Map the pointer to a target cell, keeping the grab point under the cursor.
#[must_use]
pub fn target_grid_cell_data(
    frames: &GridCellGlobalFrames,
    pointer: CanvasPoint,
    grab_offset: GridCellOffset,
) -> Option<TargetGridCellData> {
    let target_cell_coords = frames.cell_under_point(pointer)?;
    let target_root_cell = GridCellCoordinates::new(
        (target_cell_coords.row - grab_offset.row).max(1),
        (target_cell_coords.column - grab_offset.column).max(1),
    );
    Some(TargetGridCellData {
        target_cell_coords,
        target_root_cell,
    })
}

/// Grid item participating in a row-major sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortableGridElement {
    pub path: ElementPath,
    /// Fallback key for auto-placed elements.
    pub index: usize,
    pub properties: GridElementProperties,
}

/// Linear row-major key: `(row - 1) * columns + (column - 1)`, or `index` for
/// elements without numeric start lines.
#[must_use]
pub fn grid_sort_key(element: &SortableGridElement, columns_count: usize) -> i64 {
    let row = element
        .properties
        .grid_row_start
        .as_ref()
        .and_then(GridPosition::numerical);
    let column = element
        .properties
        .grid_column_start
        .as_ref()
        .and_then(GridPosition::numerical);
    match (row, column) {
        (Some(row), Some(column)) => {
            let columns = i64::try_from(columns_count).unwrap_or(i64::MAX);
            (i64::from(row) - 1) * columns + i64::from(column) - 1
        }
        _ => i64::try_from(element.index).unwrap_or(i64::MAX),
    }
}

/// Stable row-major sort for a grid with `columns_count` columns.
pub fn sort_elements_by_grid_position(elements: &mut [SortableGridElement], columns_count: usize) {
    elements.sort_by_key(|element| grid_sort_key(element, columns_count));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_3x3() -> GridCellGlobalFrames {
        GridCellGlobalFrames::uniform(CanvasPoint::new(0.0, 0.0), 3, 3, 100.0, 100.0, 10.0)
    }

    #[test]
    fn cell_under_point_is_one_based() {
        let frames = grid_3x3();
        assert_eq!(
            frames.cell_under_point(CanvasPoint::new(5.0, 5.0)),
            Some(GridCellCoordinates::new(1, 1))
        );
        assert_eq!(
            frames.cell_under_point(CanvasPoint::new(230.0, 120.0)),
            Some(GridCellCoordinates::new(2, 3))
        );
    }

    #[test]
    fn gaps_map_to_no_cell() {
        let frames = grid_3x3();
        assert_eq!(frames.cell_under_point(CanvasPoint::new(105.0, 5.0)), None);
        assert_eq!(
            frames.closest_cell_to_point(CanvasPoint::new(104.0, 50.0)),
            Some(GridCellCoordinates::new(1, 1))
        );
    }

    #[test]
    fn grab_offset_keeps_root_in_bounds() {
        let frames = grid_3x3();
        let offset = GridCellOffset { row: 1, column: 1 };
        let data = target_grid_cell_data(&frames, CanvasPoint::new(5.0, 5.0), offset)
            .expect("pointer over a cell");
        assert_eq!(data.target_cell_coords, GridCellCoordinates::new(1, 1));
        assert_eq!(data.target_root_cell, GridCellCoordinates::new(1, 1));
    }

    #[test]
    fn original_configuration_from_measured_span() {
        let frames = grid_3x3();
        let measured = GridElementProperties {
            grid_column_start: Some(GridPosition::Line(1)),
            grid_column_end: Some(GridPosition::Span(2)),
            grid_row_start: Some(GridPosition::Line(1)),
            grid_row_end: None,
        };
        let config = original_element_grid_configuration(
            &frames,
            CanvasPoint::new(150.0, 50.0),
            None,
            &measured,
        )
        .expect("drag started over grid");
        assert_eq!(config.original_cell_bounds, GridSpan { width: 2, height: 1 });
        assert_eq!(
            config.mouse_cell_pos_in_original_element,
            GridCellOffset { row: 0, column: 1 }
        );
    }

    #[test]
    fn original_configuration_from_covered_cells() {
        let frames = grid_3x3();
        let frame = CanvasRect::new(110.0, 110.0, 210.0, 210.0);
        let config = original_element_grid_configuration(
            &frames,
            CanvasPoint::new(250.0, 250.0),
            Some(frame),
            &GridElementProperties::default(),
        )
        .expect("drag started over grid");
        assert_eq!(config.original_cell_bounds, GridSpan { width: 2, height: 2 });
        assert_eq!(
            config.mouse_cell_pos_in_original_element,
            GridCellOffset { row: 1, column: 1 }
        );
    }

    #[test]
    fn named_lines_resolve_both_ways() {
        let container = GridContainerProperties {
            grid_template_columns: Some(GridTemplate::dimensions(vec![
                GridDimension::named("1fr", "sidebar"),
                GridDimension::new("2fr"),
            ])),
            grid_template_rows: Some(GridTemplate::repeat(2, "auto")),
        };
        assert_eq!(
            container.line_value(GridAxis::Column, 1),
            AttributeValue::String("sidebar".into())
        );
        assert_eq!(
            container.line_value(GridAxis::Column, 2),
            AttributeValue::Number(2.0)
        );
        assert_eq!(
            container.resolve_line(GridAxis::Column, &AttributeValue::from("sidebar")),
            Some(1)
        );
        assert_eq!(container.columns_count(), 2);
        assert_eq!(
            container.template(GridAxis::Column).map(GridTemplate::to_css),
            Some("[sidebar] 1fr 2fr".to_owned())
        );
    }

    #[test]
    fn placement_reads_span_ends() {
        let props = PropertyBag::new()
            .with_style("gridColumnStart", 2)
            .with_style("gridColumnEnd", "span 2")
            .with_style("gridRowStart", "3");
        let placement = GridPlacement::from_props(&props, &GridContainerProperties::default())
            .expect("placement");
        assert_eq!(placement.root(), GridCellCoordinates::new(3, 2));
        assert_eq!(placement.span(), GridSpan { width: 2, height: 1 });
    }

    #[test]
    fn row_major_sort_orders_rows_then_columns() {
        let at = |name: &str, index: usize, row: i32, column: i32| SortableGridElement {
            path: ElementPath::from_parts([[name]]),
            index,
            properties: GridElementProperties::at_cell(GridCellCoordinates::new(row, column)),
        };
        let mut elements = vec![at("c", 0, 2, 1), at("b", 1, 1, 3), at("a", 2, 1, 1)];
        sort_elements_by_grid_position(&mut elements, 3);
        let order: Vec<String> = elements.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
