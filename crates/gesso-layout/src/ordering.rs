#![forbid(unsafe_code)]

//! Geometric sibling ordering for reorder and insertion.

use gesso_core::{CanvasPoint, CanvasRect, CanvasVector};
use serde::{Deserialize, Serialize};

use crate::metadata::{ElementMetadata, FlexDirection, LayoutSystem};

/// How children of a container are read in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderAxis {
    Horizontal { reversed: bool },
    Vertical { reversed: bool },
    /// Flow layout: rows top to bottom, left to right within a row.
    ReadingOrder,
}

impl ReorderAxis {
    /// Axis used for a container with the given layout.
    #[must_use]
    pub fn for_layout(layout: LayoutSystem, flex_direction: Option<FlexDirection>) -> Self {
        match layout {
            LayoutSystem::Flex => {
                let direction = flex_direction.unwrap_or_default();
                if direction.is_horizontal() {
                    Self::Horizontal {
                        reversed: direction.is_reversed(),
                    }
                } else {
                    Self::Vertical {
                        reversed: direction.is_reversed(),
                    }
                }
            }
            LayoutSystem::Flow | LayoutSystem::Grid => Self::ReadingOrder,
        }
    }

    /// Axis used to lay out the children of `container`.
    #[must_use]
    pub fn for_container(container: &ElementMetadata) -> Self {
        let measurements = &container.special_size_measurements;
        Self::for_layout(
            measurements.layout_system_for_children.unwrap_or_default(),
            measurements.flex_direction,
        )
    }

    /// Component of `vector` along this axis.
    #[must_use]
    pub fn component(self, vector: CanvasVector) -> f64 {
        match self {
            Self::Horizontal { .. } => vector.x,
            Self::Vertical { .. } | Self::ReadingOrder => vector.y,
        }
    }
}

/// `frame` comes before `point` when read along `axis`.
#[must_use]
pub fn is_before_point(frame: &CanvasRect, point: CanvasPoint, axis: ReorderAxis) -> bool {
    let center = frame.center();
    match axis {
        ReorderAxis::Horizontal { reversed } => (center.x < point.x) != reversed,
        ReorderAxis::Vertical { reversed } => (center.y < point.y) != reversed,
        ReorderAxis::ReadingOrder => {
            if point.y >= frame.bottom() {
                true
            } else if point.y < frame.top() {
                false
            } else {
                center.x < point.x
            }
        }
    }
}

/// Insertion index for `point` among `sibling_frames` (document order, the
/// moving element excluded).
#[must_use]
pub fn insertion_index(sibling_frames: &[CanvasRect], point: CanvasPoint, axis: ReorderAxis) -> usize {
    sibling_frames
        .iter()
        .take_while(|frame| is_before_point(frame, point, axis))
        .count()
}

/// How far, from 0 to 1, the drag has travelled toward the nearest sibling
/// boundary along `axis`. Returns 0 when there are no siblings.
#[must_use]
pub fn reorder_progress(
    element_frame: &CanvasRect,
    sibling_frames: &[CanvasRect],
    drag: CanvasVector,
    axis: ReorderAxis,
) -> f64 {
    let travelled = axis.component(drag).abs();
    let origin = axis.component(CanvasVector::new(
        element_frame.center().x,
        element_frame.center().y,
    ));
    let nearest = sibling_frames
        .iter()
        .map(|frame| {
            let center = frame.center();
            (axis.component(CanvasVector::new(center.x, center.y)) - origin).abs()
        })
        .filter(|distance| *distance > f64::EPSILON)
        .fold(f64::INFINITY, f64::min);
    if !nearest.is_finite() {
        return 0.0;
    }
    let boundary = nearest / 2.0;
    (travelled / boundary).clamp(0.0, 1.0)
}
