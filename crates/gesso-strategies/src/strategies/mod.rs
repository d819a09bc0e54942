//! Built-in strategy families.
//!
//! Each family is a standalone [`StrategyFactory`] in its own module.
//! [`default_strategy_factories`] registers them in tie-break order, with the
//! do-nothing fallback last.

mod absolute_move;
mod absolute_resize;
mod do_nothing;
mod grid_change_location;
mod grid_helpers;
mod grid_reparent;
mod reorder;
mod reparent;
#[cfg(test)]
pub(crate) mod test_support;

pub use absolute_move::AbsoluteMove;
pub use absolute_resize::AbsoluteResize;
pub use do_nothing::DoNothing;
pub use grid_change_location::GridChangeElementLocation;
pub use grid_helpers::{
    grid_placement_commands, keep_authored_end, template_pin_commands, template_restore_commands,
};
pub use grid_reparent::GridReparent;
pub use reorder::{FlexReorder, FlowReorder};
pub use reparent::{AbsoluteReparent, FlexReparentToAbsolute, FlexReparentToFlex};

use gesso_core::{CanvasPoint, ElementPath};
use gesso_layout::{ElementMetadata, LayoutMetadataMap};

use crate::interaction::{ActiveControl, DragInteractionData, InteractionSession};
use crate::strategy::StrategyFactory;

/// Every built-in family, in registration order.
#[must_use]
pub fn default_strategy_factories() -> Vec<Box<dyn StrategyFactory>> {
    vec![
        Box::new(AbsoluteMove),
        Box::new(AbsoluteResize),
        Box::new(FlowReorder),
        Box::new(FlexReorder),
        Box::new(GridChangeElementLocation),
        Box::new(FlexReparentToAbsolute),
        Box::new(AbsoluteReparent),
        Box::new(FlexReparentToFlex),
        Box::new(GridReparent),
        Box::new(DoNothing),
    ]
}

/// Drag data of a pointer gesture started on the selection's bounding area.
pub(crate) fn bounding_area_drag(session: &InteractionSession) -> Option<&DragInteractionData> {
    match session.active_control {
        ActiveControl::BoundingArea => session.drag_data(),
        _ => None,
    }
}

/// Metadata of every path, or `None` if any is missing from the snapshot.
pub(crate) fn metadata_for<'a>(
    metadata: &'a LayoutMetadataMap,
    paths: &[ElementPath],
) -> Option<Vec<&'a ElementMetadata>> {
    paths.iter().map(|path| metadata.get(path)).collect()
}

/// Deepest element under `pointer` that accepts children and is neither
/// selected nor inside the selection. Equal depths resolve by path order.
pub(crate) fn reparent_target_under_point<'a>(
    metadata: &'a LayoutMetadataMap,
    selected: &[ElementPath],
    pointer: CanvasPoint,
) -> Option<&'a ElementMetadata> {
    let mut best: Option<&ElementMetadata> = None;
    for candidate in metadata.all_sorted() {
        if !candidate.accepts_children || !candidate.contains_point(pointer) {
            continue;
        }
        let path = &candidate.element_path;
        if selected
            .iter()
            .any(|moving| moving == path || path.is_descendant_of(moving))
        {
            continue;
        }
        if best.is_none_or(|current| path.depth() > current.element_path.depth()) {
            best = Some(candidate);
        }
    }
    best
}
