//! [`GridChangeElementLocation`]: drag a grid item to another cell by its
//! grid cell handle.
//!
//! Each update resolves the item's original span and grab offset at drag
//! start, maps the pointer to a root cell that keeps the grab point under
//! the cursor, writes the new placement, and reorders the item so document
//! order matches row-major visual order.
//!
//! # Failure Modes
//!
//! Apply returns the empty result when there is no drag vector yet, the
//! parent grid has no measured cell frames, or the pointer is over no cell.

use gesso_core::ElementPath;
use gesso_layout::{
    ElementMetadata, GridElementProperties, GridPlacement, LayoutMetadataMap, SortableGridElement,
    original_element_grid_configuration, sort_elements_by_grid_position, target_grid_cell_data,
};

use crate::commands::{GridControlsTarget, WhenToRun, reorder_element, show_grid_controls};
use crate::interaction::{ActiveControl, DragInteractionData, InteractionSession};
use crate::strategies::grid_helpers::{
    grid_placement_commands, template_pin_commands, template_restore_commands,
};
use crate::strategy::{
    CanvasStrategy, ControlVisibility, CustomStrategyState, CustomStrategyStatePatch,
    GridCustomStrategyState, InteractionCanvasState, StrategyApplicationResult, StrategyControls,
    StrategyFactory, controls_for_grid_placeholders, ids,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct GridChangeElementLocation;

impl StrategyFactory for GridChangeElementLocation {
    fn name(&self) -> &str {
        "GridChangeElementLocation"
    }

    fn materialize<'a>(
        &self,
        canvas: InteractionCanvasState<'a>,
        session: &'a InteractionSession,
        _custom_state: &'a CustomStrategyState,
    ) -> Option<CanvasStrategy<'a>> {
        let ActiveControl::GridCellHandle { priority, .. } = session.active_control else {
            return None;
        };
        let drag = session.drag_data()?;
        if drag.modifiers.alt() {
            return None;
        }
        let metadata = canvas.starting_metadata;
        let target = metadata.get(canvas.single_selected()?)?;
        if !target.is_grid_item() || target.is_absolute() || !target.honours_style_props {
            return None;
        }
        let parent = metadata.parent_of(&target.element_path)?;
        if !target
            .special_size_measurements
            .parent_container_grid_properties
            .has_templates()
        {
            return None;
        }

        let mut controls = StrategyControls::new();
        controls.push(controls_for_grid_placeholders(
            GridControlsTarget::GridItem(target.element_path.clone()),
            ControlVisibility::VisibleOnlyWhileActive,
        ));

        Some(CanvasStrategy::new(
            ids::GRID_CHANGE_ELEMENT_LOCATION,
            "Change Location (Grid)",
            canvas.policy.control_fitness(priority),
            controls,
            move |_lifecycle| change_location(metadata, target, parent, drag),
        ))
    }
}

fn change_location(
    metadata: &LayoutMetadataMap,
    target: &ElementMetadata,
    parent: &ElementMetadata,
    drag: &DragInteractionData,
) -> StrategyApplicationResult {
    let Some(pointer) = drag.pointer() else {
        return StrategyApplicationResult::empty();
    };
    let measurements = &target.special_size_measurements;
    let Some(frames) = measurements
        .parent_grid_cell_global_frames
        .as_ref()
        .filter(|frames| !frames.is_empty())
    else {
        return StrategyApplicationResult::empty();
    };
    let Some(original) = original_element_grid_configuration(
        frames,
        drag.drag_start,
        target.frame(),
        &measurements.element_grid_properties,
    ) else {
        return StrategyApplicationResult::empty();
    };
    let Some(cell) =
        target_grid_cell_data(frames, pointer, original.mouse_cell_pos_in_original_element)
    else {
        return StrategyApplicationResult::empty();
    };

    let path = &target.element_path;
    let container = &measurements.parent_container_grid_properties;
    let placement = GridPlacement::new(cell.target_root_cell, original.original_cell_bounds);
    let index = row_major_index(metadata, path, placement, container.columns_count());

    let mut commands = template_pin_commands(&parent.element_path, container);
    commands.extend(template_restore_commands(&parent.element_path, &parent.props));
    commands.extend(grid_placement_commands(
        WhenToRun::Always,
        path,
        placement,
        container,
        Some(&target.props),
    ));
    commands.push(reorder_element(WhenToRun::Always, path, index));
    commands.push(show_grid_controls(
        WhenToRun::MidInteraction,
        GridControlsTarget::GridItem(path.clone()),
        Some(cell.target_cell_coords),
        Some(cell.target_root_cell),
    ));

    StrategyApplicationResult::new(commands, vec![parent.element_path.clone(), path.clone()])
        .with_patch(CustomStrategyStatePatch {
            grid: Some(GridCustomStrategyState {
                target_cell_data: Some(cell.target_cell_coords),
            }),
            elements_to_rerender: None,
        })
}

/// Index of `path` once it sits at `placement` and all siblings are sorted
/// row-major.
fn row_major_index(
    metadata: &LayoutMetadataMap,
    path: &ElementPath,
    placement: GridPlacement,
    columns_count: usize,
) -> usize {
    let siblings = metadata.siblings_of(path);
    let moving_index = siblings.len() + 1;
    let mut elements: Vec<SortableGridElement> = siblings
        .into_iter()
        .enumerate()
        .map(|(index, sibling)| SortableGridElement {
            path: sibling.element_path.clone(),
            index,
            properties: sibling
                .special_size_measurements
                .element_grid_properties
                .clone(),
        })
        .collect();
    elements.push(SortableGridElement {
        path: path.clone(),
        index: moving_index,
        properties: GridElementProperties::from(placement),
    });
    sort_elements_by_grid_position(&mut elements, columns_count);
    elements
        .iter()
        .position(|element| element.path == *path)
        .unwrap_or(0)
}
