//! [`GridReparent`]: drop the selection into a grid container under the
//! pointer, placing each element in the hovered cell.
//!
//! When the pointer sits on a gap between cells, the last cell recorded in
//! the grid custom state is used, so the placeholder does not flicker.

use gesso_core::{CursorIcon, ElementPath, unique_element_paths};
use gesso_layout::{AttributeValue, GridPlacement, GridSpan, PropertyPath};

use crate::commands::{
    GridControlsTarget, WhenToRun, remove_absolute_positioning_props, set_cursor,
    set_elements_to_rerender, set_property, show_grid_controls, update_selected_views,
};
use crate::interaction::InteractionSession;
use crate::strategies::grid_helpers::grid_placement_commands;
use crate::strategies::reparent::{parent_controls, reparent_candidate};
use crate::strategy::{
    CanvasControl, CanvasStrategy, ControlVisibility, ControlWithProps, CustomStrategyState,
    CustomStrategyStatePatch, GridCustomStrategyState, InteractionCanvasState,
    StrategyApplicationResult, StrategyFactory, controls_for_grid_placeholders, ids,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct GridReparent;

impl StrategyFactory for GridReparent {
    fn name(&self) -> &str {
        "GridReparent"
    }

    fn materialize<'a>(
        &self,
        canvas: InteractionCanvasState<'a>,
        session: &'a InteractionSession,
        custom_state: &'a CustomStrategyState,
    ) -> Option<CanvasStrategy<'a>> {
        let metadata = canvas.starting_metadata;
        let sources = metadata.flatten_fragment_like(canvas.selected);
        let candidate = reparent_candidate(canvas, session, &sources)?;
        let target = candidate.target;
        if !target.is_grid_container()
            || !candidate.sources.iter().all(|source| source.honours_style_props)
        {
            return None;
        }
        let target_frame = target.frame()?;
        let frames = target
            .special_size_measurements
            .grid_cell_global_frames
            .as_ref()
            .filter(|frames| !frames.is_empty())?;
        let target_path = &target.element_path;

        let mut controls = parent_controls(target_path);
        controls.push(ControlWithProps::new(
            CanvasControl::ZeroSizedElementControls,
            "zero-size-control",
            ControlVisibility::VisibleOnlyWhileActive,
        ));
        controls.push(controls_for_grid_placeholders(
            GridControlsTarget::GridContainer(target_path.clone()),
            ControlVisibility::VisibleOnlyWhileActive,
        ));

        let service = canvas.reparent_service;
        let selected = canvas.selected;

        Some(CanvasStrategy::new(
            ids::GRID_REPARENT,
            "Reparent (Grid)",
            canvas.policy.reparent_fitness,
            controls,
            move |_lifecycle| {
                let Some(cell) = frames
                    .cell_under_point(candidate.pointer)
                    .or(custom_state.grid.target_cell_data)
                else {
                    return StrategyApplicationResult::empty();
                };
                let placement = GridPlacement::new(cell, GridSpan::SINGLE_CELL);
                let container = &target.special_size_measurements.container_grid_properties;

                let mut commands = Vec::new();
                let mut new_paths = Vec::with_capacity(candidate.sources.len());
                for source in &candidate.sources {
                    let Some(outcome) =
                        service.reparent_outcome(&source.element_path, target_path, None)
                    else {
                        return StrategyApplicationResult::empty();
                    };
                    commands.extend(grid_placement_commands(
                        WhenToRun::Always,
                        &source.element_path,
                        placement,
                        container,
                        None,
                    ));
                    commands.extend(outcome.commands);
                    commands.push(remove_absolute_positioning_props(
                        WhenToRun::Always,
                        &outcome.new_path,
                    ));
                    new_paths.push(outcome.new_path);
                }

                for (name, value) in [("width", target_frame.width), ("height", target_frame.height)] {
                    commands.push(set_property(
                        WhenToRun::MidInteraction,
                        target_path,
                        PropertyPath::style(name),
                        AttributeValue::Number(value),
                    ));
                }
                commands.push(update_selected_views(WhenToRun::Always, new_paths.clone()));
                commands.push(set_cursor(WhenToRun::MidInteraction, CursorIcon::Reparent));
                commands.push(show_grid_controls(
                    WhenToRun::MidInteraction,
                    GridControlsTarget::GridContainer(target_path.clone()),
                    Some(cell),
                    None,
                ));

                let rerender = rerender_paths(custom_state, &new_paths, selected);
                commands.push(set_elements_to_rerender(
                    WhenToRun::MidInteraction,
                    rerender.clone(),
                ));

                StrategyApplicationResult::new(commands, rerender.clone()).with_patch(
                    CustomStrategyStatePatch {
                        grid: Some(GridCustomStrategyState {
                            target_cell_data: Some(cell),
                        }),
                        elements_to_rerender: Some(rerender),
                    },
                )
            },
        ))
    }
}

/// Everything touched so far in this interaction plus the new paths, their
/// parents, and the old parents of the selection.
fn rerender_paths(
    custom_state: &CustomStrategyState,
    new_paths: &[ElementPath],
    selected: &[ElementPath],
) -> Vec<ElementPath> {
    let mut paths = custom_state.elements_to_rerender.clone();
    paths.extend(new_paths.iter().cloned());
    paths.extend(new_paths.iter().map(ElementPath::parent_path));
    paths.extend(selected.iter().map(ElementPath::parent_path));
    unique_element_paths(&paths)
}
