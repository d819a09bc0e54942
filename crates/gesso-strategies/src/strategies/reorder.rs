//! [`FlowReorder`] and [`FlexReorder`]: move one in-flow element to a new
//! index among its siblings.
//!
//! Fitness grows with reorder progress, so a drag that has travelled halfway
//! to the nearest sibling outranks one that barely moved. The target index
//! is re-derived from sibling geometry on every update.

use gesso_core::CanvasRect;
use gesso_layout::{LayoutSystem, ReorderAxis, insertion_index, reorder_progress};

use crate::commands::{WhenToRun, reorder_element};
use crate::interaction::InteractionSession;
use crate::strategies::bounding_area_drag;
use crate::strategy::{
    CanvasControl, CanvasStrategy, ControlVisibility, ControlWithProps, CustomStrategyState,
    InteractionCanvasState, StrategyApplicationResult, StrategyControls, StrategyFactory,
    StrategyId, ids,
};

/// Reorder inside a flow (block/inline) container.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowReorder;

/// Reorder inside a flex container, along its main axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlexReorder;

impl StrategyFactory for FlowReorder {
    fn name(&self) -> &str {
        "FlowReorder"
    }

    fn materialize<'a>(
        &self,
        canvas: InteractionCanvasState<'a>,
        session: &'a InteractionSession,
        _custom_state: &'a CustomStrategyState,
    ) -> Option<CanvasStrategy<'a>> {
        reorder_strategy(
            canvas,
            session,
            LayoutSystem::Flow,
            ids::FLOW_REORDER,
            "Reorder (Flow)",
        )
    }
}

impl StrategyFactory for FlexReorder {
    fn name(&self) -> &str {
        "FlexReorder"
    }

    fn materialize<'a>(
        &self,
        canvas: InteractionCanvasState<'a>,
        session: &'a InteractionSession,
        _custom_state: &'a CustomStrategyState,
    ) -> Option<CanvasStrategy<'a>> {
        reorder_strategy(
            canvas,
            session,
            LayoutSystem::Flex,
            ids::FLEX_REORDER,
            "Reorder (Flex)",
        )
    }
}

fn reorder_strategy<'a>(
    canvas: InteractionCanvasState<'a>,
    session: &'a InteractionSession,
    layout: LayoutSystem,
    id: StrategyId,
    name: &'static str,
) -> Option<CanvasStrategy<'a>> {
    let drag = bounding_area_drag(session)?;
    let delta = drag.drag?;
    let pointer = drag.pointer()?;
    let metadata = canvas.starting_metadata;
    let path = canvas.single_selected()?;
    let target = metadata.get(path)?;
    let measurements = &target.special_size_measurements;
    if target.is_absolute() || measurements.parent_layout_system != layout {
        return None;
    }

    let parent = metadata.parent_of(path)?;
    if !parent.contains_point(pointer) {
        return None;
    }
    let siblings = metadata.siblings_of(path);
    if siblings.is_empty() || siblings.iter().any(|sibling| sibling.is_absolute()) {
        return None;
    }
    let sibling_frames: Vec<CanvasRect> = siblings
        .iter()
        .map(|sibling| sibling.frame())
        .collect::<Option<_>>()?;
    let frame = target.frame()?;

    let axis = ReorderAxis::for_layout(layout, measurements.parent_flex_direction);
    let progress = reorder_progress(&frame, &sibling_frames, delta, axis);
    let parent_path = parent.element_path.clone();

    let mut controls = StrategyControls::new();
    controls.push(ControlWithProps::new(
        CanvasControl::ReorderIndicator {
            parent: parent_path.clone(),
        },
        format!("reorder-indicator-{parent_path}"),
        ControlVisibility::VisibleOnlyWhileActive,
    ));

    Some(CanvasStrategy::new(
        id,
        name,
        canvas.policy.reorder_fitness_for(progress),
        controls,
        move |_lifecycle| {
            let index = insertion_index(&sibling_frames, pointer, axis);
            StrategyApplicationResult::new(
                vec![reorder_element(WhenToRun::Always, path, index)],
                vec![parent_path.clone(), path.clone()],
            )
        },
    ))
}
