//! Reparent families: move the selection under the container the pointer
//! is over.
//!
//! | Factory                     | Source       | Target container               |
//! |-----------------------------|--------------|--------------------------------|
//! | [`FlexReparentToAbsolute`]  | in flow      | bounds for absolute children   |
//! | [`AbsoluteReparent`]        | absolute     | bounds for absolute children   |
//! | [`FlexReparentToFlex`]      | any          | flex container                 |
//!
//! # Failure Modes
//!
//! All families decline while ALT is held, when the pointer is over the
//! current parent, and when the external legality check refuses any moved
//! element. A reparent outcome that disappears between ranking and apply
//! yields the empty result.

use gesso_core::{CanvasPoint, CanvasRect, CanvasVector, CursorIcon, ElementPath};
use gesso_layout::{AttributeValue, ElementMetadata, PropertyPath, ReorderAxis, insertion_index};

use crate::commands::{
    Command, WhenToRun, delete_properties, remove_absolute_positioning_props, set_cursor,
    set_property, update_selected_views,
};
use crate::interaction::InteractionSession;
use crate::strategies::{bounding_area_drag, metadata_for, reparent_target_under_point};
use crate::strategy::{
    CanvasControl, CanvasStrategy, ControlVisibility, ControlWithProps, CustomStrategyState,
    InteractionCanvasState, StrategyApplicationResult, StrategyControls, StrategyFactory, ids,
};

/// Pointer sample and elements shared by every reparent family.
pub(crate) struct ReparentCandidate<'a> {
    pub(crate) target: &'a ElementMetadata,
    pub(crate) sources: Vec<&'a ElementMetadata>,
    pub(crate) drag: CanvasVector,
    pub(crate) pointer: CanvasPoint,
}

/// Resolve the container under the pointer and check that every selected
/// element may move into it.
pub(crate) fn reparent_candidate<'a>(
    canvas: InteractionCanvasState<'a>,
    session: &'a InteractionSession,
    sources: &[ElementPath],
) -> Option<ReparentCandidate<'a>> {
    let drag_data = bounding_area_drag(session)?;
    if drag_data.modifiers.alt() || sources.is_empty() {
        return None;
    }
    let drag = drag_data.drag?;
    let pointer = drag_data.pointer()?;
    let metadata = canvas.starting_metadata;
    let source_metadata = metadata_for(metadata, sources)?;
    let target = reparent_target_under_point(metadata, canvas.selected, pointer)?;
    let target_path = &target.element_path;

    if sources
        .iter()
        .any(|source| source.parent_path() == *target_path)
    {
        return None;
    }
    let allowed = sources
        .iter()
        .all(|source| canvas.reparent_service.is_allowed_to_reparent(source, target_path));
    if !allowed {
        return None;
    }
    Some(ReparentCandidate {
        target,
        sources: source_metadata,
        drag,
        pointer,
    })
}

pub(crate) fn parent_controls(target: &ElementPath) -> StrategyControls {
    let mut controls = StrategyControls::new();
    controls.push(ControlWithProps::new(
        CanvasControl::ParentOutlines {
            target_parent: target.clone(),
        },
        "parent-outlines-control",
        ControlVisibility::VisibleOnlyWhileActive,
    ));
    controls.push(ControlWithProps::new(
        CanvasControl::ParentBounds {
            target_parent: target.clone(),
        },
        "parent-bounds-control",
        ControlVisibility::VisibleOnlyWhileActive,
    ));
    controls
}

/// Re-render list after moving `sources` into `target` as `new_paths`.
pub(crate) fn reparent_rerender_paths(
    target: &ElementPath,
    sources: &[&ElementMetadata],
    new_paths: &[ElementPath],
) -> Vec<ElementPath> {
    let mut paths = vec![target.clone()];
    paths.extend(sources.iter().map(|source| source.element_path.parent_path()));
    paths.extend(new_paths.iter().cloned());
    gesso_core::unique_element_paths(&paths)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlexReparentToAbsolute;

#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteReparent;

#[derive(Debug, Clone, Copy, Default)]
pub struct FlexReparentToFlex;

impl StrategyFactory for FlexReparentToAbsolute {
    fn name(&self) -> &str {
        "FlexReparentToAbsolute"
    }

    fn materialize<'a>(
        &self,
        canvas: InteractionCanvasState<'a>,
        session: &'a InteractionSession,
        _custom_state: &'a CustomStrategyState,
    ) -> Option<CanvasStrategy<'a>> {
        let candidate = reparent_candidate(canvas, session, canvas.selected)?;
        if candidate.sources.iter().any(|source| source.is_absolute()) {
            return None;
        }
        absolute_reparent_strategy(canvas, candidate, false)
    }
}

impl StrategyFactory for AbsoluteReparent {
    fn name(&self) -> &str {
        "AbsoluteReparent"
    }

    fn materialize<'a>(
        &self,
        canvas: InteractionCanvasState<'a>,
        session: &'a InteractionSession,
        _custom_state: &'a CustomStrategyState,
    ) -> Option<CanvasStrategy<'a>> {
        let candidate = reparent_candidate(canvas, session, canvas.selected)?;
        if !candidate.sources.iter().all(|source| source.is_absolute()) {
            return None;
        }
        absolute_reparent_strategy(canvas, candidate, true)
    }
}

fn provides_absolute_bounds(target: &ElementMetadata) -> bool {
    target
        .special_size_measurements
        .provides_bounds_for_absolute_children
        && !target.is_flex_container()
        && !target.is_grid_container()
}

fn absolute_reparent_strategy<'a>(
    canvas: InteractionCanvasState<'a>,
    candidate: ReparentCandidate<'a>,
    from_absolute: bool,
) -> Option<CanvasStrategy<'a>> {
    let target = candidate.target;
    if !provides_absolute_bounds(target)
        || !candidate.sources.iter().all(|source| source.honours_style_props)
    {
        return None;
    }
    let target_frame = target.frame()?;
    let source_frames: Vec<CanvasRect> = candidate
        .sources
        .iter()
        .map(|source| source.frame())
        .collect::<Option<_>>()?;
    let (id, name) = if from_absolute {
        (ids::ABSOLUTE_REPARENT, "Reparent (Abs)")
    } else {
        (ids::FLEX_REPARENT_TO_ABSOLUTE, "Reparent (Flex to Abs)")
    };
    let service = canvas.reparent_service;

    Some(CanvasStrategy::new(
        id,
        name,
        canvas.policy.reparent_fitness,
        parent_controls(&target.element_path),
        move |_lifecycle| {
            let mut commands = Vec::new();
            let mut new_paths = Vec::with_capacity(candidate.sources.len());
            for (source, frame) in candidate.sources.iter().zip(&source_frames) {
                let Some(outcome) =
                    service.reparent_outcome(&source.element_path, &target.element_path, None)
                else {
                    return StrategyApplicationResult::empty();
                };
                commands.extend(outcome.commands);
                let moved = frame.translate(candidate.drag);
                commands.extend(absolute_placement_commands(
                    &outcome.new_path,
                    target_frame,
                    moved,
                    !from_absolute,
                ));
                new_paths.push(outcome.new_path);
            }
            finish_reparent(commands, &target.element_path, &candidate.sources, new_paths)
        },
    ))
}

fn absolute_placement_commands(
    path: &ElementPath,
    parent_frame: CanvasRect,
    frame: CanvasRect,
    pin_size: bool,
) -> Vec<Command> {
    let number = |name: &str, value: f64| {
        set_property(
            WhenToRun::Always,
            path,
            PropertyPath::style(name),
            AttributeValue::Number(value),
        )
    };
    let mut commands = vec![
        delete_properties(
            WhenToRun::Always,
            path,
            vec![PropertyPath::style("right"), PropertyPath::style("bottom")],
        ),
        set_property(
            WhenToRun::Always,
            path,
            PropertyPath::style("position"),
            "absolute",
        ),
        number("left", frame.x - parent_frame.x),
        number("top", frame.y - parent_frame.y),
    ];
    if pin_size {
        commands.push(number("width", frame.width));
        commands.push(number("height", frame.height));
    }
    commands
}

fn finish_reparent(
    mut commands: Vec<Command>,
    target: &ElementPath,
    sources: &[&ElementMetadata],
    new_paths: Vec<ElementPath>,
) -> StrategyApplicationResult {
    let rerender = reparent_rerender_paths(target, sources, &new_paths);
    commands.push(update_selected_views(WhenToRun::Always, new_paths));
    commands.push(set_cursor(WhenToRun::MidInteraction, CursorIcon::Reparent));
    StrategyApplicationResult::new(commands, rerender)
}

impl StrategyFactory for FlexReparentToFlex {
    fn name(&self) -> &str {
        "FlexReparentToFlex"
    }

    fn materialize<'a>(
        &self,
        canvas: InteractionCanvasState<'a>,
        session: &'a InteractionSession,
        _custom_state: &'a CustomStrategyState,
    ) -> Option<CanvasStrategy<'a>> {
        let candidate = reparent_candidate(canvas, session, canvas.selected)?;
        let target = candidate.target;
        if !target.is_flex_container() || target.frame().is_none() {
            return None;
        }
        let children: Vec<CanvasRect> = canvas
            .starting_metadata
            .children_of(&target.element_path)
            .iter()
            .filter(|child| !child.is_absolute())
            .filter_map(|child| child.frame())
            .collect();
        let axis = ReorderAxis::for_container(target);
        let index = insertion_index(&children, candidate.pointer, axis);
        let service = canvas.reparent_service;

        let mut controls = parent_controls(&target.element_path);
        controls.push(ControlWithProps::new(
            CanvasControl::ReorderIndicator {
                parent: target.element_path.clone(),
            },
            format!("reorder-indicator-{}", target.element_path),
            ControlVisibility::VisibleOnlyWhileActive,
        ));

        Some(CanvasStrategy::new(
            ids::FLEX_REPARENT_TO_FLEX,
            "Reparent (Flex)",
            canvas.policy.reparent_fitness,
            controls,
            move |_lifecycle| {
                let mut commands = Vec::new();
                let mut new_paths = Vec::with_capacity(candidate.sources.len());
                for (offset, source) in candidate.sources.iter().enumerate() {
                    let Some(outcome) = service.reparent_outcome(
                        &source.element_path,
                        &target.element_path,
                        Some(index + offset),
                    ) else {
                        return StrategyApplicationResult::empty();
                    };
                    commands.extend(outcome.commands);
                    commands.push(remove_absolute_positioning_props(
                        WhenToRun::Always,
                        &outcome.new_path,
                    ));
                    new_paths.push(outcome.new_path);
                }
                finish_reparent(commands, &target.element_path, &candidate.sources, new_paths)
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{ActiveControl, StrategyLifecycle};
    use crate::services::NoReparent;
    use crate::strategies::test_support::{
        Scene, container, drag, drag_with, element, path, positioned,
    };
    use gesso_core::Modifiers;
    use gesso_layout::{LayoutSystem, PositionMode};

    /// `scene` holds a flex row `scene/row` with `a`, plus an absolute
    /// canvas `scene/board` to its right.
    fn two_containers() -> Vec<ElementMetadata> {
        let mut scene = container(
            "scene",
            0,
            CanvasRect::new(0.0, 0.0, 1000.0, 1000.0),
            LayoutSystem::Flow,
        );
        scene.special_size_measurements.provides_bounds_for_absolute_children = true;
        let row = container(
            "scene/row",
            0,
            CanvasRect::new(0.0, 0.0, 400.0, 100.0),
            LayoutSystem::Flex,
        );
        let mut a = element("scene/row/a", 0, CanvasRect::new(0.0, 0.0, 100.0, 100.0));
        a.special_size_measurements.parent_layout_system = LayoutSystem::Flex;
        let mut board = container(
            "scene/board",
            1,
            CanvasRect::new(500.0, 0.0, 400.0, 400.0),
            LayoutSystem::Flow,
        );
        board.special_size_measurements.provides_bounds_for_absolute_children = true;
        let b = element("scene/row/b", 1, CanvasRect::new(100.0, 0.0, 100.0, 100.0));
        vec![scene, row, a, b, board]
    }

    #[test]
    fn flow_element_reparents_into_absolute_board() {
        let scene = Scene::new(two_containers(), &["scene/row/a"]);
        let session = drag((50.0, 50.0), (500.0, 100.0), ActiveControl::BoundingArea);
        let strategy = FlexReparentToAbsolute
            .materialize(scene.canvas(), &session, &scene.custom)
            .expect("applies");
        assert_eq!(strategy.id, ids::FLEX_REPARENT_TO_ABSOLUTE);
        assert!(AbsoluteReparent.materialize(scene.canvas(), &session, &scene.custom).is_none());

        let result = strategy.apply(StrategyLifecycle::MidInteraction);
        assert_eq!(result.commands[0].kind(), "reparent_element");
        assert!(result.commands.contains(&set_property(
            WhenToRun::Always,
            &path("scene/board/a"),
            PropertyPath::style("left"),
            0.0,
        )));
        assert!(result.commands.contains(&set_property(
            WhenToRun::Always,
            &path("scene/board/a"),
            PropertyPath::style("top"),
            100.0,
        )));
        assert!(result.commands.contains(&update_selected_views(
            WhenToRun::Always,
            vec![path("scene/board/a")]
        )));
        assert_eq!(
            result.elements_to_rerender,
            vec![path("scene/board"), path("scene/row"), path("scene/board/a")]
        );
    }

    #[test]
    fn absolute_source_uses_absolute_reparent() {
        let mut elements = two_containers();
        elements[2] = positioned(elements[2].clone(), PositionMode::Absolute);
        let scene = Scene::new(elements, &["scene/row/a"]);
        let session = drag((50.0, 50.0), (500.0, 100.0), ActiveControl::BoundingArea);
        assert!(AbsoluteReparent.materialize(scene.canvas(), &session, &scene.custom).is_some());
        assert!(
            FlexReparentToAbsolute
                .materialize(scene.canvas(), &session, &scene.custom)
                .is_none()
        );
    }

    #[test]
    fn alt_disables_reparenting() {
        let scene = Scene::new(two_containers(), &["scene/row/a"]);
        let session = drag_with(
            (50.0, 50.0),
            (500.0, 100.0),
            Modifiers::ALT,
            ActiveControl::BoundingArea,
        );
        assert!(
            FlexReparentToAbsolute
                .materialize(scene.canvas(), &session, &scene.custom)
                .is_none()
        );
    }

    #[test]
    fn current_parent_is_not_a_target() {
        let scene = Scene::new(two_containers(), &["scene/row/a"]);
        let session = drag((50.0, 50.0), (100.0, 0.0), ActiveControl::BoundingArea);
        assert!(FlexReparentToFlex.materialize(scene.canvas(), &session, &scene.custom).is_none());
    }

    #[test]
    fn never_targets_own_descendant() {
        let mut elements = two_containers();
        let mut inner = container(
            "scene/row/a/inner",
            0,
            CanvasRect::new(0.0, 0.0, 100.0, 100.0),
            LayoutSystem::Flex,
        );
        inner.special_size_measurements.provides_bounds_for_absolute_children = true;
        elements.push(inner);
        let scene = Scene::new(elements, &["scene/row"]);
        let session = drag((10.0, 10.0), (20.0, 20.0), ActiveControl::BoundingArea);
        let target = reparent_target_under_point(
            &scene.metadata,
            &scene.selected,
            CanvasPoint::new(30.0, 30.0),
        )
        .expect("scene root");
        assert_eq!(target.element_path, path("scene"));
        assert!(FlexReparentToFlex.materialize(scene.canvas(), &session, &scene.custom).is_none());
    }

    #[test]
    fn legality_check_rejects_before_commands() {
        let scene = Scene::new(two_containers(), &["scene/row/a"]);
        let canvas = InteractionCanvasState {
            reparent_service: &NoReparent,
            ..scene.canvas()
        };
        let session = drag((50.0, 50.0), (500.0, 100.0), ActiveControl::BoundingArea);
        assert!(FlexReparentToAbsolute.materialize(canvas, &session, &scene.custom).is_none());
    }

    #[test]
    fn flex_target_gets_insertion_index_and_loses_absolute_props() {
        let mut elements = two_containers();
        let mut column = container(
            "scene/column",
            2,
            CanvasRect::new(0.0, 500.0, 100.0, 300.0),
            LayoutSystem::Flex,
        );
        column.special_size_measurements.flex_direction =
            Some(gesso_layout::FlexDirection::Column);
        elements.push(column);
        elements.push(element("scene/column/x", 0, CanvasRect::new(0.0, 500.0, 100.0, 100.0)));
        elements.push(element("scene/column/y", 1, CanvasRect::new(0.0, 600.0, 100.0, 100.0)));
        let scene = Scene::new(elements, &["scene/row/a"]);
        let session = drag((50.0, 50.0), (0.0, 620.0), ActiveControl::BoundingArea);
        let strategy = FlexReparentToFlex
            .materialize(scene.canvas(), &session, &scene.custom)
            .expect("applies");
        let result = strategy.apply(StrategyLifecycle::MidInteraction);
        assert_eq!(
            result.commands[0],
            crate::commands::reparent_element(
                WhenToRun::Always,
                &path("scene/row/a"),
                &path("scene/column"),
                Some(2)
            )
        );
        assert_eq!(
            result.commands[1],
            remove_absolute_positioning_props(WhenToRun::Always, &path("scene/column/a"))
        );
    }
}
