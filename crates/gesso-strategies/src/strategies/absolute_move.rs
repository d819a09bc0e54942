//! [`AbsoluteMove`]: drag or nudge absolutely positioned elements.
//!
//! Each axis rewrites one pin. The authored near pin (`left`, `top`) wins,
//! then the far pin (`right`, `bottom`); with neither authored the near pin
//! is derived from the measured frame relative to the parent bounds.

use gesso_core::{CanvasRect, CanvasVector, ElementPath};
use gesso_layout::{AttributeValue, ElementMetadata, PropertyBag, PropertyPath};

use crate::commands::{Command, WhenToRun, set_property};
use crate::interaction::{ActiveControl, InteractionData, InteractionSession};
use crate::strategies::metadata_for;
use crate::strategy::{
    CanvasControl, CanvasStrategy, ControlVisibility, ControlWithProps, CustomStrategyState,
    InteractionCanvasState, StrategyApplicationResult, StrategyControls, StrategyFactory, ids,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteMove;

impl StrategyFactory for AbsoluteMove {
    fn name(&self) -> &str {
        "AbsoluteMove"
    }

    fn materialize<'a>(
        &self,
        canvas: InteractionCanvasState<'a>,
        session: &'a InteractionSession,
        _custom_state: &'a CustomStrategyState,
    ) -> Option<CanvasStrategy<'a>> {
        match (&session.interaction_data, &session.active_control) {
            (InteractionData::Drag(_), ActiveControl::BoundingArea)
            | (InteractionData::Keyboard(_), ActiveControl::KeyboardCatcher) => {}
            _ => return None,
        }
        if canvas.selected.is_empty() {
            return None;
        }
        let targets = metadata_for(canvas.starting_metadata, canvas.selected)?;
        let movable = targets.iter().all(|meta| {
            meta.is_absolute()
                && meta.honours_style_props
                && meta.frame().is_some()
                && pins_are_numeric(&meta.props)
        });
        if !movable {
            return None;
        }

        let mut controls = StrategyControls::new();
        controls.push(ControlWithProps::new(
            CanvasControl::ImmediateParentOutlines {
                targets: canvas.selected.to_vec(),
            },
            "immediate-parent-outlines",
            ControlVisibility::VisibleOnlyWhileActive,
        ));

        Some(CanvasStrategy::new(
            ids::ABSOLUTE_MOVE,
            "Move",
            canvas.policy.absolute_move_fitness,
            controls,
            move |_lifecycle| {
                let Some(offset) = move_offset(session) else {
                    return StrategyApplicationResult::empty();
                };
                let commands = targets
                    .iter()
                    .flat_map(|meta| move_commands(meta, offset))
                    .collect();
                StrategyApplicationResult::new(commands, canvas.selected.to_vec())
            },
        ))
    }
}

fn pins_are_numeric(props: &PropertyBag) -> bool {
    ["left", "top", "right", "bottom"]
        .iter()
        .all(|pin| props.get_style(pin).is_none_or(|value| value.as_number().is_some()))
}

/// Offset to apply, with SHIFT locking drags to the dominant axis.
fn move_offset(session: &InteractionSession) -> Option<CanvasVector> {
    match &session.interaction_data {
        InteractionData::Drag(drag) => {
            let offset = drag.drag?;
            Some(if drag.modifiers.shift() {
                offset.lock_to_dominant_axis()
            } else {
                offset
            })
        }
        InteractionData::Keyboard(keyboard) => Some(keyboard.nudge),
    }
}

fn move_commands(meta: &ElementMetadata, offset: CanvasVector) -> Vec<Command> {
    let Some(frame) = meta.frame() else {
        return Vec::new();
    };
    let parent = meta
        .special_size_measurements
        .immediate_parent_bounds
        .unwrap_or(CanvasRect::new(0.0, 0.0, 0.0, 0.0));
    let path = &meta.element_path;
    vec![
        axis_command(path, &meta.props, ("left", "right"), frame.x - parent.x, offset.x),
        axis_command(path, &meta.props, ("top", "bottom"), frame.y - parent.y, offset.y),
    ]
}

fn axis_command(
    path: &ElementPath,
    props: &PropertyBag,
    (near, far): (&str, &str),
    measured_near: f64,
    delta: f64,
) -> Command {
    let (pin, value) = match (props.style_number(near), props.style_number(far)) {
        (Some(current), _) => (near, current + delta),
        (None, Some(current)) => (far, current - delta),
        (None, None) => (near, measured_near + delta),
    };
    set_property(
        WhenToRun::Always,
        path,
        PropertyPath::style(pin),
        AttributeValue::Number(value),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::StrategyLifecycle;
    use crate::strategies::test_support::{Scene, drag, drag_with, element, path, positioned};
    use gesso_core::Modifiers;
    use gesso_layout::PositionMode;

    fn absolute_child(props: PropertyBag) -> gesso_layout::ElementMetadata {
        let mut meta = positioned(
            element("root/a", 0, CanvasRect::new(50.0, 60.0, 20.0, 20.0)),
            PositionMode::Absolute,
        );
        meta.special_size_measurements.immediate_parent_bounds =
            Some(CanvasRect::new(10.0, 10.0, 500.0, 500.0));
        meta.props = props;
        meta
    }

    fn values(result: &StrategyApplicationResult) -> Vec<(String, f64)> {
        result
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::SetProperty {
                    property, value, ..
                } => Some((property.to_string(), value.as_number()?)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn moves_authored_left_top() {
        let props = PropertyBag::new().with_style("left", 40.0).with_style("top", 50.0);
        let scene = Scene::new(vec![absolute_child(props)], &["root/a"]);
        let session = drag((55.0, 65.0), (10.0, -5.0), ActiveControl::BoundingArea);
        let strategy = AbsoluteMove
            .materialize(scene.canvas(), &session, &scene.custom)
            .expect("applies");
        let result = strategy.apply(StrategyLifecycle::MidInteraction);
        assert_eq!(
            values(&result),
            vec![("style.left".into(), 50.0), ("style.top".into(), 45.0)]
        );
        assert_eq!(result.elements_to_rerender, vec![path("root/a")]);
    }

    #[test]
    fn far_pins_move_opposite() {
        let props = PropertyBag::new().with_style("right", 40.0).with_style("bottom", 20.0);
        let scene = Scene::new(vec![absolute_child(props)], &["root/a"]);
        let session = drag((55.0, 65.0), (10.0, 10.0), ActiveControl::BoundingArea);
        let strategy = AbsoluteMove
            .materialize(scene.canvas(), &session, &scene.custom)
            .expect("applies");
        assert_eq!(
            values(&strategy.apply(StrategyLifecycle::MidInteraction)),
            vec![("style.right".into(), 30.0), ("style.bottom".into(), 10.0)]
        );
    }

    #[test]
    fn unpinned_axis_is_derived_from_frame() {
        let scene = Scene::new(vec![absolute_child(PropertyBag::new())], &["root/a"]);
        let session = drag_with((55.0, 65.0), (10.0, 3.0), Modifiers::SHIFT, ActiveControl::BoundingArea);
        let strategy = AbsoluteMove
            .materialize(scene.canvas(), &session, &scene.custom)
            .expect("applies");
        assert_eq!(
            values(&strategy.apply(StrategyLifecycle::MidInteraction)),
            vec![("style.left".into(), 50.0), ("style.top".into(), 50.0)]
        );
    }

    #[test]
    fn keyboard_nudge_moves() {
        let props = PropertyBag::new().with_style("left", 0.0).with_style("top", 0.0);
        let scene = Scene::new(vec![absolute_child(props)], &["root/a"]);
        let session = InteractionSession::keyboard(CanvasVector::new(0.0, 1.0), Modifiers::NONE);
        let strategy = AbsoluteMove
            .materialize(scene.canvas(), &session, &scene.custom)
            .expect("applies");
        assert_eq!(
            values(&strategy.apply(StrategyLifecycle::EndInteraction)),
            vec![("style.left".into(), 0.0), ("style.top".into(), 1.0)]
        );
    }

    #[test]
    fn declines_static_expression_and_wrong_control() {
        let mut flow = absolute_child(PropertyBag::new());
        flow.special_size_measurements.position = PositionMode::Static;
        let scene = Scene::new(vec![flow], &["root/a"]);
        let session = drag((0.0, 0.0), (10.0, 10.0), ActiveControl::BoundingArea);
        assert!(AbsoluteMove.materialize(scene.canvas(), &session, &scene.custom).is_none());

        let props = PropertyBag::new().with_style(
            "left",
            AttributeValue::Expression {
                expression: "props.x".into(),
            },
        );
        let scene = Scene::new(vec![absolute_child(props)], &["root/a"]);
        assert!(AbsoluteMove.materialize(scene.canvas(), &session, &scene.custom).is_none());

        let scene = Scene::new(vec![absolute_child(PropertyBag::new())], &["root/a"]);
        let handle = drag((0.0, 0.0), (10.0, 10.0), ActiveControl::grid_cell_handle("h"));
        assert!(AbsoluteMove.materialize(scene.canvas(), &handle, &scene.custom).is_none());
    }

    #[test]
    fn missing_path_declines() {
        let scene = Scene::new(Vec::new(), &["root/a"]);
        let session = drag((0.0, 0.0), (10.0, 10.0), ActiveControl::BoundingArea);
        assert!(AbsoluteMove.materialize(scene.canvas(), &session, &scene.custom).is_none());
    }
}
