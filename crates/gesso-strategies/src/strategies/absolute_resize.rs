//! [`AbsoluteResize`]: drag a resize handle of one absolutely positioned
//! element.
//!
//! The dragged edges follow the pointer, the size never goes below zero,
//! and SHIFT on a corner handle keeps the original aspect ratio.

use gesso_core::{CanvasRect, CanvasVector, CursorIcon};
use gesso_layout::{AttributeValue, ElementMetadata, PropertyPath};

use crate::commands::{Command, WhenToRun, set_cursor, set_property};
use crate::interaction::{ActiveControl, InteractionSession, ResizeEdge};
use crate::strategy::{
    CanvasControl, CanvasStrategy, ControlVisibility, ControlWithProps, CustomStrategyState,
    InteractionCanvasState, StrategyApplicationResult, StrategyControls, StrategyFactory, ids,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteResize;

impl StrategyFactory for AbsoluteResize {
    fn name(&self) -> &str {
        "AbsoluteResize"
    }

    fn materialize<'a>(
        &self,
        canvas: InteractionCanvasState<'a>,
        session: &'a InteractionSession,
        _custom_state: &'a CustomStrategyState,
    ) -> Option<CanvasStrategy<'a>> {
        let ActiveControl::ResizeHandle { edge, priority } = session.active_control else {
            return None;
        };
        let drag = session.drag_data()?;
        let target = canvas.starting_metadata.get(canvas.single_selected()?)?;
        let pins_numeric = ["left", "top", "right", "bottom", "width", "height"]
            .iter()
            .all(|name| {
                target
                    .props
                    .get_style(name)
                    .is_none_or(|value| value.as_number().is_some())
            });
        if !target.is_absolute() || !target.honours_style_props || !pins_numeric {
            return None;
        }
        let frame = target.frame()?;

        let mut controls = StrategyControls::new();
        controls.push(ControlWithProps::new(
            CanvasControl::ResizeHandles {
                targets: canvas.selected.to_vec(),
            },
            "resize-handles",
            ControlVisibility::AlwaysVisible,
        ));

        Some(CanvasStrategy::new(
            ids::ABSOLUTE_RESIZE,
            "Resize",
            canvas.policy.control_fitness(priority),
            controls,
            move |_lifecycle| {
                let Some(mut delta) = drag.drag else {
                    return StrategyApplicationResult::empty();
                };
                if edge.horizontal() == 0 {
                    delta.x = 0.0;
                }
                if edge.vertical() == 0 {
                    delta.y = 0.0;
                }
                let keep_aspect = drag.modifiers.shift() && edge.is_corner();
                let resized = resized_frame(frame, edge, delta, keep_aspect);
                let mut commands = resize_commands(target, frame, resized, edge);
                commands.push(set_cursor(WhenToRun::MidInteraction, cursor_for(edge)));
                StrategyApplicationResult::new(commands, vec![target.element_path.clone()])
            },
        ))
    }
}

/// Frame after moving the edges named by `edge` by `delta`.
#[must_use]
pub(crate) fn resized_frame(
    frame: CanvasRect,
    edge: ResizeEdge,
    delta: CanvasVector,
    keep_aspect: bool,
) -> CanvasRect {
    let mut width = (frame.width + f64::from(edge.horizontal()) * delta.x).max(0.0);
    let mut height = (frame.height + f64::from(edge.vertical()) * delta.y).max(0.0);

    if keep_aspect && frame.width > 0.0 && frame.height > 0.0 {
        let scale = (width / frame.width).max(height / frame.height);
        width = frame.width * scale;
        height = frame.height * scale;
    }

    // The edge opposite the handle stays put.
    let x = if edge.horizontal() < 0 {
        frame.right() - width
    } else {
        frame.x
    };
    let y = if edge.vertical() < 0 {
        frame.bottom() - height
    } else {
        frame.y
    };
    CanvasRect::new(x, y, width, height)
}

fn resize_commands(
    target: &ElementMetadata,
    before: CanvasRect,
    after: CanvasRect,
    edge: ResizeEdge,
) -> Vec<Command> {
    let path = &target.element_path;
    let props = &target.props;
    let parent = target
        .special_size_measurements
        .immediate_parent_bounds
        .unwrap_or(CanvasRect::new(0.0, 0.0, 0.0, 0.0));
    let number = |name: &str, value: f64| {
        set_property(
            WhenToRun::Always,
            path,
            PropertyPath::style(name),
            AttributeValue::Number(value),
        )
    };

    let mut commands = Vec::with_capacity(5);
    if edge.horizontal() != 0 {
        commands.push(number("width", after.width));
        match (props.style_number("left"), props.style_number("right")) {
            (None, Some(right)) => {
                commands.push(number("right", right - (after.right() - before.right())));
            }
            _ => commands.push(number("left", after.x - parent.x)),
        }
    }
    if edge.vertical() != 0 {
        commands.push(number("height", after.height));
        match (props.style_number("top"), props.style_number("bottom")) {
            (None, Some(bottom)) => {
                commands.push(number("bottom", bottom - (after.bottom() - before.bottom())));
            }
            _ => commands.push(number("top", after.y - parent.y)),
        }
    }
    commands
}

const fn cursor_for(edge: ResizeEdge) -> CursorIcon {
    match edge {
        ResizeEdge::Top | ResizeEdge::Bottom => CursorIcon::ResizeNs,
        ResizeEdge::Left | ResizeEdge::Right => CursorIcon::ResizeEw,
        ResizeEdge::TopLeft | ResizeEdge::BottomRight => CursorIcon::ResizeNwse,
        ResizeEdge::TopRight | ResizeEdge::BottomLeft => CursorIcon::ResizeNesw,
    }
}
