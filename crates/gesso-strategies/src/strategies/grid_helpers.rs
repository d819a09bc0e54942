//! Grid placement commands shared by the grid families.
//!
//! Placement is always written as the four longhand properties. The
//! `gridArea`, `gridColumn` and `gridRow` shorthands are deleted first so
//! they cannot override the longhands.
//!
//! # End properties
//!
//! When moving an existing item, end lines are only written if the author
//! already controls them: a shorthand containing `/` (`"1 / span 2"`) or an
//! explicit longhand end. Otherwise CSS's implicit single-track end applies.
//! This is a narrow heuristic, not a model of grid auto-placement.

use gesso_core::ElementPath;
use gesso_layout::{
    GridAxis, GridContainerProperties, GridPlacement, PropertyBag, PropertyPath,
};

use crate::commands::{Command, WhenToRun, delete_properties, set_property};

const SHORTHANDS: [&str; 3] = ["gridArea", "gridColumn", "gridRow"];
const TEMPLATE_PROPS: [(&str, GridAxis); 2] = [
    ("gridTemplateColumns", GridAxis::Column),
    ("gridTemplateRows", GridAxis::Row),
];

/// Whether an authored end for the axis of `shorthand` must be kept.
#[must_use]
pub fn keep_authored_end(authored: &PropertyBag, shorthand: &str, longhand_end: &str) -> bool {
    let shorthand_has_end = authored
        .get_style(shorthand)
        .and_then(|value| value.as_str())
        .is_some_and(|text| text.contains('/'));
    shorthand_has_end || authored.has_style(longhand_end)
}

/// Commands placing `element` at `placement`.
///
/// With `authored` set, end lines pass through [`keep_authored_end`]; with
/// `None` all four longhands are written.
#[must_use]
pub fn grid_placement_commands(
    when: WhenToRun,
    element: &ElementPath,
    placement: GridPlacement,
    container: &GridContainerProperties,
    authored: Option<&PropertyBag>,
) -> Vec<Command> {
    let keep_end = |shorthand: &str, longhand_end: &str| {
        authored.is_none_or(|props| keep_authored_end(props, shorthand, longhand_end))
    };
    let keep_column_end = keep_end("gridColumn", "gridColumnEnd");
    let keep_row_end = keep_end("gridRow", "gridRowEnd");

    let mut commands = vec![delete_properties(
        when,
        element,
        SHORTHANDS.iter().map(|name| PropertyPath::style(name)).collect(),
    )];
    let mut line = |name: &str, axis: GridAxis, value: i32| {
        commands.push(set_property(
            when,
            element,
            PropertyPath::style(name),
            container.line_value(axis, value),
        ));
    };
    line("gridColumnStart", GridAxis::Column, placement.column_start);
    if keep_column_end {
        line("gridColumnEnd", GridAxis::Column, placement.column_end);
    }
    line("gridRowStart", GridAxis::Row, placement.row_start);
    if keep_row_end {
        line("gridRowEnd", GridAxis::Row, placement.row_end);
    }
    commands
}

/// Pin the container's templates to their measured values for the rest of
/// the drag, so the grid does not reflow under the pointer.
#[must_use]
pub fn template_pin_commands(
    container_path: &ElementPath,
    measured: &GridContainerProperties,
) -> Vec<Command> {
    TEMPLATE_PROPS
        .iter()
        .filter_map(|(name, axis)| {
            let template = measured.template(*axis)?;
            Some(set_property(
                WhenToRun::MidInteraction,
                container_path,
                PropertyPath::style(name),
                template.to_css(),
            ))
        })
        .collect()
}

/// Restore the authored templates once the interaction completes, deleting
/// the ones the author never wrote.
#[must_use]
pub fn template_restore_commands(
    container_path: &ElementPath,
    authored: &PropertyBag,
) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut unauthored = Vec::new();
    for (name, _) in TEMPLATE_PROPS {
        match authored.get_style(name) {
            Some(value) => commands.push(set_property(
                WhenToRun::OnComplete,
                container_path,
                PropertyPath::style(name),
                value.clone(),
            )),
            None => unauthored.push(PropertyPath::style(name)),
        }
    }
    if !unauthored.is_empty() {
        commands.push(delete_properties(
            WhenToRun::OnComplete,
            container_path,
            unauthored,
        ));
    }
    commands
}
