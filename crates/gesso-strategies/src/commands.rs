#![forbid(unsafe_code)]

//! Declarative edit commands emitted by strategies.
//!
//! Commands are the document store's primitive edit vocabulary. They carry
//! no undo data and are idempotent: applying the same list to the same
//! document twice yields the same document.
//!
//! # Invariants
//!
//! - Every command carries a [`WhenToRun`]; the runtime flushes only the
//!   commands whose phase matches the current lifecycle step.
//! - Commands name elements by [`ElementPath`] as they exist at the moment
//!   the command runs, so commands following a reparent use the new path.

use gesso_core::{CursorIcon, ElementPath};
use gesso_layout::{AttributeValue, GridCellCoordinates, PropertyPath};
use serde::{Deserialize, Serialize};

use crate::interaction::StrategyLifecycle;

/// Interaction phase a command applies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhenToRun {
    Always,
    MidInteraction,
    OnComplete,
}

impl WhenToRun {
    /// Whether a command with this phase is flushed during `lifecycle`.
    #[must_use]
    pub const fn runs_during(self, lifecycle: StrategyLifecycle) -> bool {
        match (self, lifecycle) {
            (Self::Always, _)
            | (Self::MidInteraction, StrategyLifecycle::MidInteraction)
            | (Self::OnComplete, StrategyLifecycle::EndInteraction) => true,
            (Self::MidInteraction, StrategyLifecycle::EndInteraction)
            | (Self::OnComplete, StrategyLifecycle::MidInteraction) => false,
        }
    }
}

/// Which grid the placeholder overlay should follow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "path", rename_all = "snake_case")]
pub enum GridControlsTarget {
    GridContainer(ElementPath),
    /// The grid containing this item.
    GridItem(ElementPath),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "paths", rename_all = "snake_case")]
pub enum ElementsToRerender {
    RerenderAll,
    Paths(Vec<ElementPath>),
}

/// One primitive document edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    SetProperty {
        when: WhenToRun,
        element: ElementPath,
        property: PropertyPath,
        value: AttributeValue,
    },
    DeleteProperties {
        when: WhenToRun,
        element: ElementPath,
        properties: Vec<PropertyPath>,
    },
    /// Move `element` to `index` among its siblings.
    ReorderElement {
        when: WhenToRun,
        element: ElementPath,
        index: usize,
    },
    /// Move `element` under `new_parent`; appended when `index` is `None`.
    ReparentElement {
        when: WhenToRun,
        element: ElementPath,
        new_parent: ElementPath,
        index: Option<usize>,
    },
    UpdateSelectedViews {
        when: WhenToRun,
        paths: Vec<ElementPath>,
    },
    ShowGridControls {
        when: WhenToRun,
        target: GridControlsTarget,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_cell: Option<GridCellCoordinates>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root_cell: Option<GridCellCoordinates>,
    },
    SetCursor {
        when: WhenToRun,
        cursor: CursorIcon,
    },
    SetElementsToRerender {
        when: WhenToRun,
        elements: ElementsToRerender,
    },
}

impl Command {
    #[must_use]
    pub const fn when(&self) -> WhenToRun {
        match self {
            Self::SetProperty { when, .. }
            | Self::DeleteProperties { when, .. }
            | Self::ReorderElement { when, .. }
            | Self::ReparentElement { when, .. }
            | Self::UpdateSelectedViews { when, .. }
            | Self::ShowGridControls { when, .. }
            | Self::SetCursor { when, .. }
            | Self::SetElementsToRerender { when, .. } => *when,
        }
    }

    /// Stable kind name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SetProperty { .. } => "set_property",
            Self::DeleteProperties { .. } => "delete_properties",
            Self::ReorderElement { .. } => "reorder_element",
            Self::ReparentElement { .. } => "reparent_element",
            Self::UpdateSelectedViews { .. } => "update_selected_views",
            Self::ShowGridControls { .. } => "show_grid_controls",
            Self::SetCursor { .. } => "set_cursor",
            Self::SetElementsToRerender { .. } => "set_elements_to_rerender",
        }
    }

    /// Element a document edit touches; `None` for editor-state commands.
    #[must_use]
    pub const fn target(&self) -> Option<&ElementPath> {
        match self {
            Self::SetProperty { element, .. }
            | Self::DeleteProperties { element, .. }
            | Self::ReorderElement { element, .. }
            | Self::ReparentElement { element, .. } => Some(element),
            Self::UpdateSelectedViews { .. }
            | Self::ShowGridControls { .. }
            | Self::SetCursor { .. }
            | Self::SetElementsToRerender { .. } => None,
        }
    }

    #[must_use]
    pub const fn runs_during(&self, lifecycle: StrategyLifecycle) -> bool {
        self.when().runs_during(lifecycle)
    }
}

#[must_use]
pub fn set_property(
    when: WhenToRun,
    element: &ElementPath,
    property: PropertyPath,
    value: impl Into<AttributeValue>,
) -> Command {
    Command::SetProperty {
        when,
        element: element.clone(),
        property,
        value: value.into(),
    }
}

/// One `SetProperty` per entry, in order.
#[must_use]
pub fn update_bulk_properties(
    when: WhenToRun,
    element: &ElementPath,
    properties: Vec<(PropertyPath, AttributeValue)>,
) -> Vec<Command> {
    properties
        .into_iter()
        .map(|(property, value)| set_property(when, element, property, value))
        .collect()
}

#[must_use]
pub fn delete_properties(
    when: WhenToRun,
    element: &ElementPath,
    properties: Vec<PropertyPath>,
) -> Command {
    Command::DeleteProperties {
        when,
        element: element.clone(),
        properties,
    }
}

#[must_use]
pub fn reorder_element(when: WhenToRun, element: &ElementPath, index: usize) -> Command {
    Command::ReorderElement {
        when,
        element: element.clone(),
        index,
    }
}

#[must_use]
pub fn reparent_element(
    when: WhenToRun,
    element: &ElementPath,
    new_parent: &ElementPath,
    index: Option<usize>,
) -> Command {
    Command::ReparentElement {
        when,
        element: element.clone(),
        new_parent: new_parent.clone(),
        index,
    }
}

#[must_use]
pub fn update_selected_views(when: WhenToRun, paths: Vec<ElementPath>) -> Command {
    Command::UpdateSelectedViews { when, paths }
}

#[must_use]
pub fn show_grid_controls(
    when: WhenToRun,
    target: GridControlsTarget,
    target_cell: Option<GridCellCoordinates>,
    root_cell: Option<GridCellCoordinates>,
) -> Command {
    Command::ShowGridControls {
        when,
        target,
        target_cell,
        root_cell,
    }
}

#[must_use]
pub const fn set_cursor(when: WhenToRun, cursor: CursorIcon) -> Command {
    Command::SetCursor { when, cursor }
}

#[must_use]
pub fn set_elements_to_rerender(when: WhenToRun, paths: Vec<ElementPath>) -> Command {
    Command::SetElementsToRerender {
        when,
        elements: ElementsToRerender::Paths(paths),
    }
}

/// Properties that only make sense for absolutely positioned elements.
pub const ABSOLUTE_POSITIONING_PROPS: [&str; 5] = ["position", "left", "top", "right", "bottom"];

/// Strip absolute positioning from `element`.
#[must_use]
pub fn remove_absolute_positioning_props(when: WhenToRun, element: &ElementPath) -> Command {
    delete_properties(
        when,
        element,
        ABSOLUTE_POSITIONING_PROPS
            .iter()
            .map(|name| PropertyPath::style(name))
            .collect(),
    )
}

/// Keep only the commands that run during `lifecycle`.
#[must_use]
pub fn commands_for_lifecycle(commands: &[Command], lifecycle: StrategyLifecycle) -> Vec<Command> {
    commands
        .iter()
        .filter(|command| command.runs_during(lifecycle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> ElementPath {
        s.parse().expect("valid path")
    }

    #[test]
    fn phase_filtering() {
        let commands = vec![
            reorder_element(WhenToRun::Always, &path("a/b"), 0),
            set_cursor(WhenToRun::MidInteraction, CursorIcon::Move),
            delete_properties(WhenToRun::OnComplete, &path("a"), vec![]),
        ];
        let mid = commands_for_lifecycle(&commands, StrategyLifecycle::MidInteraction);
        let end = commands_for_lifecycle(&commands, StrategyLifecycle::EndInteraction);
        assert_eq!(
            mid.iter().map(Command::kind).collect::<Vec<_>>(),
            vec!["reorder_element", "set_cursor"]
        );
        assert_eq!(
            end.iter().map(Command::kind).collect::<Vec<_>>(),
            vec!["reorder_element", "delete_properties"]
        );
    }

    #[test]
    fn absolute_props_removal_lists_all_pins() {
        let command = remove_absolute_positioning_props(WhenToRun::Always, &path("a/b"));
        let Command::DeleteProperties { properties, .. } = command else {
            panic!("expected delete");
        };
        assert_eq!(properties.len(), 5);
        assert!(properties.contains(&PropertyPath::style("left")));
    }

    #[test]
    fn command_json_is_tagged() {
        let command = reorder_element(WhenToRun::Always, &path("a/b"), 2);
        let json = serde_json::to_string(&command).expect("serialize");
        assert_eq!(
            json,
            r#"{"type":"reorder_element","when":"always","element":"a/b","index":2}"#
        );
    }

    #[test]
    fn editor_commands_have_no_target() {
        assert!(set_cursor(WhenToRun::Always, CursorIcon::Reparent).target().is_none());
        assert_eq!(
            reorder_element(WhenToRun::Always, &path("a/b"), 0).target(),
            Some(&path("a/b"))
        );
    }
}
