#![forbid(unsafe_code)]

//! Interaction session data seen by strategies.
//!
//! A session exists from the moment a pointer gesture crosses the drag
//! threshold (or a keyboard nudge arrives) until it is committed or
//! cancelled. Strategies never mutate it; the runtime rebuilds it from the
//! lifecycle machine on every update.

use gesso_core::{CanvasPoint, CanvasVector, Modifiers};
use serde::{Deserialize, Serialize};

use crate::strategy::StrategyId;

/// Default priority of a grid cell drag handle.
pub const GRID_CELL_HANDLE_PRIORITY: i32 = 2;
/// Default priority of a resize handle.
pub const RESIZE_HANDLE_PRIORITY: i32 = 1;

/// Edge or corner a resize handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeEdge {
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeEdge {
    /// Horizontal factor: -1 moves the left edge, 1 the right edge, 0 neither.
    #[must_use]
    pub const fn horizontal(self) -> i8 {
        match self {
            Self::Left | Self::TopLeft | Self::BottomLeft => -1,
            Self::Right | Self::TopRight | Self::BottomRight => 1,
            Self::Top | Self::Bottom => 0,
        }
    }

    /// Vertical factor: -1 moves the top edge, 1 the bottom edge, 0 neither.
    #[must_use]
    pub const fn vertical(self) -> i8 {
        match self {
            Self::Top | Self::TopLeft | Self::TopRight => -1,
            Self::Bottom | Self::BottomLeft | Self::BottomRight => 1,
            Self::Left | Self::Right => 0,
        }
    }

    #[must_use]
    pub const fn is_corner(self) -> bool {
        self.horizontal() != 0 && self.vertical() != 0
    }
}

/// The on-screen control that started the gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActiveControl {
    /// Generic drag on the selection's bounding area.
    BoundingArea,
    GridCellHandle { id: String, priority: i32 },
    ResizeHandle { edge: ResizeEdge, priority: i32 },
    /// Keyboard focus on the canvas.
    KeyboardCatcher,
}

impl ActiveControl {
    #[must_use]
    pub fn grid_cell_handle(id: impl Into<String>) -> Self {
        Self::GridCellHandle {
            id: id.into(),
            priority: GRID_CELL_HANDLE_PRIORITY,
        }
    }

    #[must_use]
    pub const fn resize_handle(edge: ResizeEdge) -> Self {
        Self::ResizeHandle {
            edge,
            priority: RESIZE_HANDLE_PRIORITY,
        }
    }

    /// Priority used in fitness tie-breaks.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        match self {
            Self::GridCellHandle { priority, .. } | Self::ResizeHandle { priority, .. } => {
                *priority
            }
            Self::BoundingArea | Self::KeyboardCatcher => 0,
        }
    }

    /// Stable kind name for logs.
    #[must_use]
    pub const fn kind(&self) -> ActiveControlKind {
        match self {
            Self::BoundingArea => ActiveControlKind::BoundingArea,
            Self::GridCellHandle { .. } => ActiveControlKind::GridCellHandle,
            Self::ResizeHandle { .. } => ActiveControlKind::ResizeHandle,
            Self::KeyboardCatcher => ActiveControlKind::KeyboardCatcher,
        }
    }
}

impl Default for ActiveControl {
    fn default() -> Self {
        Self::BoundingArea
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveControlKind {
    BoundingArea,
    GridCellHandle,
    ResizeHandle,
    KeyboardCatcher,
}

/// Pointer drag state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragInteractionData {
    pub drag_start: CanvasPoint,
    /// Vector from `drag_start` to the pointer; `None` before the threshold.
    pub drag: Option<CanvasVector>,
    pub prev_drag: Option<CanvasVector>,
    pub modifiers: Modifiers,
    pub has_mouse_moved: bool,
}

impl DragInteractionData {
    #[must_use]
    pub const fn new(drag_start: CanvasPoint, modifiers: Modifiers) -> Self {
        Self {
            drag_start,
            drag: None,
            prev_drag: None,
            modifiers,
            has_mouse_moved: false,
        }
    }

    /// Current pointer position, if the drag has started.
    #[must_use]
    pub fn pointer(&self) -> Option<CanvasPoint> {
        self.drag.map(|drag| self.drag_start.offset(drag))
    }
}

/// Discrete keyboard nudge of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyboardInteractionData {
    pub nudge: CanvasVector,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionData {
    Drag(DragInteractionData),
    Keyboard(KeyboardInteractionData),
}

impl InteractionData {
    #[must_use]
    pub const fn modifiers(&self) -> Modifiers {
        match self {
            Self::Drag(drag) => drag.modifiers,
            Self::Keyboard(keyboard) => keyboard.modifiers,
        }
    }

    #[must_use]
    pub const fn as_drag(&self) -> Option<&DragInteractionData> {
        match self {
            Self::Drag(drag) => Some(drag),
            Self::Keyboard(_) => None,
        }
    }
}

/// One in-progress gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSession {
    pub interaction_data: InteractionData,
    pub active_control: ActiveControl,
    /// Explicit user choice that wins whenever it is applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_preferred_strategy: Option<StrategyId>,
}

impl InteractionSession {
    /// Drag session with the pointer at `drag_start + drag`.
    #[must_use]
    pub fn drag(
        drag_start: CanvasPoint,
        drag: CanvasVector,
        modifiers: Modifiers,
        active_control: ActiveControl,
    ) -> Self {
        Self {
            interaction_data: InteractionData::Drag(DragInteractionData {
                drag_start,
                drag: Some(drag),
                prev_drag: None,
                modifiers,
                has_mouse_moved: true,
            }),
            active_control,
            user_preferred_strategy: None,
        }
    }

    #[must_use]
    pub fn keyboard(nudge: CanvasVector, modifiers: Modifiers) -> Self {
        Self {
            interaction_data: InteractionData::Keyboard(KeyboardInteractionData {
                nudge,
                modifiers,
            }),
            active_control: ActiveControl::KeyboardCatcher,
            user_preferred_strategy: None,
        }
    }

    #[must_use]
    pub fn with_preferred_strategy(mut self, id: StrategyId) -> Self {
        self.user_preferred_strategy = Some(id);
        self
    }

    #[must_use]
    pub const fn modifiers(&self) -> Modifiers {
        self.interaction_data.modifiers()
    }

    #[must_use]
    pub const fn drag_data(&self) -> Option<&DragInteractionData> {
        self.interaction_data.as_drag()
    }
}

/// Phase in which a strategy's `apply` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyLifecycle {
    MidInteraction,
    EndInteraction,
}
