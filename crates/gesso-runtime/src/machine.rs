#![forbid(unsafe_code)]

//! Deterministic pointer/keyboard interaction lifecycle.
//!
//! The machine turns raw canvas input into lifecycle transitions. It knows
//! nothing about strategies; the engine reads its transitions and decides
//! when to rank, apply and flush.
//!
//! ```text
//! Idle -> Armed -> Dragging -> Idle
//!    \------> Idle (commit/cancel from Armed)
//! ```
//!
//! # Invariants
//!
//! 1. Every applied event produces exactly one transition; ignored events
//!    produce a reason-coded [`InteractionEffect::Noop`].
//! 2. `transition_id` increases by one per transition.
//! 3. Cancel and blur are no-ops while idle, so repeated cancels are safe.
//! 4. Events with a zero sequence or non-finite coordinates are rejected
//!    before any state changes.

use std::fmt;

use gesso_core::{CanvasPoint, CanvasVector, Modifiers};
use gesso_strategies::ActiveControl;
use serde::{Deserialize, Serialize};

/// Default distance, in canvas pixels, the pointer must travel beyond the
/// pointer-down position before a drag starts.
pub const DEFAULT_DRAG_THRESHOLD: f64 = 2.0;

/// Default minimum movement between reported drag samples. Zero reports
/// every sample.
pub const DEFAULT_UPDATE_HYSTERESIS: f64 = 0.0;

/// Why an interaction was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    EscapeKey,
    PointerCancel,
    FocusLost,
    Blur,
    Programmatic,
}

/// Interaction input kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InteractionInputEventKind {
    PointerDown {
        position: CanvasPoint,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        control: ActiveControl,
    },
    PointerMove {
        position: CanvasPoint,
    },
    PointerUp {
        position: CanvasPoint,
    },
    ModifiersChanged {
        modifiers: Modifiers,
    },
    Cancel {
        reason: CancelReason,
    },
    /// Pointer capture was lost.
    Blur,
    /// Discrete arrow-key move of the selection.
    KeyboardNudge {
        direction: CanvasVector,
        #[serde(default)]
        modifiers: Modifiers,
    },
}

/// One input event with its host-assigned sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionInputEvent {
    pub sequence: u64,
    #[serde(flatten)]
    pub kind: InteractionInputEventKind,
}

impl InteractionInputEvent {
    #[must_use]
    pub const fn new(sequence: u64, kind: InteractionInputEventKind) -> Self {
        Self { sequence, kind }
    }

    /// Validate event invariants required for deterministic replay.
    pub fn validate(&self) -> Result<(), InteractionEventError> {
        if self.sequence == 0 {
            return Err(InteractionEventError::ZeroSequence);
        }
        match self.kind {
            InteractionInputEventKind::PointerDown { position, .. }
            | InteractionInputEventKind::PointerMove { position }
            | InteractionInputEventKind::PointerUp { position } => {
                if !position.is_finite() {
                    return Err(InteractionEventError::NonFinitePosition {
                        x: position.x,
                        y: position.y,
                    });
                }
            }
            InteractionInputEventKind::KeyboardNudge { direction, .. } => {
                if !(direction.x.is_finite() && direction.y.is_finite()) {
                    return Err(InteractionEventError::NonFiniteNudge {
                        x: direction.x,
                        y: direction.y,
                    });
                }
            }
            InteractionInputEventKind::ModifiersChanged { .. }
            | InteractionInputEventKind::Cancel { .. }
            | InteractionInputEventKind::Blur => {}
        }
        Ok(())
    }
}

/// Validation failures for interaction input events.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEventError {
    ZeroSequence,
    NonFinitePosition { x: f64, y: f64 },
    NonFiniteNudge { x: f64, y: f64 },
}

impl fmt::Display for InteractionEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSequence => write!(f, "interaction event sequence must be non-zero"),
            Self::NonFinitePosition { x, y } => {
                write!(f, "pointer position must be finite (got {x}, {y})")
            }
            Self::NonFiniteNudge { x, y } => {
                write!(f, "keyboard nudge must be finite (got {x}, {y})")
            }
        }
    }
}

impl std::error::Error for InteractionEventError {}

/// Lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InteractionState {
    Idle,
    Armed {
        origin: CanvasPoint,
        current: CanvasPoint,
        modifiers: Modifiers,
        control: ActiveControl,
        started_sequence: u64,
    },
    Dragging {
        origin: CanvasPoint,
        current: CanvasPoint,
        modifiers: Modifiers,
        control: ActiveControl,
        started_sequence: u64,
        drag_started_sequence: u64,
    },
}

impl InteractionState {
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// Pointer-down position of the active gesture.
    #[must_use]
    pub const fn origin(&self) -> Option<CanvasPoint> {
        match self {
            Self::Idle => None,
            Self::Armed { origin, .. } | Self::Dragging { origin, .. } => Some(*origin),
        }
    }

    /// Latest accepted pointer position of the active gesture.
    #[must_use]
    pub const fn current(&self) -> Option<CanvasPoint> {
        match self {
            Self::Idle => None,
            Self::Armed { current, .. } | Self::Dragging { current, .. } => Some(*current),
        }
    }

    #[must_use]
    pub const fn modifiers(&self) -> Option<Modifiers> {
        match self {
            Self::Idle => None,
            Self::Armed { modifiers, .. } | Self::Dragging { modifiers, .. } => Some(*modifiers),
        }
    }

    #[must_use]
    pub const fn control(&self) -> Option<&ActiveControl> {
        match self {
            Self::Idle => None,
            Self::Armed { control, .. } | Self::Dragging { control, .. } => Some(control),
        }
    }
}

/// Explicit no-op diagnostics for lifecycle events that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionNoopReason {
    IdleWithoutActiveDrag,
    ActiveDragAlreadyInProgress,
    ThresholdNotReached,
    BelowHysteresis,
    ActiveStateDisallowsDiscreteInput,
}

/// Effect emitted by one lifecycle step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum InteractionEffect {
    Armed {
        origin: CanvasPoint,
        control: ActiveControl,
    },
    DragStarted {
        origin: CanvasPoint,
        current: CanvasPoint,
        total_delta: CanvasVector,
    },
    DragUpdated {
        previous: CanvasPoint,
        current: CanvasPoint,
        delta: CanvasVector,
        total_delta: CanvasVector,
    },
    ModifiersChanged {
        modifiers: Modifiers,
    },
    /// Pointer released. `dragged` is false when the threshold was never
    /// crossed, i.e. the gesture was a click.
    Committed {
        origin: CanvasPoint,
        end: CanvasPoint,
        total_delta: CanvasVector,
        dragged: bool,
    },
    Canceled {
        reason: CancelReason,
    },
    KeyboardNudged {
        direction: CanvasVector,
        modifiers: Modifiers,
    },
    Noop {
        reason: InteractionNoopReason,
    },
}

impl InteractionEffect {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop { .. })
    }

    /// Stable kind name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Armed { .. } => "armed",
            Self::DragStarted { .. } => "drag_started",
            Self::DragUpdated { .. } => "drag_updated",
            Self::ModifiersChanged { .. } => "modifiers_changed",
            Self::Committed { .. } => "committed",
            Self::Canceled { .. } => "canceled",
            Self::KeyboardNudged { .. } => "keyboard_nudged",
            Self::Noop { .. } => "noop",
        }
    }
}

/// One state-machine transition with deterministic telemetry fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionTransition {
    pub transition_id: u64,
    pub sequence: u64,
    pub from: InteractionState,
    pub to: InteractionState,
    pub effect: InteractionEffect,
}

/// Runtime lifecycle machine for canvas interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionMachine {
    state: InteractionState,
    drag_threshold: f64,
    update_hysteresis: f64,
    transition_counter: u64,
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self {
            state: InteractionState::Idle,
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            update_hysteresis: DEFAULT_UPDATE_HYSTERESIS,
            transition_counter: 0,
        }
    }
}

impl InteractionMachine {
    /// Construct a machine with an explicit drag threshold.
    pub fn new(drag_threshold: f64) -> Result<Self, InteractionMachineError> {
        Self::new_with_hysteresis(drag_threshold, DEFAULT_UPDATE_HYSTERESIS)
    }

    /// Construct a machine with explicit drag threshold and drag-update
    /// hysteresis.
    pub fn new_with_hysteresis(
        drag_threshold: f64,
        update_hysteresis: f64,
    ) -> Result<Self, InteractionMachineError> {
        if !drag_threshold.is_finite() || drag_threshold <= 0.0 {
            return Err(InteractionMachineError::InvalidDragThreshold {
                threshold: drag_threshold,
            });
        }
        if !update_hysteresis.is_finite() || update_hysteresis < 0.0 {
            return Err(InteractionMachineError::InvalidUpdateHysteresis {
                hysteresis: update_hysteresis,
            });
        }
        Ok(Self {
            state: InteractionState::Idle,
            drag_threshold,
            update_hysteresis,
            transition_counter: 0,
        })
    }

    #[must_use]
    pub const fn state(&self) -> &InteractionState {
        &self.state
    }

    #[must_use]
    pub const fn drag_threshold(&self) -> f64 {
        self.drag_threshold
    }

    #[must_use]
    pub const fn update_hysteresis(&self) -> f64 {
        self.update_hysteresis
    }

    /// Whether the machine is in a non-idle state (Armed or Dragging).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.state.is_idle()
    }

    /// Unconditionally reset to Idle.
    ///
    /// Returns a `Canceled` transition with [`CancelReason::Programmatic`]
    /// when the machine was active, `None` when it was already idle.
    pub fn force_cancel(&mut self) -> Option<InteractionTransition> {
        if self.state.is_idle() {
            return None;
        }
        let from = std::mem::replace(&mut self.state, InteractionState::Idle);
        Some(self.record(
            0,
            from,
            InteractionEffect::Canceled {
                reason: CancelReason::Programmatic,
            },
        ))
    }

    /// Apply one input event and emit the resulting transition.
    pub fn apply_event(
        &mut self,
        event: &InteractionInputEvent,
    ) -> Result<InteractionTransition, InteractionMachineError> {
        event
            .validate()
            .map_err(InteractionMachineError::InvalidEvent)?;

        let from = self.state.clone();
        let effect = match (&self.state, &event.kind) {
            (
                InteractionState::Idle,
                InteractionInputEventKind::PointerDown {
                    position,
                    modifiers,
                    control,
                },
            ) => {
                self.state = InteractionState::Armed {
                    origin: *position,
                    current: *position,
                    modifiers: *modifiers,
                    control: control.clone(),
                    started_sequence: event.sequence,
                };
                InteractionEffect::Armed {
                    origin: *position,
                    control: control.clone(),
                }
            }
            (
                InteractionState::Idle,
                InteractionInputEventKind::KeyboardNudge {
                    direction,
                    modifiers,
                },
            ) => InteractionEffect::KeyboardNudged {
                direction: *direction,
                modifiers: *modifiers,
            },
            (InteractionState::Idle, _) => noop(InteractionNoopReason::IdleWithoutActiveDrag),

            (
                InteractionState::Armed {
                    origin,
                    modifiers,
                    control,
                    started_sequence,
                    ..
                },
                InteractionInputEventKind::PointerMove { position },
            ) => {
                let (origin, modifiers, started_sequence) = (*origin, *modifiers, *started_sequence);
                let control = control.clone();
                if exceeds(origin, *position, self.drag_threshold) {
                    self.state = InteractionState::Dragging {
                        origin,
                        current: *position,
                        modifiers,
                        control,
                        started_sequence,
                        drag_started_sequence: event.sequence,
                    };
                    InteractionEffect::DragStarted {
                        origin,
                        current: *position,
                        total_delta: position.delta_from(origin),
                    }
                } else {
                    self.state = InteractionState::Armed {
                        origin,
                        current: *position,
                        modifiers,
                        control,
                        started_sequence,
                    };
                    noop(InteractionNoopReason::ThresholdNotReached)
                }
            }
            (
                InteractionState::Dragging {
                    origin, current, ..
                },
                InteractionInputEventKind::PointerMove { position },
            ) => {
                let (origin, previous) = (*origin, *current);
                if crossed(previous, *position, self.update_hysteresis) {
                    if let InteractionState::Dragging { current, .. } = &mut self.state {
                        *current = *position;
                    }
                    InteractionEffect::DragUpdated {
                        previous,
                        current: *position,
                        delta: position.delta_from(previous),
                        total_delta: position.delta_from(origin),
                    }
                } else {
                    noop(InteractionNoopReason::BelowHysteresis)
                }
            }
            (
                InteractionState::Armed { origin, .. },
                InteractionInputEventKind::PointerUp { position },
            ) => {
                let origin = *origin;
                self.state = InteractionState::Idle;
                InteractionEffect::Committed {
                    origin,
                    end: *position,
                    total_delta: position.delta_from(origin),
                    dragged: false,
                }
            }
            (
                InteractionState::Dragging { origin, .. },
                InteractionInputEventKind::PointerUp { position },
            ) => {
                let origin = *origin;
                self.state = InteractionState::Idle;
                InteractionEffect::Committed {
                    origin,
                    end: *position,
                    total_delta: position.delta_from(origin),
                    dragged: true,
                }
            }
            (
                InteractionState::Armed { .. } | InteractionState::Dragging { .. },
                InteractionInputEventKind::ModifiersChanged { modifiers },
            ) => {
                match &mut self.state {
                    InteractionState::Armed { modifiers: held, .. }
                    | InteractionState::Dragging { modifiers: held, .. } => *held = *modifiers,
                    InteractionState::Idle => {}
                }
                InteractionEffect::ModifiersChanged {
                    modifiers: *modifiers,
                }
            }
            (
                InteractionState::Armed { .. } | InteractionState::Dragging { .. },
                InteractionInputEventKind::Cancel { reason },
            ) => {
                self.state = InteractionState::Idle;
                InteractionEffect::Canceled { reason: *reason }
            }
            (
                InteractionState::Armed { .. } | InteractionState::Dragging { .. },
                InteractionInputEventKind::Blur,
            ) => {
                self.state = InteractionState::Idle;
                InteractionEffect::Canceled {
                    reason: CancelReason::Blur,
                }
            }
            (
                InteractionState::Armed { .. } | InteractionState::Dragging { .. },
                InteractionInputEventKind::PointerDown { .. },
            ) => noop(InteractionNoopReason::ActiveDragAlreadyInProgress),
            (
                InteractionState::Armed { .. } | InteractionState::Dragging { .. },
                InteractionInputEventKind::KeyboardNudge { .. },
            ) => noop(InteractionNoopReason::ActiveStateDisallowsDiscreteInput),
        };

        Ok(self.record(event.sequence, from, effect))
    }

    fn record(
        &mut self,
        sequence: u64,
        from: InteractionState,
        effect: InteractionEffect,
    ) -> InteractionTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        InteractionTransition {
            transition_id: self.transition_counter,
            sequence,
            from,
            to: self.state.clone(),
            effect,
        }
    }
}

/// Lifecycle machine configuration/runtime errors.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionMachineError {
    InvalidDragThreshold { threshold: f64 },
    InvalidUpdateHysteresis { hysteresis: f64 },
    InvalidEvent(InteractionEventError),
}

impl fmt::Display for InteractionMachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDragThreshold { threshold } => {
                write!(f, "drag threshold must be finite and > 0 (got {threshold})")
            }
            Self::InvalidUpdateHysteresis { hysteresis } => {
                write!(f, "update hysteresis must be finite and >= 0 (got {hysteresis})")
            }
            Self::InvalidEvent(error) => write!(f, "invalid interaction event: {error}"),
        }
    }
}

impl std::error::Error for InteractionMachineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::InvalidEvent(error) = self {
            return Some(error);
        }
        None
    }
}

const fn noop(reason: InteractionNoopReason) -> InteractionEffect {
    InteractionEffect::Noop { reason }
}

/// Strictly farther than `threshold`.
fn exceeds(from: CanvasPoint, to: CanvasPoint, threshold: f64) -> bool {
    to.delta_from(from).length() > threshold
}

/// At least `threshold` away; a zero threshold accepts every sample.
fn crossed(from: CanvasPoint, to: CanvasPoint, threshold: f64) -> bool {
    to.delta_from(from).length() >= threshold
}
