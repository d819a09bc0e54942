#![forbid(unsafe_code)]

//! Strategy types and the factory capability.
//!
//! A [`StrategyFactory`] inspects the canvas and the session and either
//! declines (`None`) or materializes a [`CanvasStrategy`]. Materialized
//! strategies are ephemeral: they borrow the snapshot they were built from
//! and are dropped at the end of the update.
//!
//! # Invariants
//!
//! - `apply` is a pure function of the snapshot, the session and the custom
//!   strategy state captured at materialization time.
//! - A declined factory returns `None`, never a zero-fitness candidate.

use std::borrow::Cow;
use std::fmt;

use gesso_core::ElementPath;
use gesso_layout::{GridCellCoordinates, LayoutMetadataMap};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::commands::{Command, GridControlsTarget};
use crate::interaction::{InteractionSession, StrategyLifecycle};
use crate::policy::StrategyPolicy;
use crate::services::ReparentService;

/// Stable identity of a strategy family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(Cow<'static, str>);

impl StrategyId {
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for StrategyId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

impl From<&'static str> for StrategyId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identities of the built-in families.
pub mod ids {
    use super::StrategyId;

    pub const ABSOLUTE_MOVE: StrategyId = StrategyId::from_static("ABSOLUTE_MOVE");
    pub const ABSOLUTE_RESIZE: StrategyId = StrategyId::from_static("ABSOLUTE_RESIZE");
    pub const FLOW_REORDER: StrategyId = StrategyId::from_static("FLOW_REORDER");
    pub const FLEX_REORDER: StrategyId = StrategyId::from_static("FLEX_REORDER");
    pub const FLEX_REPARENT_TO_ABSOLUTE: StrategyId =
        StrategyId::from_static("FLEX_REPARENT_TO_ABSOLUTE");
    pub const ABSOLUTE_REPARENT: StrategyId = StrategyId::from_static("ABSOLUTE_REPARENT");
    pub const FLEX_REPARENT_TO_FLEX: StrategyId = StrategyId::from_static("FLEX_REPARENT_TO_FLEX");
    pub const GRID_CHANGE_ELEMENT_LOCATION: StrategyId =
        StrategyId::from_static("GRID_CHANGE_ELEMENT_LOCATION");
    pub const GRID_REPARENT: StrategyId = StrategyId::from_static("GRID_REPARENT");
    pub const DO_NOTHING: StrategyId = StrategyId::from_static("DO_NOTHING");
}

/// When the overlay should draw a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlVisibility {
    /// Whenever the owning strategy is a candidate.
    AlwaysVisible,
    /// Only while the owning strategy is current.
    VisibleOnlyWhileActive,
}

/// Overlay affordance the renderer knows how to draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanvasControl {
    ParentOutlines { target_parent: ElementPath },
    ParentBounds { target_parent: ElementPath },
    ImmediateParentOutlines { targets: Vec<ElementPath> },
    ZeroSizedElementControls,
    DragOutline { targets: Vec<ElementPath> },
    ResizeHandles { targets: Vec<ElementPath> },
    ReorderIndicator { parent: ElementPath },
    GridPlaceholders { target: GridControlsTarget },
}

/// A control plus its visibility policy. `key` deduplicates controls shared
/// by several candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlWithProps {
    pub control: CanvasControl,
    pub key: String,
    pub show: ControlVisibility,
}

impl ControlWithProps {
    #[must_use]
    pub fn new(control: CanvasControl, key: impl Into<String>, show: ControlVisibility) -> Self {
        Self {
            control,
            key: key.into(),
            show,
        }
    }
}

/// Controls of one strategy; most families draw at most four.
pub type StrategyControls = SmallVec<[ControlWithProps; 4]>;

/// Grid placeholder controls following `target`.
#[must_use]
pub fn controls_for_grid_placeholders(
    target: GridControlsTarget,
    show: ControlVisibility,
) -> ControlWithProps {
    let key = match &target {
        GridControlsTarget::GridContainer(path) => format!("grid-controls-{path}"),
        GridControlsTarget::GridItem(path) => format!("grid-controls-item-{path}"),
    };
    ControlWithProps::new(CanvasControl::GridPlaceholders { target }, key, show)
}

/// Grid-family cross-frame state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridCustomStrategyState {
    /// Last grid cell the pointer was over.
    pub target_cell_data: Option<GridCellCoordinates>,
}

/// State that must survive across pointer samples within one interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomStrategyState {
    pub grid: GridCustomStrategyState,
    pub elements_to_rerender: Vec<ElementPath>,
}

/// Partial update to [`CustomStrategyState`]; `None` keeps the old value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomStrategyStatePatch {
    pub grid: Option<GridCustomStrategyState>,
    pub elements_to_rerender: Option<Vec<ElementPath>>,
}

impl CustomStrategyStatePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grid.is_none() && self.elements_to_rerender.is_none()
    }
}

impl CustomStrategyState {
    /// Shallow merge: each family key present in `patch` replaces ours.
    pub fn merge(&mut self, patch: CustomStrategyStatePatch) {
        if let Some(grid) = patch.grid {
            self.grid = grid;
        }
        if let Some(elements) = patch.elements_to_rerender {
            self.elements_to_rerender = elements;
        }
    }

    #[must_use]
    pub fn merged(mut self, patch: CustomStrategyStatePatch) -> Self {
        self.merge(patch);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyApplicationStatus {
    Applied,
    /// Preconditions no longer held; nothing to do.
    Empty,
}

/// Output of one `apply` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyApplicationResult {
    pub commands: Vec<Command>,
    pub elements_to_rerender: Vec<ElementPath>,
    pub custom_state_patch: CustomStrategyStatePatch,
    pub status: StrategyApplicationStatus,
}

impl StrategyApplicationResult {
    /// No commands, nothing to re-render, custom state unchanged.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            commands: Vec::new(),
            elements_to_rerender: Vec::new(),
            custom_state_patch: CustomStrategyStatePatch::default(),
            status: StrategyApplicationStatus::Empty,
        }
    }

    #[must_use]
    pub fn new(commands: Vec<Command>, elements_to_rerender: Vec<ElementPath>) -> Self {
        Self {
            commands,
            elements_to_rerender,
            custom_state_patch: CustomStrategyStatePatch::default(),
            status: StrategyApplicationStatus::Applied,
        }
    }

    #[must_use]
    pub fn with_patch(mut self, patch: CustomStrategyStatePatch) -> Self {
        self.custom_state_patch = patch;
        self
    }
}

type ApplyFn<'a> = Box<dyn Fn(StrategyLifecycle) -> StrategyApplicationResult + 'a>;

/// A materialized candidate for one update.
pub struct CanvasStrategy<'a> {
    pub id: StrategyId,
    pub name: Cow<'static, str>,
    pub fitness: f64,
    pub controls_to_render: StrategyControls,
    apply: ApplyFn<'a>,
}

impl<'a> CanvasStrategy<'a> {
    #[must_use]
    pub fn new(
        id: StrategyId,
        name: impl Into<Cow<'static, str>>,
        fitness: f64,
        controls_to_render: StrategyControls,
        apply: impl Fn(StrategyLifecycle) -> StrategyApplicationResult + 'a,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            fitness,
            controls_to_render,
            apply: Box::new(apply),
        }
    }

    /// Run the strategy for `lifecycle`.
    #[must_use]
    pub fn apply(&self, lifecycle: StrategyLifecycle) -> StrategyApplicationResult {
        (self.apply)(lifecycle)
    }
}

impl fmt::Debug for CanvasStrategy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasStrategy")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("fitness", &self.fitness)
            .field("controls_to_render", &self.controls_to_render.len())
            .finish_non_exhaustive()
    }
}

/// Everything a factory may read about the canvas for one update.
#[derive(Clone, Copy)]
pub struct InteractionCanvasState<'a> {
    /// Snapshot captured when the interaction began.
    pub starting_metadata: &'a LayoutMetadataMap,
    /// Selection captured when the interaction began.
    pub selected: &'a [ElementPath],
    pub reparent_service: &'a dyn ReparentService,
    pub policy: &'a StrategyPolicy,
}

impl fmt::Debug for InteractionCanvasState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionCanvasState")
            .field("starting_metadata", &self.starting_metadata.len())
            .field("selected", &self.selected)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<'a> InteractionCanvasState<'a> {
    /// The single selected path, if exactly one is selected.
    #[must_use]
    pub fn single_selected(&self) -> Option<&'a ElementPath> {
        match self.selected {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// One structural-edit family.
///
/// Factories are registered in order; registration order breaks fitness
/// ties. A factory must be deterministic: the same inputs always give the
/// same decision and the same fitness.
pub trait StrategyFactory: Send + Sync {
    /// Human-readable factory name for logs.
    fn name(&self) -> &str;

    /// The fallback is dropped whenever any other candidate exists.
    fn is_fallback(&self) -> bool {
        false
    }

    /// Decline with `None` or materialize a candidate.
    fn materialize<'a>(
        &self,
        canvas: InteractionCanvasState<'a>,
        session: &'a InteractionSession,
        custom_state: &'a CustomStrategyState,
    ) -> Option<CanvasStrategy<'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_replaces_only_present_keys() {
        let path: ElementPath = "a/b".parse().expect("path");
        let mut state = CustomStrategyState {
            grid: GridCustomStrategyState {
                target_cell_data: Some(GridCellCoordinates::new(1, 1)),
            },
            elements_to_rerender: vec![path.clone()],
        };
        state.merge(CustomStrategyStatePatch {
            grid: None,
            elements_to_rerender: Some(Vec::new()),
        });
        assert_eq!(
            state.grid.target_cell_data,
            Some(GridCellCoordinates::new(1, 1))
        );
        assert!(state.elements_to_rerender.is_empty());

        state.merge(CustomStrategyStatePatch {
            grid: Some(GridCustomStrategyState::default()),
            elements_to_rerender: None,
        });
        assert_eq!(state.grid.target_cell_data, None);
    }

    #[test]
    fn empty_result_has_no_effects() {
        let result = StrategyApplicationResult::empty();
        assert!(result.commands.is_empty());
        assert!(result.custom_state_patch.is_empty());
        assert_eq!(result.status, StrategyApplicationStatus::Empty);
    }

    #[test]
    fn strategy_id_display_and_json() {
        assert_eq!(ids::DO_NOTHING.to_string(), "DO_NOTHING");
        let json = serde_json::to_string(&ids::GRID_REPARENT).expect("serialize");
        assert_eq!(json, r#""GRID_REPARENT""#);
        let back: StrategyId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, ids::GRID_REPARENT);
    }

    #[test]
    fn apply_closure_runs_per_lifecycle() {
        let strategy = CanvasStrategy::new(
            ids::DO_NOTHING,
            "Do nothing",
            0.1,
            StrategyControls::new(),
            |lifecycle| match lifecycle {
                StrategyLifecycle::MidInteraction => StrategyApplicationResult::empty(),
                StrategyLifecycle::EndInteraction => {
                    StrategyApplicationResult::new(Vec::new(), Vec::new())
                }
            },
        );
        assert_eq!(
            strategy.apply(StrategyLifecycle::MidInteraction).status,
            StrategyApplicationStatus::Empty
        );
        assert_eq!(
            strategy.apply(StrategyLifecycle::EndInteraction).status,
            StrategyApplicationStatus::Applied
        );
    }
}
