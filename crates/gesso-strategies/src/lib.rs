#![forbid(unsafe_code)]

//! Strategies: candidate structural edits for an in-progress gesture.
//!
//! # Role in Gesso
//! Given a layout snapshot, the selection and the current interaction
//! session, the [`StrategyRegistry`] asks every [`StrategyFactory`] whether
//! its edit family applies, ranks the candidates by fitness and applies the
//! current one. Strategies emit declarative [`Command`]s; they never touch
//! the document themselves.
//!
//! # Primary responsibilities
//! - **interaction**: session data, active controls, lifecycle phases.
//! - **commands**: the document store's edit vocabulary.
//! - **strategy**: the factory capability and materialized candidates.
//! - **registry**: deterministic ranking with fallback and hysteresis.
//! - **strategies**: the built-in absolute, reorder, reparent and grid families.
//! - **policy**: fitness constants and thresholds.
//! - **services**: the external reparent legality check.
//!
//! # How it fits in the system
//! `gesso-runtime` drives the registry from pointer events and flushes the
//! resulting commands to a document store.

pub mod commands;
pub mod interaction;
pub mod policy;
pub mod registry;
pub mod services;
pub mod strategies;
pub mod strategy;

pub use commands::{Command, ElementsToRerender, GridControlsTarget, WhenToRun};
pub use interaction::{
    ActiveControl, ActiveControlKind, DragInteractionData, InteractionData, InteractionSession,
    KeyboardInteractionData, ResizeEdge, StrategyLifecycle,
};
pub use policy::StrategyPolicy;
pub use registry::{RankedStrategies, StrategyRegistry, StrategySummary};
pub use services::{NoReparent, ReparentOutcome, ReparentService};
pub use strategies::default_strategy_factories;
pub use strategy::{
    CanvasControl, CanvasStrategy, ControlVisibility, ControlWithProps, CustomStrategyState,
    CustomStrategyStatePatch, GridCustomStrategyState, InteractionCanvasState,
    StrategyApplicationResult, StrategyApplicationStatus, StrategyControls, StrategyFactory,
    StrategyId, ids,
};
