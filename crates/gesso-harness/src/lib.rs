#![forbid(unsafe_code)]

//! Harness: fixtures and reference collaborators for the Gesso engine.
//!
//! # Role in Gesso
//! The engine never owns a document or a measurement pass. This crate
//! supplies in-memory stand-ins for both so the engine can be exercised end
//! to end, in tests, benches, and the `gesso-replay` binary.
//!
//! # Primary responsibilities
//! - **scene**: [`SceneBuilder`] fixtures producing a measured snapshot.
//! - **document**: [`MemoryDocument`], a transactional store with transient patches.
//! - **reparent**: [`TreeReparentService`], snapshot-backed reparent legality.
//! - **driver**: [`EngineHarness`] and [`EventScript`] for feeding events.
//! - **replay**: JSON scenario replay.

pub mod document;
pub mod driver;
pub mod replay;
pub mod reparent;
pub mod scene;

pub use document::{DocumentTree, EditorState, FlushRecord, GridControlsView, MemoryDocument};
pub use driver::{EngineHarness, EventScript};
pub use replay::{ReplayError, ReplayOutcome, ReplayScenario, replay};
pub use reparent::TreeReparentService;
pub use scene::{Scene, SceneBuilder, SceneError};
