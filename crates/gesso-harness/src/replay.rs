#![forbid(unsafe_code)]

//! Replay a recorded interaction from JSON.
//!
//! # Scenario format
//!
//! ```json
//! {
//!   "metadata": [{"element_path": "root", "global_frame": {...}, ...}],
//!   "selection": ["root/a"],
//!   "policy": {"session": {"drag_threshold": 3.0}},
//!   "events": [
//!     {"sequence": 1, "event": "pointer_down", "position": {"x": 10.0, "y": 10.0}},
//!     {"sequence": 2, "event": "pointer_move", "position": {"x": 40.0, "y": 10.0}},
//!     {"sequence": 3, "event": "pointer_up", "position": {"x": 40.0, "y": 10.0}}
//!   ]
//! }
//! ```
//!
//! `policy` is optional; a policy passed to [`replay`] takes precedence.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gesso_core::ElementPath;
use gesso_layout::ElementMetadata;
use gesso_runtime::{
    EngineError, EngineUpdate, InteractionInputEvent, PolicyConfig, PolicyConfigError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::document::MemoryDocument;
use crate::driver::EngineHarness;
use crate::scene::Scene;

/// Errors surfaced by scenario replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid policy: {0}")]
    Policy(#[from] PolicyConfigError),

    #[error("event {sequence} failed: {source}")]
    Engine {
        sequence: u64,
        #[source]
        source: EngineError,
    },
}

impl ReplayError {
    /// Process exit code for the replay binary.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } => 66,
            Self::Json(_) | Self::Policy(_) => 65,
            Self::Output(_) => 74,
            Self::Engine { .. } => 1,
        }
    }
}

/// A recorded interaction: one layout snapshot, a selection and the input
/// events of the gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayScenario {
    pub metadata: Vec<ElementMetadata>,
    #[serde(default)]
    pub selection: Vec<ElementPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyConfig>,
    pub events: Vec<InteractionInputEvent>,
}

impl ReplayScenario {
    pub fn from_json_str(s: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    #[must_use]
    pub fn scene(&self) -> Scene {
        Scene {
            metadata: Arc::new(self.metadata.iter().cloned().collect()),
            selection: self.selection.clone(),
        }
    }
}

/// Updates produced by a replay and the document they left behind.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub updates: Vec<EngineUpdate>,
    pub document: MemoryDocument,
}

/// Run every event of `scenario` through a fresh engine.
pub fn replay(
    scenario: &ReplayScenario,
    policy: Option<&PolicyConfig>,
) -> Result<ReplayOutcome, ReplayError> {
    let policy = policy
        .or(scenario.policy.as_ref())
        .cloned()
        .unwrap_or_default();
    let engine = policy.to_engine()?;
    info!(
        target: "gesso.replay",
        elements = scenario.metadata.len(),
        events = scenario.events.len(),
        policy = %policy.to_jsonl(),
        "replay start"
    );

    let mut harness = EngineHarness::new(&scenario.scene(), engine);
    let mut updates = Vec::with_capacity(scenario.events.len());
    for event in &scenario.events {
        let update = harness
            .handle(event)
            .map_err(|source| ReplayError::Engine {
                sequence: event.sequence,
                source,
            })?;
        debug!(
            target: "gesso.replay",
            sequence = event.sequence,
            effect = update.transition.effect.kind(),
            current = update.current.as_ref().map(|id| id.as_str()),
            commands = update.commands.len(),
            "replayed event"
        );
        updates.push(update);
    }
    Ok(ReplayOutcome {
        updates,
        document: harness.into_document(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "metadata": [
            {
                "element_path": "root",
                "global_frame": {"type": "finite", "x": 0.0, "y": 0.0, "width": 300.0, "height": 100.0},
                "accepts_children": true,
                "special_size_measurements": {"layout_system_for_children": "flex"}
            },
            {
                "element_path": "root/a",
                "global_frame": {"type": "finite", "x": 0.0, "y": 0.0, "width": 100.0, "height": 100.0},
                "special_size_measurements": {"parent_layout_system": "flex"}
            },
            {
                "element_path": "root/b",
                "index_in_parent": 1,
                "global_frame": {"type": "finite", "x": 100.0, "y": 0.0, "width": 100.0, "height": 100.0},
                "special_size_measurements": {"parent_layout_system": "flex"}
            }
        ],
        "selection": ["root/a"],
        "events": [
            {"sequence": 1, "event": "pointer_down", "position": {"x": 50.0, "y": 50.0}},
            {"sequence": 2, "event": "pointer_move", "position": {"x": 180.0, "y": 50.0}},
            {"sequence": 3, "event": "pointer_up", "position": {"x": 180.0, "y": 50.0}}
        ]
    }"#;

    #[test]
    fn replays_a_flex_reorder() {
        let scenario = ReplayScenario::from_json_str(SCENARIO).expect("scenario");
        let outcome = replay(&scenario, None).expect("replay");
        assert_eq!(outcome.updates.len(), 3);
        assert_eq!(
            outcome.updates[1].current.as_ref().map(|id| id.as_str()),
            Some("FLEX_REORDER")
        );
        assert_eq!(outcome.document.commit_count(), 1);
        let root: ElementPath = "root".parse().expect("path");
        let order: Vec<String> = outcome
            .document
            .committed()
            .children(&root)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(order, ["root/b", "root/a"]);
    }

    #[test]
    fn invalid_policy_is_reported() {
        let scenario = ReplayScenario::from_json_str(SCENARIO).expect("scenario");
        let mut policy = PolicyConfig::default();
        policy.session.drag_threshold = -1.0;
        let err = replay(&scenario, Some(&policy)).expect_err("invalid");
        assert!(matches!(err, ReplayError::Policy(_)));
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn zero_sequence_fails_with_event_context() {
        let mut scenario = ReplayScenario::from_json_str(SCENARIO).expect("scenario");
        scenario.events[0].sequence = 0;
        let err = replay(&scenario, None).expect_err("invalid event");
        assert!(matches!(err, ReplayError::Engine { sequence: 0, .. }));
        assert!(err.to_string().starts_with("event 0 failed"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ReplayScenario::from_json_file("/definitely/not/here.json").expect_err("io");
        assert!(matches!(err, ReplayError::Io { .. }));
    }
}
