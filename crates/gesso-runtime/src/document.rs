#![forbid(unsafe_code)]

//! Seams to the document model and the measurement pass.
//!
//! The engine never owns the document. It reads layout snapshots from a
//! [`LayoutMetadataProvider`] and hands command lists to a [`DocumentStore`].

use std::fmt;
use std::sync::Arc;

use gesso_core::ElementPath;
use gesso_layout::LayoutMetadataMap;
use gesso_strategies::Command;
use serde::{Deserialize, Serialize};

/// How a flushed command list is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPhase {
    /// Replace the current transient patch. The committed document is
    /// untouched.
    Transient,
    /// Apply as one committed transaction.
    Commit,
}

/// Read access to the latest layout measurements.
pub trait LayoutMetadataProvider {
    /// The most recently published snapshot.
    fn snapshot(&self) -> Arc<LayoutMetadataMap>;
}

impl LayoutMetadataProvider for Arc<LayoutMetadataMap> {
    fn snapshot(&self) -> Arc<LayoutMetadataMap> {
        Arc::clone(self)
    }
}

/// The document model the engine edits.
///
/// `apply_commands` is atomic: on error nothing of the list is applied.
pub trait DocumentStore {
    fn apply_commands(
        &mut self,
        commands: &[Command],
        phase: FlushPhase,
    ) -> Result<(), DocumentStoreError>;

    /// Drop the transient patch, restoring the committed document.
    fn discard_transient(&mut self);

    fn current_selection(&self) -> Vec<ElementPath>;

    fn set_selection(&mut self, selection: Vec<ElementPath>);
}

/// Why a document store refused a command list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStoreError {
    /// A command addressed an element that does not exist.
    MissingElement { path: ElementPath },
    /// A command cannot be applied to the element it addresses.
    InvalidCommand {
        kind: &'static str,
        path: ElementPath,
        reason: String,
    },
    /// The store refused the transaction as a whole.
    Rejected(String),
}

impl fmt::Display for DocumentStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingElement { path } => write!(f, "no element at {path}"),
            Self::InvalidCommand { kind, path, reason } => {
                write!(f, "cannot apply {kind} to {path}: {reason}")
            }
            Self::Rejected(reason) => write!(f, "document store rejected commands: {reason}"),
        }
    }
}

impl std::error::Error for DocumentStoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arc_provider_shares_snapshot() {
        let map = Arc::new(LayoutMetadataMap::new());
        let snapshot = map.snapshot();
        assert!(Arc::ptr_eq(&map, &snapshot));
    }

    #[test]
    fn error_messages_name_the_element() {
        let path: ElementPath = "root/a".parse().expect("path");
        let err = DocumentStoreError::MissingElement { path };
        assert_eq!(err.to_string(), "no element at root/a");
    }
}
