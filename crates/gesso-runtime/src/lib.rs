#![forbid(unsafe_code)]

//! Runtime: the interaction lifecycle and the engine loop around it.
//!
//! # Role in Gesso
//! `gesso-runtime` is where input events become document edits. The
//! [`InteractionMachine`] classifies raw pointer and keyboard events; the
//! [`InteractionEngine`] ranks strategies on each session-affecting
//! transition and flushes the current strategy's commands to a
//! [`DocumentStore`].
//!
//! # Primary responsibilities
//! - **machine**: `Idle -> Armed -> Dragging -> Idle` with reason-coded no-ops.
//! - **engine**: rank, apply, and flush per transition; transient vs committed.
//! - **document**: the document store and layout provider seams.
//! - **policy_config**: thresholds and fitness constants as data.

pub mod document;
pub mod engine;
pub mod machine;
pub mod policy_config;

pub use document::{DocumentStore, DocumentStoreError, FlushPhase, LayoutMetadataProvider};
pub use engine::{EngineContext, EngineError, EngineUpdate, InteractionEngine};
pub use machine::{
    CancelReason, InteractionEffect, InteractionEventError, InteractionInputEvent,
    InteractionInputEventKind, InteractionMachine, InteractionMachineError, InteractionNoopReason,
    InteractionState, InteractionTransition,
};
pub use policy_config::{
    FitnessPolicyConfig, PolicyConfig, PolicyConfigError, RankingPolicyConfig,
    SessionPolicyConfig,
};
