#![forbid(unsafe_code)]

//! Policy-as-data configuration for the interaction engine.
//!
//! Captures every tunable threshold and fitness constant as a single
//! [`PolicyConfig`] that can be loaded from TOML or JSON at startup.
//!
//! # Loading
//!
//! ```toml
//! # gesso-policy.toml
//! [session]
//! drag_threshold = 3.0
//!
//! [ranking]
//! hysteresis_margin = 0.25
//! ```
//!
//! ```rust,ignore
//! let policy = PolicyConfig::from_toml_file("gesso-policy.toml")?;
//! let engine = policy.to_engine()?;
//! ```
//!
//! # Defaults
//!
//! Every field defaults to the built-in constant it replaces, so
//! `PolicyConfig::default()` behaves exactly like an engine built without
//! configuration.

#[cfg(feature = "policy-config")]
use std::path::Path;

use gesso_strategies::policy::{
    DEFAULT_ABSOLUTE_MOVE_FITNESS, DEFAULT_CONTROL_FITNESS_BASE, DEFAULT_FALLBACK_FITNESS,
    DEFAULT_FITNESS_FLOOR, DEFAULT_HYSTERESIS_MARGIN, DEFAULT_REORDER_FITNESS,
    DEFAULT_REORDER_PROGRESS_BONUS, DEFAULT_REPARENT_FITNESS,
};
use gesso_strategies::{StrategyPolicy, StrategyRegistry};
use serde::{Deserialize, Serialize};

use crate::engine::InteractionEngine;
use crate::machine::{
    DEFAULT_DRAG_THRESHOLD, DEFAULT_UPDATE_HYSTERESIS, InteractionMachine,
    InteractionMachineError,
};

/// Top-level policy configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Lifecycle machine thresholds.
    pub session: SessionPolicyConfig,
    /// Registry ranking thresholds.
    pub ranking: RankingPolicyConfig,
    /// Per-family fitness constants.
    pub fitness: FitnessPolicyConfig,
}

impl PolicyConfig {
    /// Load from a TOML string.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, PolicyConfigError> {
        toml::from_str(s).map_err(PolicyConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PolicyConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(PolicyConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(s: &str) -> Result<Self, PolicyConfigError> {
        serde_json::from_str(s).map_err(PolicyConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(PolicyConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.session.drag_threshold.is_finite() || self.session.drag_threshold <= 0.0 {
            errors.push(format!(
                "session.drag_threshold must be > 0, got {}",
                self.session.drag_threshold
            ));
        }
        if !self.session.update_hysteresis.is_finite() || self.session.update_hysteresis < 0.0 {
            errors.push(format!(
                "session.update_hysteresis must be >= 0, got {}",
                self.session.update_hysteresis
            ));
        }

        if !self.ranking.fitness_floor.is_finite() || self.ranking.fitness_floor < 0.0 {
            errors.push(format!(
                "ranking.fitness_floor must be >= 0, got {}",
                self.ranking.fitness_floor
            ));
        }
        if !self.ranking.fallback_fitness.is_finite() || self.ranking.fallback_fitness <= 0.0 {
            errors.push(format!(
                "ranking.fallback_fitness must be > 0, got {}",
                self.ranking.fallback_fitness
            ));
        }
        if !self.ranking.hysteresis_margin.is_finite() || self.ranking.hysteresis_margin < 0.0 {
            errors.push(format!(
                "ranking.hysteresis_margin must be >= 0, got {}",
                self.ranking.hysteresis_margin
            ));
        }

        for (name, value) in [
            ("fitness.control_base", self.fitness.control_base),
            ("fitness.absolute_move", self.fitness.absolute_move),
            ("fitness.reorder", self.fitness.reorder),
            ("fitness.reorder_progress_bonus", self.fitness.reorder_progress_bonus),
            ("fitness.reparent", self.fitness.reparent),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} must be >= 0, got {value}"));
            }
        }

        for (name, value) in [
            ("fitness.absolute_move", self.fitness.absolute_move),
            ("fitness.reorder", self.fitness.reorder),
            ("fitness.reparent", self.fitness.reparent),
        ] {
            if value <= self.ranking.fitness_floor {
                errors.push(format!(
                    "{name} must exceed ranking.fitness_floor ({}), got {value}",
                    self.ranking.fitness_floor
                ));
            }
        }

        errors
    }

    /// Fail with every validation error at once.
    pub fn validated(self) -> Result<Self, PolicyConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(PolicyConfigError::Validation(errors))
        }
    }

    /// Build a [`StrategyPolicy`] from this policy.
    #[must_use]
    pub fn to_strategy_policy(&self) -> StrategyPolicy {
        StrategyPolicy {
            fitness_floor: self.ranking.fitness_floor,
            fallback_fitness: self.ranking.fallback_fitness,
            hysteresis_margin: self.ranking.hysteresis_margin,
            control_fitness_base: self.fitness.control_base,
            absolute_move_fitness: self.fitness.absolute_move,
            reorder_fitness: self.fitness.reorder,
            reorder_progress_bonus: self.fitness.reorder_progress_bonus,
            reparent_fitness: self.fitness.reparent,
        }
    }

    /// Build an [`InteractionMachine`] from this policy.
    pub fn to_machine(&self) -> Result<InteractionMachine, InteractionMachineError> {
        InteractionMachine::new_with_hysteresis(
            self.session.drag_threshold,
            self.session.update_hysteresis,
        )
    }

    /// Validate and build an engine with the default strategy families.
    pub fn to_engine(&self) -> Result<InteractionEngine, PolicyConfigError> {
        self.to_engine_with_registry(StrategyRegistry::default())
    }

    /// Validate and build an engine around `registry`.
    pub fn to_engine_with_registry(
        &self,
        registry: StrategyRegistry,
    ) -> Result<InteractionEngine, PolicyConfigError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(PolicyConfigError::Validation(errors));
        }
        let machine = self.to_machine().map_err(PolicyConfigError::Machine)?;
        Ok(InteractionEngine::new(
            machine,
            registry,
            self.to_strategy_policy(),
        ))
    }

    /// Format as a JSONL line for structured logging.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        format!(
            r#"{{"schema":"gesso-policy-config-v1","drag_threshold":{},"update_hysteresis":{},"fitness_floor":{},"fallback_fitness":{},"hysteresis_margin":{},"control_base":{},"absolute_move":{},"reorder":{},"reorder_progress_bonus":{},"reparent":{}}}"#,
            self.session.drag_threshold,
            self.session.update_hysteresis,
            self.ranking.fitness_floor,
            self.ranking.fallback_fitness,
            self.ranking.hysteresis_margin,
            self.fitness.control_base,
            self.fitness.absolute_move,
            self.fitness.reorder,
            self.fitness.reorder_progress_bonus,
            self.fitness.reparent,
        )
    }
}

/// Lifecycle machine thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPolicyConfig {
    /// Pointer travel (px) before a drag starts. Default: 2.
    pub drag_threshold: f64,
    /// Minimum movement (px) between reported drag samples. Default: 0.
    pub update_hysteresis: f64,
}

impl Default for SessionPolicyConfig {
    fn default() -> Self {
        Self {
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            update_hysteresis: DEFAULT_UPDATE_HYSTERESIS,
        }
    }
}

/// Registry ranking thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingPolicyConfig {
    /// Candidates at or below this fitness are discarded. Default: 0.
    pub fitness_floor: f64,
    /// Fitness of the do-nothing fallback. Default: 0.1.
    pub fallback_fitness: f64,
    /// Lead a rival needs to displace the current strategy. Default: 0.1.
    pub hysteresis_margin: f64,
}

impl Default for RankingPolicyConfig {
    fn default() -> Self {
        Self {
            fitness_floor: DEFAULT_FITNESS_FLOOR,
            fallback_fitness: DEFAULT_FALLBACK_FITNESS,
            hysteresis_margin: DEFAULT_HYSTERESIS_MARGIN,
        }
    }
}

/// Per-family fitness constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessPolicyConfig {
    /// Added to the active control's priority. Default: 0.
    pub control_base: f64,
    /// Default: 1.
    pub absolute_move: f64,
    /// Default: 1.
    pub reorder: f64,
    /// Scaled by reorder progress. Default: 0.5.
    pub reorder_progress_bonus: f64,
    /// Default: 2.
    pub reparent: f64,
}

impl Default for FitnessPolicyConfig {
    fn default() -> Self {
        Self {
            control_base: DEFAULT_CONTROL_FITNESS_BASE,
            absolute_move: DEFAULT_ABSOLUTE_MOVE_FITNESS,
            reorder: DEFAULT_REORDER_FITNESS,
            reorder_progress_bonus: DEFAULT_REORDER_PROGRESS_BONUS,
            reparent: DEFAULT_REPARENT_FITNESS,
        }
    }
}

/// Errors that can occur when loading a policy configuration.
#[derive(Debug)]
pub enum PolicyConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "policy-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "policy-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
    /// Machine thresholds rejected.
    Machine(InteractionMachineError),
}

impl std::fmt::Display for PolicyConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
            Self::Machine(e) => write!(f, "invalid machine thresholds: {e}"),
        }
    }
}

impl std::error::Error for PolicyConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
            Self::Machine(e) => Some(e),
        }
    }
}
