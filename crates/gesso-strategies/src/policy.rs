#![forbid(unsafe_code)]

//! Fitness constants and ranking thresholds.
//!
//! Fitness values are family-specific rather than normalized. The defaults
//! below are tuned against the drag-to-move scenarios: control-driven
//! strategies outrank geometric ones, reparenting outranks reordering, and
//! the fallback sits below everything.

use serde::{Deserialize, Serialize};

/// Default fitness floor; candidates at or below it are discarded.
pub const DEFAULT_FITNESS_FLOOR: f64 = 0.0;
/// Default fitness of the do-nothing fallback.
pub const DEFAULT_FALLBACK_FITNESS: f64 = 0.1;
/// Default margin a rival must exceed to displace the current strategy.
pub const DEFAULT_HYSTERESIS_MARGIN: f64 = 0.1;
pub const DEFAULT_CONTROL_FITNESS_BASE: f64 = 0.0;
pub const DEFAULT_ABSOLUTE_MOVE_FITNESS: f64 = 1.0;
pub const DEFAULT_REORDER_FITNESS: f64 = 1.0;
pub const DEFAULT_REORDER_PROGRESS_BONUS: f64 = 0.5;
pub const DEFAULT_REPARENT_FITNESS: f64 = 2.0;

/// Policy values read by the registry and by every strategy family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyPolicy {
    pub fitness_floor: f64,
    pub fallback_fitness: f64,
    pub hysteresis_margin: f64,
    /// Added to the active control's priority for control-driven strategies.
    pub control_fitness_base: f64,
    pub absolute_move_fitness: f64,
    pub reorder_fitness: f64,
    /// Scaled by reorder progress (0..=1) and added to `reorder_fitness`.
    pub reorder_progress_bonus: f64,
    pub reparent_fitness: f64,
}

impl Default for StrategyPolicy {
    fn default() -> Self {
        Self {
            fitness_floor: DEFAULT_FITNESS_FLOOR,
            fallback_fitness: DEFAULT_FALLBACK_FITNESS,
            hysteresis_margin: DEFAULT_HYSTERESIS_MARGIN,
            control_fitness_base: DEFAULT_CONTROL_FITNESS_BASE,
            absolute_move_fitness: DEFAULT_ABSOLUTE_MOVE_FITNESS,
            reorder_fitness: DEFAULT_REORDER_FITNESS,
            reorder_progress_bonus: DEFAULT_REORDER_PROGRESS_BONUS,
            reparent_fitness: DEFAULT_REPARENT_FITNESS,
        }
    }
}

impl StrategyPolicy {
    /// Fitness of a strategy that only applies while dragging a specific
    /// control with the given priority.
    #[must_use]
    pub fn control_fitness(&self, priority: i32) -> f64 {
        self.control_fitness_base + f64::from(priority)
    }

    /// Reorder fitness for `progress` in `0..=1`.
    #[must_use]
    pub fn reorder_fitness_for(&self, progress: f64) -> f64 {
        self.reorder_fitness + self.reorder_progress_bonus * progress.clamp(0.0, 1.0)
    }

    /// Whether `fitness` makes a real candidate.
    #[must_use]
    pub fn is_candidate(&self, fitness: f64) -> bool {
        fitness.is_finite() && fitness > self.fitness_floor
    }
}
