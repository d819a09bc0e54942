#![forbid(unsafe_code)]

//! Strategy registry and fitness ranking.
//!
//! On every interaction update the registry asks each registered factory to
//! materialize or decline, ranks the candidates, and picks the current one.
//!
//! # Ranking
//!
//! 1. Candidates at or below the fitness floor are discarded. The fallback
//!    is exempt so that some strategy is always current.
//! 2. Candidates are stable-sorted by descending fitness; ties keep
//!    registration order.
//! 3. The fallback is removed whenever any other candidate exists.
//! 4. The current strategy is the user-preferred one when present; else the
//!    previously current one when still present and no rival beats it by
//!    more than the hysteresis margin; else the head of the list.
//!
//! # Invariants
//!
//! - Ranking is a pure function of its inputs.
//! - At most one strategy is current.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::interaction::{InteractionSession, StrategyLifecycle};
use crate::strategy::{
    CanvasStrategy, ControlVisibility, ControlWithProps, CustomStrategyState,
    InteractionCanvasState, StrategyApplicationResult, StrategyFactory, StrategyId,
};
use crate::strategies::default_strategy_factories;

/// Diagnostic view of one ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub id: StrategyId,
    pub name: String,
    pub fitness: f64,
}

/// Candidates of one update, sorted, with the current one selected.
#[derive(Debug)]
pub struct RankedStrategies<'a> {
    strategies: Vec<CanvasStrategy<'a>>,
    current: Option<usize>,
}

impl<'a> RankedStrategies<'a> {
    /// Sorted applicable strategies.
    #[must_use]
    pub fn strategies(&self) -> &[CanvasStrategy<'a>] {
        &self.strategies
    }

    #[must_use]
    pub fn summaries(&self) -> Vec<StrategySummary> {
        self.strategies
            .iter()
            .map(|strategy| StrategySummary {
                id: strategy.id.clone(),
                name: strategy.name.to_string(),
                fitness: strategy.fitness,
            })
            .collect()
    }

    #[must_use]
    pub fn current(&self) -> Option<&CanvasStrategy<'a>> {
        self.current.and_then(|index| self.strategies.get(index))
    }

    #[must_use]
    pub fn current_id(&self) -> Option<&StrategyId> {
        self.current().map(|strategy| &strategy.id)
    }

    #[must_use]
    pub fn contains(&self, id: &StrategyId) -> bool {
        self.strategies.iter().any(|strategy| strategy.id == *id)
    }

    /// Apply the current strategy; empty when there is none.
    #[must_use]
    pub fn apply_current(&self, lifecycle: StrategyLifecycle) -> StrategyApplicationResult {
        self.current()
            .map_or_else(StrategyApplicationResult::empty, |strategy| {
                strategy.apply(lifecycle)
            })
    }

    /// Always-visible controls of every candidate plus the active-only
    /// controls of the current strategy, deduplicated by key.
    #[must_use]
    pub fn controls_to_render(&self) -> Vec<ControlWithProps> {
        let mut controls: Vec<ControlWithProps> = Vec::new();
        for (index, strategy) in self.strategies.iter().enumerate() {
            let is_current = self.current == Some(index);
            for control in &strategy.controls_to_render {
                let visible = match control.show {
                    ControlVisibility::AlwaysVisible => true,
                    ControlVisibility::VisibleOnlyWhileActive => is_current,
                };
                if visible && !controls.iter().any(|existing| existing.key == control.key) {
                    controls.push(control.clone());
                }
            }
        }
        controls
    }
}

/// Ordered list of strategy factories.
pub struct StrategyRegistry {
    factories: Vec<Box<dyn StrategyFactory>>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.factories.iter().map(|factory| factory.name()))
            .finish()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_factories(default_strategy_factories())
    }
}

impl StrategyRegistry {
    /// Registry without any factories.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_factories(factories: Vec<Box<dyn StrategyFactory>>) -> Self {
        Self { factories }
    }

    /// Append a factory; it loses fitness ties to every earlier one.
    pub fn register(&mut self, factory: Box<dyn StrategyFactory>) {
        self.factories.push(factory);
    }

    #[must_use]
    pub fn factory_names(&self) -> Vec<&str> {
        self.factories.iter().map(|factory| factory.name()).collect()
    }

    /// Materialize, rank, and select the current strategy.
    pub fn rank<'a>(
        &'a self,
        canvas: InteractionCanvasState<'a>,
        session: &'a InteractionSession,
        custom_state: &'a CustomStrategyState,
        previous_current: Option<&StrategyId>,
    ) -> RankedStrategies<'a> {
        let policy = canvas.policy;
        let mut candidates: Vec<(bool, CanvasStrategy<'a>)> = Vec::new();
        for factory in &self.factories {
            let is_fallback = factory.is_fallback();
            match factory.materialize(canvas, session, custom_state) {
                Some(strategy) if is_fallback || policy.is_candidate(strategy.fitness) => {
                    candidates.push((is_fallback, strategy));
                }
                Some(strategy) => {
                    trace!(
                        target: "gesso.strategy",
                        factory = factory.name(),
                        fitness = strategy.fitness,
                        "strategy below fitness floor"
                    );
                }
                None => {
                    trace!(target: "gesso.strategy", factory = factory.name(), "strategy declined");
                }
            }
        }

        // Stable: equal fitness keeps registration order.
        candidates.sort_by(|(_, a), (_, b)| b.fitness.total_cmp(&a.fitness));

        if candidates.iter().any(|(is_fallback, _)| !is_fallback) {
            candidates.retain(|(is_fallback, _)| !is_fallback);
        }
        let strategies: Vec<CanvasStrategy<'a>> =
            candidates.into_iter().map(|(_, strategy)| strategy).collect();

        let current = select_current(
            &strategies,
            session.user_preferred_strategy.as_ref(),
            previous_current,
            policy.hysteresis_margin,
        );

        let ranked = RankedStrategies {
            strategies,
            current,
        };
        let current_id = ranked.current_id();
        if current_id != previous_current {
            debug!(
                target: "gesso.strategy",
                from = previous_current.map(StrategyId::as_str),
                to = current_id.map(StrategyId::as_str),
                "current strategy changed"
            );
        }
        debug!(
            target: "gesso.strategy",
            candidates = ranked.strategies.len(),
            current = current_id.map(StrategyId::as_str),
            "strategies ranked"
        );
        ranked
    }
}

fn select_current(
    strategies: &[CanvasStrategy<'_>],
    preferred: Option<&StrategyId>,
    previous: Option<&StrategyId>,
    hysteresis_margin: f64,
) -> Option<usize> {
    let head = strategies.first()?;
    let position_of = |id: &StrategyId| strategies.iter().position(|strategy| strategy.id == *id);

    if let Some(index) = preferred.and_then(position_of) {
        return Some(index);
    }
    if let Some(index) = previous.and_then(position_of) {
        let kept = &strategies[index];
        if head.fitness - kept.fitness <= hysteresis_margin {
            return Some(index);
        }
    }
    Some(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::ActiveControl;
    use crate::policy::StrategyPolicy;
    use crate::services::NoReparent;
    use crate::strategy::{CanvasControl, StrategyControls};
    use gesso_core::{CanvasPoint, CanvasVector, ElementPath, Modifiers};
    use gesso_layout::LayoutMetadataMap;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    /// Factory with fixed fitness, or declining when `fitness` is `None`.
    struct Fixed {
        id: &'static str,
        fitness: Option<f64>,
        fallback: bool,
        control: Option<(&'static str, ControlVisibility)>,
    }

    fn fixed(id: &'static str, fitness: Option<f64>) -> Box<dyn StrategyFactory> {
        Box::new(Fixed {
            id,
            fitness,
            fallback: false,
            control: None,
        })
    }

    fn fallback() -> Box<dyn StrategyFactory> {
        Box::new(Fixed {
            id: "DO_NOTHING",
            fitness: Some(0.1),
            fallback: true,
            control: None,
        })
    }

    impl StrategyFactory for Fixed {
        fn name(&self) -> &str {
            self.id
        }

        fn is_fallback(&self) -> bool {
            self.fallback
        }

        fn materialize<'a>(
            &self,
            _canvas: InteractionCanvasState<'a>,
            _session: &'a InteractionSession,
            _custom_state: &'a CustomStrategyState,
        ) -> Option<CanvasStrategy<'a>> {
            let fitness = self.fitness?;
            let mut controls = StrategyControls::new();
            if let Some((key, show)) = self.control {
                controls.push(ControlWithProps::new(
                    CanvasControl::ZeroSizedElementControls,
                    key,
                    show,
                ));
            }
            Some(CanvasStrategy::new(
                StrategyId::from_static(self.id),
                self.id,
                fitness,
                controls,
                |_| StrategyApplicationResult::empty(),
            ))
        }
    }

    struct Fixture {
        metadata: LayoutMetadataMap,
        selected: Vec<ElementPath>,
        policy: StrategyPolicy,
        session: InteractionSession,
        custom: CustomStrategyState,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                metadata: LayoutMetadataMap::new(),
                selected: Vec::new(),
                policy: StrategyPolicy::default(),
                session: InteractionSession::drag(
                    CanvasPoint::new(0.0, 0.0),
                    CanvasVector::new(10.0, 10.0),
                    Modifiers::NONE,
                    ActiveControl::BoundingArea,
                ),
                custom: CustomStrategyState::default(),
            }
        }

        fn canvas(&self) -> InteractionCanvasState<'_> {
            InteractionCanvasState {
                starting_metadata: &self.metadata,
                selected: &self.selected,
                reparent_service: &NoReparent,
                policy: &self.policy,
            }
        }
    }

    fn ids(ranked: &RankedStrategies<'_>) -> Vec<String> {
        ranked
            .strategies()
            .iter()
            .map(|s| s.id.to_string())
            .collect()
    }

    #[test]
    fn fallback_is_sole_entry_when_nothing_applies() {
        let registry = StrategyRegistry::with_factories(vec![fixed("A", None), fallback()]);
        let fx = Fixture::new();
        let ranked = registry.rank(fx.canvas(), &fx.session, &fx.custom, None);
        assert_eq!(ids(&ranked), vec!["DO_NOTHING"]);
        assert_eq!(ranked.current_id().map(StrategyId::as_str), Some("DO_NOTHING"));
    }

    #[test]
    fn fallback_removed_when_real_candidate_exists() {
        let registry = StrategyRegistry::with_factories(vec![fixed("A", Some(0.05)), fallback()]);
        let fx = Fixture::new();
        let ranked = registry.rank(fx.canvas(), &fx.session, &fx.custom, None);
        assert_eq!(ids(&ranked), vec!["A"]);
    }

    #[test]
    fn ties_keep_registration_order() {
        let registry = StrategyRegistry::with_factories(vec![
            fixed("A", Some(1.0)),
            fixed("B", Some(2.0)),
            fixed("C", Some(1.0)),
            fallback(),
        ]);
        let fx = Fixture::new();
        let ranked = registry.rank(fx.canvas(), &fx.session, &fx.custom, None);
        assert_eq!(ids(&ranked), vec!["B", "A", "C"]);
    }

    #[test]
    fn zero_fitness_is_not_a_candidate() {
        let registry = StrategyRegistry::with_factories(vec![fixed("A", Some(0.0)), fallback()]);
        let fx = Fixture::new();
        let ranked = registry.rank(fx.canvas(), &fx.session, &fx.custom, None);
        assert_eq!(ids(&ranked), vec!["DO_NOTHING"]);
    }

    #[test]
    fn previous_current_survives_within_margin() {
        let registry = StrategyRegistry::with_factories(vec![
            fixed("A", Some(1.05)),
            fixed("B", Some(1.0)),
        ]);
        let fx = Fixture::new();
        let previous = StrategyId::from_static("B");
        let ranked = registry.rank(fx.canvas(), &fx.session, &fx.custom, Some(&previous));
        assert_eq!(ranked.current_id(), Some(&previous));
    }

    #[test]
    fn previous_current_loses_beyond_margin() {
        let registry = StrategyRegistry::with_factories(vec![
            fixed("A", Some(1.5)),
            fixed("B", Some(1.0)),
        ]);
        let fx = Fixture::new();
        let previous = StrategyId::from_static("B");
        let ranked = registry.rank(fx.canvas(), &fx.session, &fx.custom, Some(&previous));
        assert_eq!(ranked.current_id().map(StrategyId::as_str), Some("A"));
    }

    #[test]
    fn user_preference_wins_when_applicable() {
        let registry = StrategyRegistry::with_factories(vec![
            fixed("A", Some(3.0)),
            fixed("B", Some(1.0)),
        ]);
        let mut fx = Fixture::new();
        fx.session = fx
            .session
            .clone()
            .with_preferred_strategy(StrategyId::from_static("B"));
        let ranked = registry.rank(fx.canvas(), &fx.session, &fx.custom, None);
        assert_eq!(ranked.current_id().map(StrategyId::as_str), Some("B"));
        drop(ranked);

        fx.session.user_preferred_strategy = Some(StrategyId::from_static("Z"));
        let ranked = registry.rank(fx.canvas(), &fx.session, &fx.custom, None);
        assert_eq!(ranked.current_id().map(StrategyId::as_str), Some("A"));
    }

    #[test]
    fn active_only_controls_follow_current() {
        let registry = StrategyRegistry::with_factories(vec![
            Box::new(Fixed {
                id: "A",
                fitness: Some(2.0),
                fallback: false,
                control: Some(("shared", ControlVisibility::VisibleOnlyWhileActive)),
            }),
            Box::new(Fixed {
                id: "B",
                fitness: Some(1.0),
                fallback: false,
                control: Some(("b-only", ControlVisibility::VisibleOnlyWhileActive)),
            }),
            Box::new(Fixed {
                id: "C",
                fitness: Some(0.5),
                fallback: false,
                control: Some(("shared", ControlVisibility::AlwaysVisible)),
            }),
        ]);
        let fx = Fixture::new();
        let ranked = registry.rank(fx.canvas(), &fx.session, &fx.custom, None);
        let keys: Vec<String> = ranked
            .controls_to_render()
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, vec!["shared"]);
    }

    #[test]
    fn empty_registry_has_no_current() {
        let registry = StrategyRegistry::empty();
        let fx = Fixture::new();
        let ranked = registry.rank(fx.canvas(), &fx.session, &fx.custom, None);
        assert!(ranked.current().is_none());
        assert_eq!(
            ranked.apply_current(StrategyLifecycle::MidInteraction),
            StrategyApplicationResult::empty()
        );
    }

    #[derive(Default, Clone)]
    struct EventCapture {
        messages: Arc<Mutex<Vec<(String, String)>>>,
    }

    struct MessageVisitor<'a>(&'a mut String);

    impl tracing::field::Visit for MessageVisitor<'_> {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                *self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut message = String::new();
            event.record(&mut MessageVisitor(&mut message));
            self.messages
                .lock()
                .expect("capture lock")
                .push((event.metadata().target().to_string(), message));
        }
    }

    #[test]
    fn ranking_logs_switches_on_strategy_target() {
        let capture = EventCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let registry = StrategyRegistry::with_factories(vec![fixed("A", Some(1.0)), fallback()]);
        let fx = Fixture::new();
        tracing::subscriber::with_default(subscriber, || {
            let _ = registry.rank(fx.canvas(), &fx.session, &fx.custom, None);
        });
        let messages = capture.messages.lock().expect("capture lock").clone();
        assert!(messages.contains(&(
            "gesso.strategy".to_string(),
            "current strategy changed".to_string()
        )));
        assert!(messages.contains(&("gesso.strategy".to_string(), "strategies ranked".to_string())));
    }
}
