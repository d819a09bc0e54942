//! [`DoNothing`] fallback: always applicable, never edits.

use crate::interaction::InteractionSession;
use crate::strategy::{
    CanvasStrategy, CustomStrategyState, InteractionCanvasState, StrategyApplicationResult,
    StrategyControls, StrategyFactory, ids,
};

/// Keeps some strategy current when no structural edit fits the gesture.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoNothing;

impl StrategyFactory for DoNothing {
    fn name(&self) -> &str {
        "DoNothing"
    }

    fn is_fallback(&self) -> bool {
        true
    }

    fn materialize<'a>(
        &self,
        canvas: InteractionCanvasState<'a>,
        _session: &'a InteractionSession,
        _custom_state: &'a CustomStrategyState,
    ) -> Option<CanvasStrategy<'a>> {
        Some(CanvasStrategy::new(
            ids::DO_NOTHING,
            "Do Nothing",
            canvas.policy.fallback_fitness,
            StrategyControls::new(),
            |_| StrategyApplicationResult::empty(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{ActiveControl, StrategyLifecycle};
    use crate::strategies::test_support::{Scene, drag};

    #[test]
    fn always_materializes_with_fallback_fitness() {
        let scene = Scene::new(Vec::new(), &[]);
        let session = drag((0.0, 0.0), (5.0, 5.0), ActiveControl::BoundingArea);
        let strategy = DoNothing
            .materialize(scene.canvas(), &session, &scene.custom)
            .expect("fallback always applies");
        assert_eq!(strategy.id, ids::DO_NOTHING);
        assert_eq!(strategy.fitness, scene.policy.fallback_fitness);
        assert_eq!(
            strategy.apply(StrategyLifecycle::EndInteraction),
            StrategyApplicationResult::empty()
        );
    }

    #[test]
    fn name_is_stable() {
        assert_eq!(DoNothing.name(), "DoNothing");
        assert!(DoNothing.is_fallback());
    }
}
