//! Property invariants for the interaction lifecycle machine.
//!
//! Random event streams are fed to the machine; every transition must be
//! well-formed, replay must be deterministic, and the machine must never
//! leave the three documented states.

use gesso_core::{CanvasPoint, CanvasVector, Modifiers};
use gesso_runtime::{
    CancelReason, InteractionEffect, InteractionInputEvent, InteractionInputEventKind,
    InteractionMachine, InteractionState, InteractionTransition,
};
use gesso_strategies::ActiveControl;
use proptest::prelude::*;

fn point() -> impl Strategy<Value = CanvasPoint> {
    (-500.0f64..500.0, -500.0f64..500.0).prop_map(|(x, y)| CanvasPoint::new(x, y))
}

fn event_kind() -> impl Strategy<Value = InteractionInputEventKind> {
    prop_oneof![
        1 => point().prop_map(|position| InteractionInputEventKind::PointerDown {
            position,
            modifiers: Modifiers::NONE,
            control: ActiveControl::BoundingArea,
        }),
        4 => point().prop_map(|position| InteractionInputEventKind::PointerMove { position }),
        1 => point().prop_map(|position| InteractionInputEventKind::PointerUp { position }),
        1 => (0u8..16).prop_map(|bits| InteractionInputEventKind::ModifiersChanged {
            modifiers: Modifiers::from_bits_truncate(bits),
        }),
        1 => Just(InteractionInputEventKind::Cancel {
            reason: CancelReason::EscapeKey
        }),
        1 => Just(InteractionInputEventKind::Blur),
        1 => (-10.0f64..10.0, -10.0f64..10.0).prop_map(|(x, y)| {
            InteractionInputEventKind::KeyboardNudge {
                direction: CanvasVector::new(x, y),
                modifiers: Modifiers::NONE,
            }
        }),
    ]
}

fn run(machine: &mut InteractionMachine, kinds: &[InteractionInputEventKind]) -> Vec<InteractionTransition> {
    kinds
        .iter()
        .enumerate()
        .map(|(index, kind)| {
            let event = InteractionInputEvent::new(index as u64 + 1, kind.clone());
            machine.apply_event(&event).expect("generated events are valid")
        })
        .collect()
}

proptest! {
    #[test]
    fn transitions_are_well_formed(
        kinds in prop::collection::vec(event_kind(), 1..64),
        threshold in 0.5f64..20.0,
        hysteresis in 0.0f64..5.0,
    ) {
        let mut machine =
            InteractionMachine::new_with_hysteresis(threshold, hysteresis).expect("valid");
        let transitions = run(&mut machine, &kinds);

        let mut previous_to = InteractionState::Idle;
        for (index, transition) in transitions.iter().enumerate() {
            prop_assert_eq!(transition.transition_id, index as u64 + 1);
            prop_assert_eq!(transition.sequence, index as u64 + 1);
            prop_assert_eq!(&transition.from, &previous_to);
            if transition.effect.is_noop() {
                // Threshold no-ops may refresh the armed pointer but never
                // change the phase.
                prop_assert_eq!(
                    std::mem::discriminant(&transition.from),
                    std::mem::discriminant(&transition.to)
                );
            }
            match &transition.effect {
                InteractionEffect::Committed { .. } | InteractionEffect::Canceled { .. } => {
                    prop_assert!(!transition.from.is_idle());
                    prop_assert_eq!(&transition.to, &InteractionState::Idle);
                }
                InteractionEffect::DragStarted { total_delta, .. } => {
                    prop_assert!(total_delta.length() > threshold);
                    prop_assert!(transition.to.is_dragging());
                }
                InteractionEffect::KeyboardNudged { .. } => {
                    prop_assert!(transition.from.is_idle());
                    prop_assert!(transition.to.is_idle());
                }
                _ => {}
            }
            previous_to = transition.to.clone();
        }
        prop_assert_eq!(machine.state(), &previous_to);
    }

    #[test]
    fn replay_is_deterministic(kinds in prop::collection::vec(event_kind(), 1..48)) {
        let mut first = InteractionMachine::default();
        let mut second = InteractionMachine::default();
        prop_assert_eq!(run(&mut first, &kinds), run(&mut second, &kinds));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn force_cancel_always_returns_to_idle(kinds in prop::collection::vec(event_kind(), 0..32)) {
        let mut machine = InteractionMachine::default();
        run(&mut machine, &kinds);
        let was_active = machine.is_active();
        let transition = machine.force_cancel();
        prop_assert_eq!(transition.is_some(), was_active);
        prop_assert!(!machine.is_active());
        prop_assert!(machine.force_cancel().is_none());
    }
}
