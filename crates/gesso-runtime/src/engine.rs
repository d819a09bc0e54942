#![forbid(unsafe_code)]

//! The per-event engine loop.
//!
//! [`InteractionEngine::handle_event`] feeds one input event through the
//! lifecycle machine and, when the transition affects the session, ranks
//! the registered strategies, applies the current one and flushes its
//! commands to the document store.
//!
//! # Phases
//!
//! | Transition            | Engine action                                             |
//! |-----------------------|-----------------------------------------------------------|
//! | `Armed`               | capture selection and starting snapshot                   |
//! | drag start / update   | rank, apply `MidInteraction`, flush transient patch       |
//! | modifiers while drag  | same as a drag update                                     |
//! | `Committed` (dragged) | rank, apply `EndInteraction`, commit `Always`+`OnComplete` |
//! | `Committed` (click)   | drop the captured interaction                             |
//! | `Canceled`            | discard transient patch, restore selection                |
//! | keyboard nudge        | one-shot rank, apply and commit                           |
//!
//! Every update finishes before the next event is processed; the engine is
//! single-threaded and synchronous.

use std::fmt;
use std::sync::Arc;

use gesso_core::{CanvasPoint, CanvasVector, ElementPath, Modifiers};
use gesso_layout::LayoutMetadataMap;
use gesso_strategies::commands::commands_for_lifecycle;
use gesso_strategies::{
    ActiveControl, Command, ControlWithProps, CustomStrategyState, DragInteractionData,
    InteractionCanvasState, InteractionData, InteractionSession, ReparentService,
    StrategyApplicationResult, StrategyId, StrategyLifecycle, StrategyPolicy, StrategyRegistry,
    StrategySummary,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};

use crate::document::{DocumentStore, DocumentStoreError, FlushPhase, LayoutMetadataProvider};
use crate::machine::{
    InteractionEffect, InteractionInputEvent, InteractionMachine, InteractionMachineError,
    InteractionState, InteractionTransition,
};

/// External collaborators for one call.
pub struct EngineContext<'a> {
    pub metadata: &'a dyn LayoutMetadataProvider,
    pub document: &'a mut dyn DocumentStore,
    pub reparent_service: &'a dyn ReparentService,
}

impl fmt::Debug for EngineContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext").finish_non_exhaustive()
    }
}

/// Result of one [`InteractionEngine::handle_event`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineUpdate {
    pub transition: InteractionTransition,
    /// Applicable strategies, best first.
    pub strategies: Vec<StrategySummary>,
    pub current: Option<StrategyId>,
    /// Commands flushed to the document store by this update.
    pub commands: Vec<Command>,
    pub controls: Vec<ControlWithProps>,
    pub elements_to_rerender: Vec<ElementPath>,
}

impl EngineUpdate {
    fn quiet(transition: InteractionTransition) -> Self {
        Self {
            transition,
            strategies: Vec::new(),
            current: None,
            commands: Vec::new(),
            controls: Vec::new(),
            elements_to_rerender: Vec::new(),
        }
    }
}

/// Engine loop failures.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    Machine(InteractionMachineError),
    Document(DocumentStoreError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Machine(error) => write!(f, "interaction machine error: {error}"),
            Self::Document(error) => write!(f, "document store error: {error}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Machine(error) => Some(error),
            Self::Document(error) => Some(error),
        }
    }
}

impl From<InteractionMachineError> for EngineError {
    fn from(error: InteractionMachineError) -> Self {
        Self::Machine(error)
    }
}

impl From<DocumentStoreError> for EngineError {
    fn from(error: DocumentStoreError) -> Self {
        Self::Document(error)
    }
}

/// State captured for the lifetime of one gesture.
#[derive(Debug)]
struct ActiveInteraction {
    selected: Vec<ElementPath>,
    starting_metadata: Arc<LayoutMetadataMap>,
    custom_state: CustomStrategyState,
    current: Option<StrategyId>,
    prev_drag: Option<CanvasVector>,
    has_transient: bool,
    strategies: Vec<StrategySummary>,
    controls: Vec<ControlWithProps>,
}

impl ActiveInteraction {
    fn capture(ctx: &EngineContext<'_>) -> Self {
        Self {
            selected: ctx.document.current_selection(),
            starting_metadata: ctx.metadata.snapshot(),
            custom_state: CustomStrategyState::default(),
            current: None,
            prev_drag: None,
            has_transient: false,
            strategies: Vec::new(),
            controls: Vec::new(),
        }
    }
}

/// Ranked and applied output of one strategy pass.
struct Evaluation {
    strategies: Vec<StrategySummary>,
    current: Option<StrategyId>,
    controls: Vec<ControlWithProps>,
    result: StrategyApplicationResult,
}

/// Drives the lifecycle machine and the strategy registry.
#[derive(Debug, Default)]
pub struct InteractionEngine {
    machine: InteractionMachine,
    registry: StrategyRegistry,
    policy: StrategyPolicy,
    user_preferred_strategy: Option<StrategyId>,
    interaction: Option<ActiveInteraction>,
}

impl InteractionEngine {
    #[must_use]
    pub fn new(
        machine: InteractionMachine,
        registry: StrategyRegistry,
        policy: StrategyPolicy,
    ) -> Self {
        Self {
            machine,
            registry,
            policy,
            user_preferred_strategy: None,
            interaction: None,
        }
    }

    #[must_use]
    pub const fn machine(&self) -> &InteractionMachine {
        &self.machine
    }

    #[must_use]
    pub const fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn policy(&self) -> &StrategyPolicy {
        &self.policy
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub const fn is_interacting(&self) -> bool {
        self.interaction.is_some()
    }

    /// Custom strategy state of the gesture in progress.
    #[must_use]
    pub fn custom_state(&self) -> Option<&CustomStrategyState> {
        self.interaction.as_ref().map(|active| &active.custom_state)
    }

    /// Strategy that wins whenever it is applicable, for this and later
    /// gestures.
    pub fn set_user_preferred_strategy(&mut self, id: Option<StrategyId>) {
        self.user_preferred_strategy = id;
    }

    /// Process one input event.
    pub fn handle_event(
        &mut self,
        event: &InteractionInputEvent,
        ctx: &mut EngineContext<'_>,
    ) -> Result<EngineUpdate, EngineError> {
        let _span = debug_span!("engine.update", sequence = event.sequence).entered();
        let transition = self.machine.apply_event(event)?;
        debug!(
            target: "gesso.engine",
            transition_id = transition.transition_id,
            effect = transition.effect.kind(),
            "transition"
        );

        match transition.effect {
            InteractionEffect::Armed { .. } => {
                self.interaction = Some(ActiveInteraction::capture(ctx));
                Ok(EngineUpdate::quiet(transition))
            }
            InteractionEffect::DragStarted { .. } | InteractionEffect::DragUpdated { .. } => {
                self.update_drag(transition, ctx)
            }
            InteractionEffect::ModifiersChanged { .. } if transition.to.is_dragging() => {
                self.update_drag(transition, ctx)
            }
            InteractionEffect::Committed {
                end, dragged: true, ..
            } => self.commit(transition, end, ctx),
            InteractionEffect::Committed { dragged: false, .. } => {
                self.interaction = None;
                Ok(EngineUpdate::quiet(transition))
            }
            InteractionEffect::Canceled { .. } => {
                self.cancel(ctx);
                Ok(EngineUpdate::quiet(transition))
            }
            InteractionEffect::KeyboardNudged {
                direction,
                modifiers,
            } => self.nudge(transition, direction, modifiers, ctx),
            InteractionEffect::ModifiersChanged { .. } | InteractionEffect::Noop { .. } => {
                Ok(self.unchanged(transition))
            }
        }
    }

    /// Abandon any gesture in progress, discarding its transient patch.
    pub fn force_cancel(&mut self, ctx: &mut EngineContext<'_>) -> Option<EngineUpdate> {
        let transition = self.machine.force_cancel()?;
        self.cancel(ctx);
        Some(EngineUpdate::quiet(transition))
    }

    fn update_drag(
        &mut self,
        transition: InteractionTransition,
        ctx: &mut EngineContext<'_>,
    ) -> Result<EngineUpdate, EngineError> {
        let Some(interaction) = self.interaction.as_mut() else {
            return Ok(EngineUpdate::quiet(transition));
        };
        let InteractionState::Dragging {
            origin,
            current,
            modifiers,
            control,
            ..
        } = &transition.to
        else {
            return Ok(EngineUpdate::quiet(transition));
        };

        let session = drag_session(
            *origin,
            *current,
            *modifiers,
            control,
            interaction.prev_drag,
            self.user_preferred_strategy.clone(),
        );
        let evaluation = evaluate(
            &self.registry,
            &self.policy,
            interaction,
            ctx.reparent_service,
            &session,
            StrategyLifecycle::MidInteraction,
        );

        let commands =
            commands_for_lifecycle(&evaluation.result.commands, StrategyLifecycle::MidInteraction);
        flush(ctx.document, &commands, FlushPhase::Transient)?;

        // Only a frame the store accepted becomes the gesture's state.
        interaction.has_transient = true;
        interaction.prev_drag = session.drag_data().and_then(|drag| drag.drag);
        interaction.current = evaluation.current.clone();
        interaction
            .custom_state
            .merge(evaluation.result.custom_state_patch.clone());
        interaction.strategies = evaluation.strategies.clone();
        interaction.controls = evaluation.controls.clone();

        Ok(EngineUpdate {
            transition,
            strategies: evaluation.strategies,
            current: evaluation.current,
            commands,
            controls: evaluation.controls,
            elements_to_rerender: evaluation.result.elements_to_rerender,
        })
    }

    fn commit(
        &mut self,
        transition: InteractionTransition,
        end: CanvasPoint,
        ctx: &mut EngineContext<'_>,
    ) -> Result<EngineUpdate, EngineError> {
        let Some(interaction) = self.interaction.take() else {
            return Ok(EngineUpdate::quiet(transition));
        };
        let InteractionState::Dragging {
            origin,
            modifiers,
            control,
            ..
        } = &transition.from
        else {
            return Ok(EngineUpdate::quiet(transition));
        };

        let session = drag_session(
            *origin,
            end,
            *modifiers,
            control,
            interaction.prev_drag,
            self.user_preferred_strategy.clone(),
        );
        let evaluation = evaluate(
            &self.registry,
            &self.policy,
            &interaction,
            ctx.reparent_service,
            &session,
            StrategyLifecycle::EndInteraction,
        );
        let commands =
            commands_for_lifecycle(&evaluation.result.commands, StrategyLifecycle::EndInteraction);

        ctx.document.discard_transient();
        flush(ctx.document, &commands, FlushPhase::Commit)?;
        debug!(
            target: "gesso.engine",
            strategy = evaluation.current.as_ref().map(StrategyId::as_str),
            commands = commands.len(),
            "interaction committed"
        );

        Ok(EngineUpdate {
            transition,
            strategies: evaluation.strategies,
            current: evaluation.current,
            commands,
            controls: Vec::new(),
            elements_to_rerender: evaluation.result.elements_to_rerender,
        })
    }

    fn nudge(
        &mut self,
        transition: InteractionTransition,
        direction: CanvasVector,
        modifiers: Modifiers,
        ctx: &mut EngineContext<'_>,
    ) -> Result<EngineUpdate, EngineError> {
        let interaction = ActiveInteraction::capture(ctx);
        let mut session = InteractionSession::keyboard(direction, modifiers);
        session.user_preferred_strategy = self.user_preferred_strategy.clone();
        let evaluation = evaluate(
            &self.registry,
            &self.policy,
            &interaction,
            ctx.reparent_service,
            &session,
            StrategyLifecycle::EndInteraction,
        );
        let commands =
            commands_for_lifecycle(&evaluation.result.commands, StrategyLifecycle::EndInteraction);
        flush(ctx.document, &commands, FlushPhase::Commit)?;

        Ok(EngineUpdate {
            transition,
            strategies: evaluation.strategies,
            current: evaluation.current,
            commands,
            controls: Vec::new(),
            elements_to_rerender: evaluation.result.elements_to_rerender,
        })
    }

    fn cancel(&mut self, ctx: &mut EngineContext<'_>) {
        let Some(interaction) = self.interaction.take() else {
            return;
        };
        if interaction.has_transient {
            ctx.document.discard_transient();
        }
        ctx.document.set_selection(interaction.selected);
        debug!(target: "gesso.engine", "interaction canceled");
    }

    /// Ignored events keep the last ranking on screen and flush nothing.
    fn unchanged(&self, transition: InteractionTransition) -> EngineUpdate {
        let mut update = EngineUpdate::quiet(transition);
        if let Some(interaction) = &self.interaction {
            update.strategies = interaction.strategies.clone();
            update.current = interaction.current.clone();
            update.controls = interaction.controls.clone();
        }
        update
    }
}

fn drag_session(
    origin: CanvasPoint,
    pointer: CanvasPoint,
    modifiers: Modifiers,
    control: &ActiveControl,
    prev_drag: Option<CanvasVector>,
    preferred: Option<StrategyId>,
) -> InteractionSession {
    InteractionSession {
        interaction_data: InteractionData::Drag(DragInteractionData {
            drag_start: origin,
            drag: Some(pointer.delta_from(origin)),
            prev_drag,
            modifiers,
            has_mouse_moved: true,
        }),
        active_control: control.clone(),
        user_preferred_strategy: preferred,
    }
}

fn evaluate(
    registry: &StrategyRegistry,
    policy: &StrategyPolicy,
    interaction: &ActiveInteraction,
    reparent_service: &dyn ReparentService,
    session: &InteractionSession,
    lifecycle: StrategyLifecycle,
) -> Evaluation {
    let canvas = InteractionCanvasState {
        starting_metadata: &interaction.starting_metadata,
        selected: &interaction.selected,
        reparent_service,
        policy,
    };
    let ranked = registry.rank(
        canvas,
        session,
        &interaction.custom_state,
        interaction.current.as_ref(),
    );
    Evaluation {
        strategies: ranked.summaries(),
        current: ranked.current_id().cloned(),
        controls: ranked.controls_to_render(),
        result: ranked.apply_current(lifecycle),
    }
}

fn flush(
    document: &mut dyn DocumentStore,
    commands: &[Command],
    phase: FlushPhase,
) -> Result<(), EngineError> {
    if phase == FlushPhase::Commit && commands.is_empty() {
        return Ok(());
    }
    document.apply_commands(commands, phase).map_err(|error| {
        warn!(
            target: "gesso.engine",
            %error,
            ?phase,
            commands = commands.len(),
            "document store rejected flush"
        );
        EngineError::Document(error)
    })
}
