#![forbid(unsafe_code)]

//! Drive an [`InteractionEngine`] against a fixture.
//!
//! [`EventScript`] numbers events in order; [`EngineHarness`] owns the
//! engine, a [`MemoryDocument`] and a [`TreeReparentService`] and feeds
//! events through one [`EngineContext`] per call.

use std::sync::Arc;

use gesso_core::{CanvasPoint, CanvasVector, Modifiers};
use gesso_layout::LayoutMetadataMap;
use gesso_runtime::{
    CancelReason, EngineContext, EngineError, EngineUpdate, InteractionEngine,
    InteractionInputEvent, InteractionInputEventKind,
};
use gesso_strategies::ActiveControl;

use crate::document::MemoryDocument;
use crate::reparent::TreeReparentService;
use crate::scene::Scene;

/// Builder for a numbered event sequence starting at 1.
#[derive(Debug, Clone, Default)]
pub struct EventScript {
    events: Vec<InteractionInputEvent>,
}

impl EventScript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn push(mut self, kind: InteractionInputEventKind) -> Self {
        let sequence = self.events.len() as u64 + 1;
        self.events.push(InteractionInputEvent::new(sequence, kind));
        self
    }

    /// Pointer down on the selection's bounding area.
    #[must_use]
    pub fn down(self, x: f64, y: f64) -> Self {
        self.down_on(x, y, ActiveControl::BoundingArea, Modifiers::NONE)
    }

    #[must_use]
    pub fn down_on(self, x: f64, y: f64, control: ActiveControl, modifiers: Modifiers) -> Self {
        self.push(InteractionInputEventKind::PointerDown {
            position: CanvasPoint::new(x, y),
            modifiers,
            control,
        })
    }

    #[must_use]
    pub fn move_to(self, x: f64, y: f64) -> Self {
        self.push(InteractionInputEventKind::PointerMove {
            position: CanvasPoint::new(x, y),
        })
    }

    #[must_use]
    pub fn up(self, x: f64, y: f64) -> Self {
        self.push(InteractionInputEventKind::PointerUp {
            position: CanvasPoint::new(x, y),
        })
    }

    #[must_use]
    pub fn modifiers(self, modifiers: Modifiers) -> Self {
        self.push(InteractionInputEventKind::ModifiersChanged { modifiers })
    }

    #[must_use]
    pub fn escape(self) -> Self {
        self.push(InteractionInputEventKind::Cancel {
            reason: CancelReason::EscapeKey,
        })
    }

    #[must_use]
    pub fn nudge(self, x: f64, y: f64) -> Self {
        self.push(InteractionInputEventKind::KeyboardNudge {
            direction: CanvasVector::new(x, y),
            modifiers: Modifiers::NONE,
        })
    }

    #[must_use]
    pub fn events(&self) -> &[InteractionInputEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<InteractionInputEvent> {
        self.events
    }
}

/// Engine plus the collaborators it edits.
#[derive(Debug)]
pub struct EngineHarness {
    engine: InteractionEngine,
    metadata: Arc<LayoutMetadataMap>,
    document: MemoryDocument,
    service: TreeReparentService,
}

impl EngineHarness {
    #[must_use]
    pub fn new(scene: &Scene, engine: InteractionEngine) -> Self {
        Self {
            engine,
            metadata: Arc::clone(&scene.metadata),
            document: scene.document(),
            service: scene.reparent_service(),
        }
    }

    /// Harness around an engine with the default families and policy.
    #[must_use]
    pub fn with_defaults(scene: &Scene) -> Self {
        Self::new(scene, InteractionEngine::default())
    }

    #[must_use]
    pub fn with_document(mut self, document: MemoryDocument) -> Self {
        self.document = document;
        self
    }

    pub fn handle(&mut self, event: &InteractionInputEvent) -> Result<EngineUpdate, EngineError> {
        let mut ctx = EngineContext {
            metadata: &self.metadata,
            document: &mut self.document,
            reparent_service: &self.service,
        };
        self.engine.handle_event(event, &mut ctx)
    }

    /// Feed every event in order, stopping at the first error.
    pub fn run(
        &mut self,
        events: &[InteractionInputEvent],
    ) -> Result<Vec<EngineUpdate>, EngineError> {
        events.iter().map(|event| self.handle(event)).collect()
    }

    pub fn force_cancel(&mut self) -> Option<EngineUpdate> {
        let mut ctx = EngineContext {
            metadata: &self.metadata,
            document: &mut self.document,
            reparent_service: &self.service,
        };
        self.engine.force_cancel(&mut ctx)
    }

    /// Publish a new layout snapshot, as after a re-render.
    pub fn publish(&mut self, metadata: Arc<LayoutMetadataMap>) {
        self.service.set_metadata(Arc::clone(&metadata));
        self.metadata = metadata;
    }

    #[must_use]
    pub fn engine(&self) -> &InteractionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut InteractionEngine {
        &mut self.engine
    }

    #[must_use]
    pub fn document(&self) -> &MemoryDocument {
        &self.document
    }

    #[must_use]
    pub fn into_document(self) -> MemoryDocument {
        self.document
    }
}
