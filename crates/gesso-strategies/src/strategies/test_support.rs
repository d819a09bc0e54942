//! Small scene fixtures shared by the family unit tests.

use gesso_core::{CanvasPoint, CanvasRect, CanvasVector, ElementPath, MaybeInfiniteRect, Modifiers};
use gesso_layout::{ElementMetadata, LayoutMetadataMap, LayoutSystem, PositionMode};

use crate::commands::reparent_element;
use crate::commands::WhenToRun;
use crate::interaction::{ActiveControl, InteractionSession};
use crate::policy::StrategyPolicy;
use crate::services::{ReparentOutcome, ReparentService};
use crate::strategy::{CustomStrategyState, InteractionCanvasState};

pub(crate) fn path(s: &str) -> ElementPath {
    s.parse().expect("valid path")
}

pub(crate) fn element(p: &str, index: usize, frame: CanvasRect) -> ElementMetadata {
    let mut meta = ElementMetadata::new(path(p));
    meta.index_in_parent = index;
    meta.global_frame = MaybeInfiniteRect::Finite(frame);
    meta
}

pub(crate) fn container(
    p: &str,
    index: usize,
    frame: CanvasRect,
    layout: LayoutSystem,
) -> ElementMetadata {
    let mut meta = element(p, index, frame);
    meta.accepts_children = true;
    meta.special_size_measurements.layout_system_for_children = Some(layout);
    meta
}

pub(crate) fn positioned(mut meta: ElementMetadata, position: PositionMode) -> ElementMetadata {
    meta.special_size_measurements.position = position;
    meta
}

/// Accepts every move and reports the element appended under its new parent.
#[derive(Debug, Default)]
pub(crate) struct AllowAll;

impl ReparentService for AllowAll {
    fn is_allowed_to_reparent(&self, _target: &ElementPath, _new_parent: &ElementPath) -> bool {
        true
    }

    fn reparent_outcome(
        &self,
        target: &ElementPath,
        new_parent: &ElementPath,
        index: Option<usize>,
    ) -> Option<ReparentOutcome> {
        let uid = target.last_uid()?;
        Some(ReparentOutcome {
            commands: vec![reparent_element(WhenToRun::Always, target, new_parent, index)],
            new_path: new_parent.append(uid),
        })
    }
}

pub(crate) struct Scene {
    pub(crate) metadata: LayoutMetadataMap,
    pub(crate) selected: Vec<ElementPath>,
    pub(crate) policy: StrategyPolicy,
    pub(crate) custom: CustomStrategyState,
    pub(crate) service: AllowAll,
}

impl Scene {
    pub(crate) fn new(elements: Vec<ElementMetadata>, selected: &[&str]) -> Self {
        Self {
            metadata: elements.into_iter().collect(),
            selected: selected.iter().map(|p| path(p)).collect(),
            policy: StrategyPolicy::default(),
            custom: CustomStrategyState::default(),
            service: AllowAll,
        }
    }

    pub(crate) fn canvas(&self) -> InteractionCanvasState<'_> {
        InteractionCanvasState {
            starting_metadata: &self.metadata,
            selected: &self.selected,
            reparent_service: &self.service,
            policy: &self.policy,
        }
    }
}

pub(crate) fn drag(start: (f64, f64), delta: (f64, f64), control: ActiveControl) -> InteractionSession {
    InteractionSession::drag(
        CanvasPoint::new(start.0, start.1),
        CanvasVector::new(delta.0, delta.1),
        Modifiers::NONE,
        control,
    )
}

pub(crate) fn drag_with(
    start: (f64, f64),
    delta: (f64, f64),
    modifiers: Modifiers,
    control: ActiveControl,
) -> InteractionSession {
    InteractionSession::drag(
        CanvasPoint::new(start.0, start.1),
        CanvasVector::new(delta.0, delta.1),
        modifiers,
        control,
    )
}
