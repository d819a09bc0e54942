#![forbid(unsafe_code)]

//! Structured log output of the engine loop.
//!
//! Verifies that per-update events are emitted inside the `engine.update`
//! span, on the `gesso.engine` and `gesso.strategy` targets, and that a
//! rejected flush is logged at WARN.
//!
//! Run:
//!   cargo test -p gesso-harness --test engine_logging

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gesso_core::{CanvasRect, ElementPath};
use gesso_harness::{DocumentTree, EngineHarness, EventScript, MemoryDocument, SceneBuilder};
use gesso_layout::{FlexDirection, PropertyBag};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Capture layer
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    message: String,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let message = visitor
            .0
            .iter()
            .find(|(k, _)| k == "message")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message,
            fields: visitor.0.into_iter().collect(),
            parent_span_name,
        });
    }
}

fn with_captured_events<F>(f: F) -> Vec<CapturedEvent>
where
    F: FnOnce(),
{
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn path(s: &str) -> ElementPath {
    s.parse().expect("valid path")
}

fn flex_row_harness() -> EngineHarness {
    let scene = SceneBuilder::new()
        .flex(
            "root",
            CanvasRect::new(0.0, 0.0, 300.0, 100.0),
            FlexDirection::Row,
        )
        .element("root/a", CanvasRect::new(0.0, 0.0, 100.0, 100.0))
        .element("root/b", CanvasRect::new(100.0, 0.0, 100.0, 100.0))
        .select("root/a")
        .build()
        .expect("scene");
    EngineHarness::with_defaults(&scene)
}

fn drag_script() -> EventScript {
    EventScript::new()
        .down(50.0, 50.0)
        .move_to(180.0, 50.0)
        .up(180.0, 50.0)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn engine_events_are_scoped_to_update_span() {
    let mut harness = flex_row_harness();
    let events = with_captured_events(|| {
        harness.run(drag_script().events()).expect("run");
    });

    let engine_events: Vec<_> = events
        .iter()
        .filter(|event| event.target == "gesso.engine")
        .collect();
    assert!(!engine_events.is_empty());
    assert!(
        engine_events
            .iter()
            .all(|event| event.parent_span_name.as_deref() == Some("engine.update"))
    );
    assert!(
        engine_events
            .iter()
            .any(|event| event.message == "interaction committed")
    );

    let transitions: Vec<_> = engine_events
        .iter()
        .filter(|event| event.message == "transition")
        .map(|event| event.fields.get("effect").cloned().unwrap_or_default())
        .collect();
    assert_eq!(transitions, ["armed", "drag_started", "committed"]);
}

#[test]
fn ranking_logs_current_strategy() {
    let mut harness = flex_row_harness();
    let events = with_captured_events(|| {
        harness.run(drag_script().events()).expect("run");
    });

    let changed = events
        .iter()
        .find(|event| {
            event.target == "gesso.strategy" && event.message == "current strategy changed"
        })
        .expect("current strategy logged");
    assert_eq!(changed.level, tracing::Level::DEBUG);
    assert_eq!(changed.fields.get("to").map(String::as_str), Some("FLEX_REORDER"));
    assert!(!changed.fields.contains_key("from"));

    assert!(
        events
            .iter()
            .any(|event| event.target == "gesso.strategy" && event.level == tracing::Level::TRACE)
    );
}

#[test]
fn rejected_flush_is_logged_at_warn() {
    let scene = SceneBuilder::new()
        .flex(
            "root",
            CanvasRect::new(0.0, 0.0, 300.0, 100.0),
            FlexDirection::Row,
        )
        .element("root/a", CanvasRect::new(0.0, 0.0, 100.0, 100.0))
        .element("root/b", CanvasRect::new(100.0, 0.0, 100.0, 100.0))
        .select("root/a")
        .build()
        .expect("scene");
    let mut tree = DocumentTree::new();
    tree.insert(path("root"), PropertyBag::new());
    let mut harness = EngineHarness::with_defaults(&scene)
        .with_document(MemoryDocument::new(tree, vec![path("root/a")]));

    let events = with_captured_events(|| {
        let result = harness.run(drag_script().events());
        assert!(result.is_err());
    });

    let warning = events
        .iter()
        .find(|event| event.level == tracing::Level::WARN)
        .expect("warning emitted");
    assert_eq!(warning.target, "gesso.engine");
    assert_eq!(warning.message, "document store rejected flush");
    assert_eq!(warning.fields.get("phase").map(String::as_str), Some("Transient"));
    assert!(
        warning
            .fields
            .get("error")
            .is_some_and(|error| error.contains("root/a"))
    );
}
