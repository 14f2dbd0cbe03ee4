#![forbid(unsafe_code)]

//! Tracing integration tests.
//!
//! With instrumentation:
//!   cargo test -p pinfield --features tracing --test tracing_tests
//!
//! Zero-overhead verification (no feature):
//!   cargo test -p pinfield --test tracing_tests -- zero_overhead

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pinfield::{LayoutDirection, PinCodeConfig, PinCodeView};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
    span: Option<String>,
}

/// A tracing Layer that records spans and events.
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct CaptureHandle {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.message).collect()
    }
}

fn capture() -> (Capture, CaptureHandle) {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::new(Mutex::new(Vec::new()));
    let handle = CaptureHandle {
        spans: spans.clone(),
        events: events.clone(),
    };
    (Capture { spans, events }, handle)
}

/// Visitor that extracts fields, splitting out `message`.
struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.remove("message").unwrap_or_default();
        let span = ctx
            .event_span(event)
            .map(|span_ref| span_ref.name().to_string());
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
            span,
        });
    }
}

fn with_captured<F>(f: F) -> CaptureHandle
where
    F: FnOnce(),
{
    let (layer, handle) = capture();
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    handle
}

fn view(config: PinCodeConfig) -> PinCodeView {
    PinCodeView::with_direction(config, LayoutDirection::Ltr).unwrap()
}

// ============================================================================
// Instrumented builds
// ============================================================================

#[test]
#[cfg(feature = "tracing")]
fn tick_opens_span_with_step() {
    let handle = with_captured(|| {
        let mut v = view(PinCodeConfig::default());
        v.tick(Duration::from_millis(16));
    });

    let spans = handle.spans();
    let ticks: Vec<_> = spans
        .iter()
        .filter(|span| span.name == "pin_code_view_tick")
        .collect();
    assert_eq!(ticks.len(), 1);
    assert_eq!(ticks[0].fields.get("dt_us").map(String::as_str), Some("16000"));
}

#[test]
#[cfg(feature = "tracing")]
fn appends_and_rejections_are_logged() {
    let handle = with_captured(|| {
        let mut v = view(PinCodeConfig::new().with_length(1));
        v.propose_insert("1");
        v.propose_insert("2");
    });

    let events = handle.events();
    let appended = events
        .iter()
        .find(|event| event.message == "appended")
        .expect("append event");
    assert_eq!(appended.level, tracing::Level::DEBUG);
    assert_eq!(appended.fields.get("slot").map(String::as_str), Some("0"));

    let rejected = events
        .iter()
        .find(|event| event.message == "insert rejected")
        .expect("rejection event");
    assert_eq!(
        rejected.fields.get("reason").map(String::as_str),
        Some("all slots are filled")
    );
}

#[test]
#[cfg(feature = "tracing")]
fn completion_and_reset_log_at_info() {
    let handle = with_captured(|| {
        let mut v = view(PinCodeConfig::default());
        v.propose_insert("1234");
        v.reset();
    });

    let info: Vec<_> = handle
        .events()
        .into_iter()
        .filter(|event| event.level == tracing::Level::INFO)
        .map(|event| event.message)
        .collect();
    assert_eq!(info, vec!["code complete", "code reset"]);
}

#[test]
#[cfg(feature = "tracing")]
fn stale_reset_is_traced_inside_tick_span() {
    use pinfield::ResetPolicy;

    let handle = with_captured(|| {
        let config = PinCodeConfig::default()
            .with_shake_on_error(false)
            .with_reset_policy(ResetPolicy::AfterError(Duration::from_millis(100)));
        let mut v = view(config);
        v.propose_insert("12");
        v.set_error(true);
        v.set_error(false);
        v.tick(Duration::from_millis(100));
    });

    let stale = handle
        .events()
        .into_iter()
        .find(|event| event.message == "stale reset discarded")
        .expect("stale reset event");
    assert_eq!(stale.level, tracing::Level::TRACE);
    assert_eq!(stale.span.as_deref(), Some("pin_code_view_tick"));
}

// ============================================================================
// Uninstrumented builds
// ============================================================================

/// Without the `tracing` feature the crate emits nothing.
#[test]
#[cfg(not(feature = "tracing"))]
fn zero_overhead_when_disabled() {
    let handle = with_captured(|| {
        let mut v = view(PinCodeConfig::default());
        v.propose_insert("1234");
        v.set_error(true);
        v.tick(Duration::from_millis(600));
        v.reset();
    });

    assert!(handle.spans().is_empty());
    assert!(handle.events().is_empty());
}
