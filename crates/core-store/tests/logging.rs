//! Rejected mutations must be observable in the log stream, since callers
//! only see a silent no-op.

use std::fmt;
use std::sync::{Arc, Mutex};

use core_grid::{WidgetPlacement, WidgetSize};
use core_store::{MemoryStorage, WidgetConfigStore};
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

#[derive(Clone, Debug)]
struct CapturedEvent {
    target: String,
    fields: Vec<(String, String)>,
}

#[derive(Default)]
struct FieldCollector {
    fields: Vec<(String, String)>,
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.fields
            .push((field.name().to_string(), format!("{value:?}")));
    }
}

impl<S> Layer<S> for Capture
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        self.events.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            fields: collector.fields,
        });
    }
}

#[tokio::test]
async fn rejected_resize_logs_a_layout_warning() {
    let capture = Capture::default();
    let events = capture.events.clone();
    let subscriber = Registry::default().with(capture);
    let _guard = tracing::subscriber::set_default(subscriber);

    let store = WidgetConfigStore::new(Arc::new(MemoryStorage::new()));
    store
        .reorder(vec![
            WidgetPlacement::new("sleep", true, WidgetSize::Medium, 0),
            WidgetPlacement::new("hrv", true, WidgetSize::Small, 2),
        ])
        .await
        .unwrap();
    store.change_size("hrv", WidgetSize::Medium).await.unwrap();

    let events = events.lock().unwrap();
    let rejection = events
        .iter()
        .find(|e| {
            e.target == "store.layout"
                && e.fields
                    .iter()
                    .any(|(_, v)| v.contains("resize_rejected"))
        })
        .expect("missing store.layout rejection event");
    assert!(
        rejection
            .fields
            .iter()
            .any(|(name, value)| name == "widget" && value.contains("hrv")),
        "rejection event missing widget field: {rejection:?}"
    );
}
