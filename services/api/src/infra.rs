use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use principle::upstream::HttpEventPublisher;
use principle::workflows::principle::{EventError, EventPublisher, PrincipleEvent};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Publisher used when no event bus is configured; transitions only reach the log.
#[derive(Debug, Default, Clone)]
pub(crate) struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, event: PrincipleEvent) -> Result<(), EventError> {
        info!(
            topic = %event.topic,
            prospect_id = %event.prospect_id,
            step = %event.step,
            code = %event.code,
            "principle event"
        );
        Ok(())
    }
}

pub(crate) enum EventSink {
    Bus(HttpEventPublisher),
    Log(LoggingEventPublisher),
}

#[async_trait]
impl EventPublisher for EventSink {
    async fn publish(&self, event: PrincipleEvent) -> Result<(), EventError> {
        match self {
            EventSink::Bus(publisher) => publisher.publish(event).await,
            EventSink::Log(publisher) => publisher.publish(event).await,
        }
    }
}
