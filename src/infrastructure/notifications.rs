use crate::domain::events::DomainEvent;
use crate::domain::ports::NotificationSink;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

/// Sink that logs each notification as a structured log line. Used by the
/// demo binary where no real message broker is wired.
#[derive(Default)]
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        info!(kind = event.kind(), payload = ?event, "notification");
        Ok(())
    }
}

/// Sink that records every notification for later inspection in tests.
#[derive(Default)]
pub struct RecordingNotificationSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events.lock().expect("event log poisoned"))
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .expect("event log poisoned")
            .iter()
            .map(DomainEvent::kind)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        self.events.lock().expect("event log poisoned").push(event);
        Ok(())
    }
}
