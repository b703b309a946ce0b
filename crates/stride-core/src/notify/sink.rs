use crate::error::DeliveryError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Delivery side of notifications. Fire-and-forget: callers log failures
/// and carry on.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Schedules a notification `delay` from now, or immediately for `None`.
    /// Returns the delivery id.
    async fn schedule(
        &self,
        title: &str,
        body: &str,
        data: Value,
        delay: Option<Duration>,
    ) -> Result<String, DeliveryError>;
}

/// Emits notifications as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn schedule(
        &self,
        title: &str,
        body: &str,
        data: Value,
        delay: Option<Duration>,
    ) -> Result<String, DeliveryError> {
        let id = Uuid::now_v7().to_string();
        tracing::info!(
            target: "stride::notify",
            %id,
            title,
            body,
            %data,
            ?delay,
            "notification scheduled"
        );
        Ok(id)
    }
}
