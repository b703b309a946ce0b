use async_trait::async_trait;
use owo_colors::{OwoColorize, Style};
use serde_json::Value;
use std::time::Duration;
use stride_core::error::DeliveryError;
use stride_core::notify::NotificationSink;

/// Prints notifications to stdout instead of a platform notification centre.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

#[async_trait]
impl NotificationSink for ConsoleSink {
    async fn schedule(
        &self,
        title: &str,
        body: &str,
        data: Value,
        delay: Option<Duration>,
    ) -> Result<String, DeliveryError> {
        let id = format!("console-{}", chrono::Utc::now().timestamp_millis());
        let title_style = Style::new().bright_white().bold();
        println!("{} {}", "🔔".style(title_style), title.style(title_style));
        println!("   {}", body);
        if let Some(delay) = delay {
            println!("   {} in {} min", "→".blue(), delay.as_secs() / 60);
        }
        tracing::debug!(%id, %data, "notification printed");
        Ok(id)
    }
}
