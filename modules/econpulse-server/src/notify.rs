use fcm_client::{FcmClient, FcmError};
use tracing::{info, warn};

use econpulse_pipeline::RunSummary;
use econpulse_store::DeviceStore;

/// Topic every dashboard install subscribes to.
pub const NEWS_TOPIC: &str = "economic_news";

/// Announce a finished collection run to topic subscribers.
pub async fn send_daily_digest(fcm: &FcmClient, summary: &RunSummary) -> Result<(), FcmError> {
    let body = format!(
        "{} new economic news item(s) analyzed for {}",
        summary.analyzed, summary.execution_date
    );

    fcm.send_to_topic(
        NEWS_TOPIC,
        "EconPulse daily briefing",
        &body,
        Some(serde_json::json!({
            "date": summary.execution_date.to_string(),
            "analyzed": summary.analyzed,
        })),
    )
    .await
}

/// Push the digest to individually registered device tokens (installs that
/// have not subscribed to the topic). Dead tokens are deactivated in place;
/// other per-token failures are logged and skipped.
pub async fn push_to_devices(fcm: &FcmClient, devices: &DeviceStore, summary: &RunSummary) {
    let tokens = match devices.list_active().await {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!(error = %e, "Failed to load device tokens for push");
            return;
        }
    };
    if tokens.is_empty() {
        return;
    }

    let body = format!(
        "{} new economic news item(s) analyzed for {}",
        summary.analyzed, summary.execution_date
    );

    let mut sent = 0u32;
    let mut pruned = 0u32;
    for token in &tokens {
        match fcm
            .send_to_token(token, "EconPulse daily briefing", &body, None)
            .await
        {
            Ok(()) => sent += 1,
            Err(FcmError::NotRegistered) => {
                if let Err(e) = devices.deactivate(token).await {
                    warn!(error = %e, "Failed to deactivate dead device token");
                } else {
                    pruned += 1;
                }
            }
            Err(e) => warn!(error = %e, "Device push failed"),
        }
    }

    info!(sent, pruned, total = tokens.len(), "Device push fan-out complete");
}
