use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use tracing::{info, warn};

use skillbank_db::Database;
use skillbank_db::models::NotificationRow;
use skillbank_types::notifications::NotificationEnvelope;
use skillbank_types::time::parse_sqlite_timestamp;

/// Rows that failed this many times are left for manual inspection.
pub const MAX_ATTEMPTS: i64 = 5;
const BATCH_SIZE: u32 = 100;

/// Somewhere a notification can be pushed to.
pub trait NotificationSink: Send + Sync {
    fn deliver<'a>(&'a self, envelope: &'a NotificationEnvelope) -> BoxFuture<'a, Result<()>>;
}

/// POSTs each notification as JSON to a fixed URL.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl NotificationSink for WebhookSink {
    fn deliver<'a>(&'a self, envelope: &'a NotificationEnvelope) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.client
                .post(&self.url)
                .json(envelope)
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        })
    }
}

/// Background task that drains the notification outbox.
///
/// Runs on an interval, pushes every undelivered notification that still has
/// attempts left, and records the outcome on the row.
pub async fn run_relay_loop(db: Arc<Database>, sink: Arc<dyn NotificationSink>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match relay_pending(&db, sink.as_ref()).await {
            Ok(count) => {
                if count > 0 {
                    info!("Relay: delivered {} notifications", count);
                }
            }
            Err(e) => {
                warn!("Relay error: {}", e);
            }
        }
    }
}

/// One pass over the outbox. Returns how many notifications were delivered.
pub async fn relay_pending(db: &Database, sink: &dyn NotificationSink) -> Result<usize> {
    let pending = db.undelivered_notifications(MAX_ATTEMPTS, BATCH_SIZE)?;

    let mut delivered = 0;
    for row in &pending {
        let outcome = match envelope(row) {
            Ok(envelope) => sink.deliver(&envelope).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                db.mark_notification_delivered(&row.id)?;
                delivered += 1;
            }
            Err(e) => {
                warn!(
                    "Notification {} delivery failed (attempt {}): {:#}",
                    row.id,
                    row.delivery_attempts + 1,
                    e
                );
                db.record_notification_failure(&row.id, &format!("{e:#}"))?;
            }
        }
    }

    Ok(delivered)
}

fn envelope(row: &NotificationRow) -> Result<NotificationEnvelope> {
    Ok(NotificationEnvelope {
        id: row.id.parse().context("notification id")?,
        user_id: row.user_id.parse().context("notification user id")?,
        kind: row.kind,
        title: row.title.clone(),
        body: row.body.clone(),
        related_id: row.related_id.clone(),
        created_at: parse_sqlite_timestamp(&row.created_at)
            .with_context(|| format!("notification timestamp '{}'", row.created_at))?,
    })
}
