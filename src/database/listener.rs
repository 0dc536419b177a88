//! PostgreSQL change listener
//!
//! Row triggers call `pg_notify` with a JSON `{table, kind, record}` payload.
//! This listener decodes the payloads and republishes them on a [`ChangeFeed`].

use futures::StreamExt;
use sqlx::postgres::PgListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::database::DatabasePool;
use crate::services::realtime::{ChangeEvent, ChangeFeed};
use crate::utils::errors::Result;

/// Start forwarding notifications from `channel` into `feed`
pub async fn spawn_change_listener(pool: &DatabasePool, channel: &str, feed: ChangeFeed) -> Result<JoinHandle<()>> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(channel).await?;
    info!(channel = channel, "Listening for group buy changes");

    let channel = channel.to_string();
    Ok(tokio::spawn(async move {
        let mut notifications = listener.into_stream();

        while let Some(notification) = notifications.next().await {
            match notification {
                Ok(notification) => match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                    Ok(event) => {
                        debug!(table = %event.table, kind = ?event.kind, "Change notification received");
                        feed.publish(event);
                    }
                    Err(e) => warn!(channel = %channel, error = %e, "Ignoring malformed change notification"),
                },
                // The listener reconnects on its own; notifications sent while
                // disconnected are lost.
                Err(e) => error!(channel = %channel, error = %e, "Change listener error"),
            }
        }

        info!(channel = %channel, "Change listener stopped");
    }))
}
