use anyhow::Result;
use rusqlite::{Connection, Row};

use super::{clamp_limit, new_id, tag};
use crate::Database;
use crate::models::{NewNotification, NotificationRow};

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, body, related_id, read_at, \
                                    delivered_at, delivery_attempts, last_error, created_at";

impl Database {
    // -- Inbox --

    pub fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE user_id = ?1 AND (?2 = 0 OR read_at IS NULL)
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?3"
            ))?;
            let rows = stmt
                .query_map(
                    rusqlite::params![user_id, unread_only, clamp_limit(limit)],
                    map_notification,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn unread_notification_count(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read_at IS NULL",
                [user_id],
                |row| row.get(0),
            )?)
        })
    }

    /// Returns `false` if the notification does not belong to the user.
    pub fn mark_notification_read(&self, user_id: &str, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE notifications
                 SET read_at = COALESCE(read_at, strftime('%Y-%m-%d %H:%M:%f', 'now'))
                 WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )?;
            Ok(updated > 0)
        })
    }

    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE notifications
                 SET read_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
                 WHERE user_id = ?1 AND read_at IS NULL",
                [user_id],
            )?)
        })
    }

    // -- Outbox --

    /// Oldest undelivered notifications that still have attempts left.
    pub fn undelivered_notifications(
        &self,
        max_attempts: i64,
        limit: u32,
    ) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE delivered_at IS NULL AND delivery_attempts < ?1
                 ORDER BY created_at ASC, rowid ASC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![max_attempts, clamp_limit(limit)], map_notification)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn mark_notification_delivered(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE notifications
                 SET delivered_at = strftime('%Y-%m-%d %H:%M:%f', 'now'),
                     delivery_attempts = delivery_attempts + 1,
                     last_error = NULL
                 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    pub fn record_notification_failure(&self, id: &str, error: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE notifications
                 SET delivery_attempts = delivery_attempts + 1, last_error = ?2
                 WHERE id = ?1",
                [id, error],
            )?;
            Ok(())
        })
    }
}

/// Writes the outbox row. Call it on the same transaction as the state change
/// the notification describes.
pub fn enqueue_notification(conn: &Connection, new: &NewNotification) -> rusqlite::Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO notifications (id, user_id, kind, title, body, related_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            id,
            new.user_id,
            new.kind.as_str(),
            new.title,
            new.body,
            new.related_id,
        ],
    )?;
    Ok(id)
}

fn map_notification(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: tag(row, 2)?,
        title: row.get(3)?,
        body: row.get(4)?,
        related_id: row.get(5)?,
        read_at: row.get(6)?,
        delivered_at: row.get(7)?,
        delivery_attempts: row.get(8)?,
        last_error: row.get(9)?,
        created_at: row.get(10)?,
    })
}
