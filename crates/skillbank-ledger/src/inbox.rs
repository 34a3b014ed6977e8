use skillbank_db::models::NotificationRow;
use skillbank_types::models::Principal;

use crate::{Ledger, LedgerError, Result};

/// A page of the principal's notifications plus their unread count.
#[derive(Debug, Clone)]
pub struct Inbox {
    pub unread: i64,
    pub notifications: Vec<NotificationRow>,
}

impl Ledger {
    pub fn inbox(&self, principal: &Principal, unread_only: bool, limit: u32) -> Result<Inbox> {
        let user_id = principal.id_string();
        let notifications = self.db.list_notifications(&user_id, unread_only, limit)?;
        let unread = self.db.unread_notification_count(&user_id)?;
        Ok(Inbox {
            unread,
            notifications,
        })
    }

    pub fn mark_read(&self, principal: &Principal, notification_id: &str) -> Result<()> {
        if self
            .db
            .mark_notification_read(&principal.id_string(), notification_id)?
        {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("notification {notification_id}")))
        }
    }

    /// Returns how many notifications changed state.
    pub fn mark_all_read(&self, principal: &Principal) -> Result<usize> {
        Ok(self.db.mark_all_notifications_read(&principal.id_string())?)
    }
}
