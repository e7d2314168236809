/// Transient user-visible messaging
///
/// One visible message per source: the session store and the collection
/// store each own a single slot holding the outcome of their last
/// operation. This is deliberately not a history log or a pub/sub bus.
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

/// Category of a transient message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationCategory {
    /// Success and info messages self-expire; error and warning persist
    /// until dismissed
    pub fn is_transient(&self) -> bool {
        matches!(self, NotificationCategory::Success | NotificationCategory::Info)
    }
}

/// Which store produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSource {
    Session,
    Collection,
}

/// A single transient message
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub category: NotificationCategory,
    pub created_at: DateTime<Utc>,
}

/// Store-level transient message, kept in store state snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub category: NotificationCategory,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: NotificationCategory::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: NotificationCategory::Error,
        }
    }
}

#[derive(Debug, Default)]
struct Slots {
    session: Option<Notification>,
    collection: Option<Notification>,
}

impl Slots {
    fn slot_mut(&mut self, source: NotificationSource) -> &mut Option<Notification> {
        match source {
            NotificationSource::Session => &mut self.session,
            NotificationSource::Collection => &mut self.collection,
        }
    }
}

/// Single-slot-per-source notification surface.
///
/// Publishing replaces the source's current message. Transient
/// categories are cleared after the configured TTL; expiry is keyed by
/// the notification id handed out at publish time, so a message that
/// was superseded in the meantime is never clobbered by a stale timer.
#[derive(Clone)]
pub struct NotificationChannel {
    slots: Arc<Mutex<Slots>>,
    ttl: Duration,
}

impl NotificationChannel {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots::default())),
            ttl,
        }
    }

    /// Publish a message for a source, replacing its current one.
    ///
    /// Returns the id of the published notification. Must be called
    /// from within a tokio runtime (expiry timers are spawned tasks).
    pub fn publish(
        &self,
        source: NotificationSource,
        category: NotificationCategory,
        message: impl Into<String>,
    ) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            message: message.into(),
            category,
            created_at: Utc::now(),
        };
        let id = notification.id;

        *self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slot_mut(source) = Some(notification);

        if category.is_transient() {
            let channel = self.clone();
            let ttl = self.ttl;
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                channel.expire(source, id);
            });
        }

        id
    }

    pub fn success(&self, source: NotificationSource, message: impl Into<String>) -> Uuid {
        self.publish(source, NotificationCategory::Success, message)
    }

    pub fn error(&self, source: NotificationSource, message: impl Into<String>) -> Uuid {
        self.publish(source, NotificationCategory::Error, message)
    }

    pub fn warning(&self, source: NotificationSource, message: impl Into<String>) -> Uuid {
        self.publish(source, NotificationCategory::Warning, message)
    }

    pub fn info(&self, source: NotificationSource, message: impl Into<String>) -> Uuid {
        self.publish(source, NotificationCategory::Info, message)
    }

    /// Clear a source's slot only if it still holds the given id
    fn expire(&self, source: NotificationSource, id: Uuid) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.slot_mut(source);
        if slot.as_ref().map(|n| n.id) == Some(id) {
            *slot = None;
        }
    }

    /// Explicitly dismiss a source's current message
    pub fn dismiss(&self, source: NotificationSource) {
        *self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slot_mut(source) = None;
    }

    /// Dismiss whichever slot holds the given notification
    pub fn dismiss_id(&self, id: Uuid) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        for source in [NotificationSource::Session, NotificationSource::Collection] {
            let slot = slots.slot_mut(source);
            if slot.as_ref().map(|n| n.id) == Some(id) {
                *slot = None;
            }
        }
    }

    /// The message to display when only one can be shown.
    ///
    /// The session's message takes precedence over the collection's.
    pub fn display(&self) -> Option<Notification> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.session.clone().or_else(|| slots.collection.clone())
    }

    /// All currently visible messages, session first
    pub fn visible(&self) -> Vec<Notification> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .session
            .iter()
            .chain(slots.collection.iter())
            .cloned()
            .collect()
    }

    pub fn clear_all(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.session = None;
        slots.collection = None;
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn success_messages_expire_after_ttl() {
        let channel = NotificationChannel::new(Duration::from_secs(5));
        channel.success(NotificationSource::Collection, "done");

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(channel.display().is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(channel.display().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn errors_persist_until_dismissed() {
        let channel = NotificationChannel::new(Duration::from_secs(5));
        channel.error(NotificationSource::Session, "boom");

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(channel.display().is_some());

        channel.dismiss(NotificationSource::Session);
        assert!(channel.display().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_expiry_never_clobbers_a_newer_message() {
        let channel = NotificationChannel::new(Duration::from_secs(5));
        channel.success(NotificationSource::Collection, "first");

        tokio::time::sleep(Duration::from_secs(3)).await;
        channel.success(NotificationSource::Collection, "second");

        // First message's timer fires here; the slot now holds a
        // different id and must survive.
        tokio::time::sleep(Duration::from_secs(3)).await;
        let visible = channel.display().unwrap();
        assert_eq!(visible.message, "second");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(channel.display().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn identical_messages_expire_independently() {
        let channel = NotificationChannel::new(Duration::from_secs(5));
        channel.success(NotificationSource::Collection, "saved");

        tokio::time::sleep(Duration::from_secs(3)).await;
        channel.success(NotificationSource::Collection, "saved");

        // Same text, different id: the older timer must not remove it
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(channel.display().is_some());
    }

    #[tokio::test]
    async fn session_takes_display_precedence() {
        let channel = NotificationChannel::default();
        channel.error(NotificationSource::Collection, "fetch failed");
        channel.error(NotificationSource::Session, "session expired");

        assert_eq!(channel.display().unwrap().message, "session expired");
        assert_eq!(channel.visible().len(), 2);

        // Dismissal clears only the producing source
        channel.dismiss(NotificationSource::Session);
        assert_eq!(channel.display().unwrap().message, "fetch failed");
    }

    #[tokio::test]
    async fn dismiss_by_id_targets_the_right_slot() {
        let channel = NotificationChannel::default();
        let session_id = channel.error(NotificationSource::Session, "a");
        channel.error(NotificationSource::Collection, "b");

        channel.dismiss_id(session_id);
        assert_eq!(channel.visible().len(), 1);
        assert_eq!(channel.display().unwrap().message, "b");
    }
}
