use std::time::Duration;

use crate::{db::Store, models::Participant, AppError, AppResult};

/// Whether a participant last seen at `last_status` has been idle for longer
/// than `threshold` at `now`. A participant exactly at the threshold is alive.
pub fn is_expired(last_status: i64, threshold: Duration, now: i64) -> bool {
    now.saturating_sub(last_status) > threshold_millis(threshold)
}

// saturates instead of wrapping for windows past i64::MAX ms
fn threshold_millis(threshold: Duration) -> i64 {
    i64::try_from(threshold.as_millis()).unwrap_or(i64::MAX)
}

/// Last-seen bookkeeping over the participants collection.
#[derive(Clone)]
pub struct PresenceTracker {
    store: Store,
}

impl PresenceTracker {
    pub fn new(store: Store) -> Self {
        PresenceTracker { store }
    }

    pub async fn touch(&self, name: &str, now: i64) -> AppResult<()> {
        if !self.store.set_last_status(name, now).await? {
            return Err(AppError::NotFound(name.to_owned()));
        }
        Ok(())
    }

    pub async fn list_expired(&self, threshold: Duration, now: i64) -> AppResult<Vec<Participant>> {
        // now - last > threshold  <=>  last < now - threshold
        let cutoff = now.saturating_sub(threshold_millis(threshold));
        self.store.idle_before(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Duration = Duration::from_millis(10_000);
    const NOW: i64 = 1_700_000_000_000;

    async fn tracker_with(participants: &[(&str, i64)]) -> (Store, PresenceTracker) {
        let store = Store::in_memory().await.unwrap();
        for (name, last_status) in participants {
            let participant = Participant::new(name.to_string(), *last_status);
            let notice = crate::models::Message::status(name, crate::models::JOIN_TEXT, *last_status).unwrap();
            store.register(&participant, &notice).await.unwrap();
        }
        let tracker = PresenceTracker::new(store.clone());
        (store, tracker)
    }

    #[test]
    fn threshold_boundary_is_alive() {
        assert!(!is_expired(NOW - 10_000, THRESHOLD, NOW));
        assert!(is_expired(NOW - 10_001, THRESHOLD, NOW));
        assert!(!is_expired(NOW, THRESHOLD, NOW));
    }

    #[tokio::test]
    async fn list_expired_uses_strict_cutoff() {
        let (_store, tracker) = tracker_with(&[
            ("Ana", NOW - 10_000),
            ("Bob", NOW - 10_001),
            ("Carl", NOW),
        ])
        .await;

        let expired = tracker.list_expired(THRESHOLD, NOW).await.unwrap();
        let names: Vec<&str> = expired.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["Bob"]);
        assert!(expired.iter().all(|p| is_expired(p.last_status, THRESHOLD, NOW)));
    }

    #[test]
    fn huge_threshold_never_expires() {
        assert!(!is_expired(0, Duration::MAX, NOW));
        assert!(!is_expired(i64::MIN, Duration::from_millis(u64::MAX), NOW));
    }

    #[tokio::test]
    async fn list_expired_with_huge_threshold_is_empty() {
        let (_store, tracker) = tracker_with(&[("Ana", 0), ("Bob", NOW - 60_000)]).await;

        let expired = tracker.list_expired(Duration::from_millis(u64::MAX), NOW).await.unwrap();
        assert!(expired.is_empty());
    }

    #[tokio::test]
    async fn touch_refreshes_last_status() {
        let (store, tracker) = tracker_with(&[("Ana", NOW - 60_000)]).await;

        tracker.touch("Ana", NOW).await.unwrap();

        let ana = store.find_participant("Ana").await.unwrap().unwrap();
        assert_eq!(ana.last_status, NOW);
        assert!(tracker.list_expired(THRESHOLD, NOW).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn touch_unknown_participant_is_not_found() {
        let (_store, tracker) = tracker_with(&[]).await;

        let err = tracker.touch("Ghost", NOW).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(name) if name == "Ghost"));
    }
}
