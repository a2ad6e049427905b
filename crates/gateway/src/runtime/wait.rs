//! Bounded wait — the bridge's synchronization primitive.
//!
//! The assistant handler has no inbound channel of its own during an
//! in-flight request, so it cannot receive a push when the human answers.
//! It can only hold the request open and re-read shared state. This module
//! polls the session store at a fixed interval up to a maximum number of
//! attempts and returns the session once `replied`, or `None` on timeout.
//!
//! The interval, attempt count, and the sleep primitive are all injectable
//! so tests can drive the wait without real delays.

use std::time::Duration;

use async_trait::async_trait;

use vb_domain::config::BridgeConfig;
use vb_sessions::{CorrelationSession, SessionStatus, SessionStore};

#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl WaitPolicy {
    pub fn from_config(bridge: &BridgeConfig) -> Self {
        Self {
            interval: Duration::from_secs(bridge.poll_interval_secs),
            max_attempts: bridge.max_attempts,
        }
    }
}

/// Suspension point between poll attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Poll `store` for `id` until it reaches `Replied` or the attempt budget
/// runs out. A `mark_replied` racing ahead of the first poll is fine: the
/// first `get` already observes it.
pub async fn wait_for_reply(
    store: &SessionStore,
    id: &str,
    policy: WaitPolicy,
    sleeper: &dyn Sleeper,
) -> Option<CorrelationSession> {
    for attempt in 1..=policy.max_attempts {
        if let Some(session) = store.get(id) {
            if session.status == SessionStatus::Replied {
                tracing::debug!(id, attempt, "reply observed");
                return Some(session);
            }
        }
        sleeper.sleep(policy.interval).await;
    }

    tracing::info!(id, attempts = policy.max_attempts, "wait timed out without a reply");
    None
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    /// Counts sleeps without actually sleeping.
    #[derive(Default)]
    struct CountingSleeper {
        slept: AtomicU32,
    }

    #[async_trait]
    impl Sleeper for CountingSleeper {
        async fn sleep(&self, _duration: Duration) {
            self.slept.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Marks the session replied during the nth sleep, simulating the
    /// messaging webhook arriving mid-wait.
    struct ReplyingSleeper {
        store: Arc<SessionStore>,
        id: String,
        reply_on: u32,
        slept: AtomicU32,
    }

    #[async_trait]
    impl Sleeper for ReplyingSleeper {
        async fn sleep(&self, _duration: Duration) {
            let n = self.slept.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.reply_on {
                self.store.mark_replied(&self.id, "はい").unwrap();
            }
        }
    }

    fn policy(max_attempts: u32) -> WaitPolicy {
        WaitPolicy {
            interval: Duration::from_secs(5),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn returns_immediately_when_already_replied() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path()).unwrap();
        store.create("S1", "prompt").unwrap();
        store.mark_replied("S1", "はい").unwrap();

        let sleeper = CountingSleeper::default();
        let session = wait_for_reply(&store, "S1", policy(6), &sleeper).await.unwrap();

        assert_eq!(session.reply_message.as_deref(), Some("はい"));
        assert_eq!(sleeper.slept.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn observes_reply_arriving_at_attempt_two() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(SessionStore::new(tmp.path()).unwrap());
        store.create("S1", "Pick me up at 6").unwrap();

        let sleeper = ReplyingSleeper {
            store: store.clone(),
            id: "S1".into(),
            reply_on: 1,
            slept: AtomicU32::new(0),
        };

        let session = wait_for_reply(&store, "S1", policy(6), &sleeper).await.unwrap();
        assert_eq!(session.status, SessionStatus::Replied);
        assert_eq!(session.reply_message.as_deref(), Some("はい"));
        // One sleep = the reply was seen on the second poll.
        assert_eq!(sleeper.slept.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn times_out_after_exhausting_attempts() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path()).unwrap();
        store.create("S2", "prompt").unwrap();

        let sleeper = CountingSleeper::default();
        let result = wait_for_reply(&store, "S2", policy(6), &sleeper).await;

        assert!(result.is_none());
        assert_eq!(sleeper.slept.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn missing_session_also_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path()).unwrap();

        let sleeper = CountingSleeper::default();
        let result = wait_for_reply(&store, "ghost", policy(3), &sleeper).await;

        assert!(result.is_none());
        assert_eq!(sleeper.slept.load(Ordering::SeqCst), 3);
    }
}
