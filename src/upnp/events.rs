//! GENA subscription bookkeeping.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Used when the subscriber asks for no timeout or `infinite`.
pub const DEFAULT_TIMEOUT_SECS: u32 = 300;

pub trait EventSubscriptions: Send + Sync {
    /// Registers `callback` for events on `path`; returns the new SID.
    fn subscribe(&self, path: &str, callback: &str, timeout_secs: u32) -> Option<String>;

    /// Extends a live subscription. `false` for unknown or expired SIDs.
    fn renew(&self, sid: &str, timeout_secs: u32) -> bool;

    /// `false` when the SID was not subscribed.
    fn unsubscribe(&self, sid: &str) -> bool;
}

#[derive(Debug, Clone)]
struct Subscriber {
    path: String,
    callback: String,
    expires: Instant,
}

/// In-memory subscriber table keyed by `uuid:` SIDs.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    subscribers: Mutex<HashMap<String, Subscriber>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Callback URLs of the live subscribers to `path`.
    pub fn callbacks_for(&self, path: &str) -> Vec<String> {
        let now = Instant::now();
        self.subscribers
            .lock()
            .values()
            .filter(|s| s.path == path && s.expires > now)
            .map(|s| s.callback.clone())
            .collect()
    }

    fn lifetime(timeout_secs: u32) -> Duration {
        let secs = if timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_secs
        };
        Duration::from_secs(secs as u64)
    }
}

impl EventSubscriptions for SubscriptionRegistry {
    fn subscribe(&self, path: &str, callback: &str, timeout_secs: u32) -> Option<String> {
        let sid = format!("uuid:{}", uuid::Uuid::new_v4());
        let subscriber = Subscriber {
            path: path.to_string(),
            callback: callback.to_string(),
            expires: Instant::now() + Self::lifetime(timeout_secs),
        };

        let mut subs = self.subscribers.lock();
        let now = Instant::now();
        subs.retain(|_, s| s.expires > now);
        subs.insert(sid.clone(), subscriber);

        tracing::debug!(sid = %sid, path = %path, callback = %callback, "New event subscriber");
        Some(sid)
    }

    fn renew(&self, sid: &str, timeout_secs: u32) -> bool {
        let mut subs = self.subscribers.lock();
        let now = Instant::now();
        let Some(s) = subs.get_mut(sid) else {
            return false;
        };
        if s.expires > now {
            s.expires = now + Self::lifetime(timeout_secs);
            return true;
        }
        subs.remove(sid);
        false
    }

    fn unsubscribe(&self, sid: &str) -> bool {
        self.subscribers.lock().remove(sid).is_some()
    }
}
