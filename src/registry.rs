//! Process-wide subscription registry: which tags are of interest, and
//! who wants them.
//!
//! Listeners receive samples over plain `mpsc` channels. `subscribe`
//! hands back a [`TagSubscription`] carrying a stable token, so removal
//! is an exact operation rather than a comparison of callback
//! identities. Slots whose receiver has been dropped are pruned during
//! dispatch.
//!
//! Membership changes (first listener added for a tag, last listener
//! removed) ping the connection so it can re-announce the full tag set.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::sample::Sample;

/// Stable handle identifying one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A live registration for one tag. Dropping the subscription (or its
/// receiver) without calling `unsubscribe` is tolerated: the slot is
/// pruned on the next dispatch for that tag.
pub struct TagSubscription {
    pub id: SubscriptionId,
    pub tag: String,
    pub rx: Receiver<Sample>,
}

struct ListenerSlot {
    id: SubscriptionId,
    tx: Sender<Sample>,
}

struct RegistryInner {
    entries: HashMap<String, Vec<ListenerSlot>>,
    next_id: u64,
    /// Wakes the connection task to re-send the Subscribe announcement.
    announce: Option<tokio::sync::mpsc::UnboundedSender<()>>,
}

impl RegistryInner {
    fn ping_announcer(&self) {
        if let Some(tx) = &self.announce {
            let _ = tx.send(());
        }
    }
}

/// Shared tag → listeners mapping. Cheap to clone; all clones observe
/// the same state. Mutation is serialized by a mutex since feeds and the
/// connection task touch it from different threads.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                entries: HashMap::new(),
                next_id: 1,
                announce: None,
            })),
        }
    }

    /// Register interest in `tag`. If this is the first listener for the
    /// tag, the connection is pinged to re-announce.
    pub fn subscribe(&self, tag: &str) -> TagSubscription {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut inner = self.inner.lock().unwrap();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;

        let is_new_tag = !inner.entries.contains_key(tag);
        inner
            .entries
            .entry(tag.to_string())
            .or_default()
            .push(ListenerSlot { id, tx });
        if is_new_tag {
            inner.ping_announcer();
        }
        TagSubscription {
            id,
            tag: tag.to_string(),
            rx,
        }
    }

    /// Remove one registration exactly. If the tag's listener set becomes
    /// empty, the entry is removed and the connection is pinged.
    pub fn unsubscribe(&self, sub: &TagSubscription) {
        let mut inner = self.inner.lock().unwrap();
        let emptied = match inner.entries.get_mut(&sub.tag) {
            Some(slots) => {
                slots.retain(|slot| slot.id != sub.id);
                slots.is_empty()
            }
            None => false,
        };
        if emptied {
            inner.entries.remove(&sub.tag);
            inner.ping_announcer();
        }
    }

    /// The current interest set, sorted so announcement payloads are
    /// deterministic.
    pub fn subscribed_tags(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        let mut tags: Vec<String> = inner.entries.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Fan a sample out to every listener of its tag. Listeners whose
    /// receiver has been dropped are pruned; if that empties the tag, the
    /// entry goes away and the announcer is pinged, same as an explicit
    /// unsubscribe.
    pub fn dispatch(&self, sample: &Sample) {
        let mut inner = self.inner.lock().unwrap();
        let emptied = match inner.entries.get_mut(&sample.tag) {
            Some(slots) => {
                slots.retain(|slot| slot.tx.send(sample.clone()).is_ok());
                slots.is_empty()
            }
            None => return,
        };
        if emptied {
            inner.entries.remove(&sample.tag);
            inner.ping_announcer();
        }
    }

    /// Attach the connection's announce wakeup channel. Called once by
    /// [`TelemetryConnection::spawn`](crate::connection::TelemetryConnection::spawn).
    pub(crate) fn set_announcer(&self, tx: tokio::sync::mpsc::UnboundedSender<()>) {
        self.inner.lock().unwrap().announce = Some(tx);
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(tag: &str, value: &str) -> Sample {
        Sample {
            tag: tag.to_string(),
            value: value.to_string(),
            at: Utc::now(),
        }
    }

    #[test]
    fn tag_set_tracks_live_listeners_exactly() {
        let reg = SubscriptionRegistry::new();
        assert!(reg.subscribed_tags().is_empty());

        let a1 = reg.subscribe("A");
        let a2 = reg.subscribe("A");
        let b = reg.subscribe("B");
        assert_eq!(reg.subscribed_tags(), vec!["A", "B"]);

        reg.unsubscribe(&a1);
        // A still has one listener.
        assert_eq!(reg.subscribed_tags(), vec!["A", "B"]);

        reg.unsubscribe(&a2);
        assert_eq!(reg.subscribed_tags(), vec!["B"]);

        reg.unsubscribe(&b);
        assert!(reg.subscribed_tags().is_empty());
    }

    #[test]
    fn unsubscribe_is_exact_not_by_tag() {
        let reg = SubscriptionRegistry::new();
        let a1 = reg.subscribe("A");
        let a2 = reg.subscribe("A");

        reg.unsubscribe(&a1);
        reg.dispatch(&sample("A", "1"));
        // a2 still receives; a1's channel got nothing.
        assert!(a2.rx.try_recv().is_ok());
        assert!(a1.rx.try_recv().is_err());
    }

    #[test]
    fn dispatch_fans_out_to_all_listeners_of_the_tag() {
        let reg = SubscriptionRegistry::new();
        let a1 = reg.subscribe("A");
        let a2 = reg.subscribe("A");
        let b = reg.subscribe("B");

        reg.dispatch(&sample("A", "1.5"));
        assert_eq!(a1.rx.try_recv().unwrap().value, "1.5");
        assert_eq!(a2.rx.try_recv().unwrap().value, "1.5");
        assert!(b.rx.try_recv().is_err());

        // Unknown tags are a no-op.
        reg.dispatch(&sample("C", "9"));
    }

    #[test]
    fn dropped_receiver_is_pruned_on_dispatch() {
        let reg = SubscriptionRegistry::new();
        let a = reg.subscribe("A");
        drop(a);
        assert_eq!(reg.subscribed_tags(), vec!["A"]);
        reg.dispatch(&sample("A", "1"));
        assert!(reg.subscribed_tags().is_empty());
    }

    #[test]
    fn membership_changes_ping_the_announcer() {
        let reg = SubscriptionRegistry::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        reg.set_announcer(tx);

        let a = reg.subscribe("A");
        assert!(rx.try_recv().is_ok(), "first listener for A should ping");
        let a2 = reg.subscribe("A");
        assert!(rx.try_recv().is_err(), "second listener is not a change");

        reg.unsubscribe(&a2);
        assert!(rx.try_recv().is_err(), "A still has a listener");
        reg.unsubscribe(&a);
        assert!(rx.try_recv().is_ok(), "last listener removed should ping");
    }
}
