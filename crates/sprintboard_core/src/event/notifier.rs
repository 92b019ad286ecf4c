//! Ordered subscriber list with unsubscribe tokens.

use log::error;
use std::fmt::{Debug, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Token returned by `subscribe`; pass it to `unsubscribe` to stop delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

/// Per-store subscriber registry.
///
/// `E` is the change event the store emits after each mutation.
pub struct ChangeNotifier<E> {
    source: &'static str,
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Handler<E>)>,
}

impl<E> ChangeNotifier<E> {
    /// Creates an empty notifier. `source` names the owning store in logs.
    pub fn new(source: &'static str) -> Self {
        Self {
            source,
            next_id: 1,
            subscribers: Vec::new(),
        }
    }

    /// Appends a subscriber; it runs after every subscriber registered before it.
    pub fn subscribe(&mut self, handler: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Removes a subscriber. Returns `false` when the token is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers `event` to every subscriber in subscription order.
    pub fn notify(&mut self, event: &E) {
        for (id, handler) in &mut self.subscribers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(
                    "event=subscriber_panic module=event status=error source={} subscription_id={}",
                    self.source, id.0
                );
            }
        }
    }
}

impl<E> Debug for ChangeNotifier<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("source", &self.source)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
