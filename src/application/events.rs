use std::sync::Mutex;

use crate::domain::CustomerId;

/// Emitted by the service after each completed mutation so interested
/// views can refresh themselves. The core never renders anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEvent {
    CustomerRegistered(CustomerId),
    CustomerUpdated(CustomerId),
    CustomerDeactivated(CustomerId),
    PurchaseRecorded(CustomerId),
    PaymentRecorded(CustomerId),
}

type Listener = Box<dyn Fn(&LedgerEvent) + Send + Sync>;

/// Subscriber list for ledger mutations. Listeners run synchronously, in
/// subscription order, after the mutation has been persisted.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&LedgerEvent) + Send + Sync + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Box::new(listener));
    }

    pub fn emit(&self, event: LedgerEvent) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for listener in listeners.iter() {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_emit_reaches_every_listener() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let count = Arc::clone(&count);
            bus.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        bus.emit(LedgerEvent::PurchaseRecorded(1));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_emit_without_listeners_is_fine() {
        let bus = EventBus::new();
        bus.emit(LedgerEvent::CustomerDeactivated(7));
    }
}
