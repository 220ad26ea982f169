//! Observable state cells.
//!
//! # Responsibility
//! - Hold one value that is always read as the latest committed version.
//! - Notify subscribers after every replacement.
//!
//! # Invariants
//! - Writes are whole-value replacements; readers never see a partial edit.
//! - Subscribers are invoked without any cell lock held.
//! - Deliveries are serialized per cell and always carry the newest value; a
//!   subscriber may skip intermediate values but never ends on a stale one.
//! - A poisoned lock never panics; the last written value is recovered.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by `Observable::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

struct Cell<T> {
    value: Arc<T>,
    version: u64,
    next_subscription: u64,
    listeners: BTreeMap<SubscriptionId, Listener<T>>,
    /// Set while some caller is running the delivery loop.
    delivering: bool,
}

/// Mutable cell with subscribe-for-change semantics.
pub struct Observable<T> {
    cell: RwLock<Cell<T>>,
}

/// Replacement that has been committed but not yet announced.
///
/// Produced by `Observable::replace` so callers can release their own locks
/// before subscribers run. If another caller is already delivering, dispatch
/// returns at once and that caller announces the newest value instead.
#[must_use = "subscribers are only notified when the notification is dispatched"]
pub struct Notification<'a, T> {
    observable: &'a Observable<T>,
}

impl<T> Notification<'_, T> {
    pub fn dispatch(self) {
        self.observable.deliver();
    }
}

/// Clears `delivering` if a subscriber panics mid-delivery.
struct DeliveryGuard<'a, T> {
    observable: &'a Observable<T>,
    armed: bool,
}

impl<T> Drop for DeliveryGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.observable.write().delivering = false;
        }
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            cell: RwLock::new(Cell {
                value: Arc::new(value),
                version: 0,
                next_subscription: 0,
                listeners: BTreeMap::new(),
                delivering: false,
            }),
        }
    }

    /// Returns the latest committed value.
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.read().value)
    }

    /// Number of replacements applied since construction.
    pub fn version(&self) -> u64 {
        self.read().version
    }

    /// Replaces the value and notifies subscribers.
    pub fn set(&self, value: T) {
        self.replace(value).dispatch();
    }

    /// Replaces the value; subscribers run when the returned notification is
    /// dispatched.
    pub fn replace(&self, value: T) -> Notification<'_, T> {
        self.replace_shared(Arc::new(value))
    }

    /// Same as `replace` for a value that is already shared.
    pub fn replace_shared(&self, value: Arc<T>) -> Notification<'_, T> {
        let mut cell = self.write();
        cell.value = value;
        cell.version += 1;
        Notification { observable: self }
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let mut cell = self.write();
        let id = SubscriptionId(cell.next_subscription);
        cell.next_subscription += 1;
        cell.listeners.insert(id, Arc::new(listener));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.write().listeners.remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.read().listeners.len()
    }

    /// Announces the current value until no replacement is left unannounced.
    ///
    /// A replacement landing mid-round (from a subscriber or another thread)
    /// cuts the round short and restarts it with the newer value.
    fn deliver(&self) {
        {
            let mut cell = self.write();
            if cell.delivering {
                return;
            }
            cell.delivering = true;
        }
        let mut guard = DeliveryGuard {
            observable: self,
            armed: true,
        };

        loop {
            let (version, value, listeners) = {
                let cell = self.read();
                let listeners: Vec<Listener<T>> = cell.listeners.values().cloned().collect();
                (cell.version, Arc::clone(&cell.value), listeners)
            };
            for listener in &listeners {
                if self.version() != version {
                    break;
                }
                listener(&value);
            }

            let mut cell = self.write();
            if cell.version == version {
                cell.delivering = false;
                guard.armed = false;
                return;
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Cell<T>> {
        self.cell.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Cell<T>> {
        self.cell.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::Observable;
    use std::sync::{Arc, Mutex};

    #[test]
    fn get_returns_latest_value() {
        let cell = Observable::new(1);
        cell.set(2);
        cell.set(3);
        assert_eq!(*cell.get(), 3);
        assert_eq!(cell.version(), 2);
    }

    #[test]
    fn subscribers_see_every_replacement_until_unsubscribed() {
        let cell = Observable::new(String::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = cell.subscribe(move |value: &String| sink.lock().unwrap().push(value.clone()));

        cell.set("a".to_string());
        cell.set("b".to_string());
        assert!(cell.unsubscribe(id));
        cell.set("c".to_string());

        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
        assert!(!cell.unsubscribe(id));
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn replace_defers_notification_until_dispatch() {
        let cell = Arc::new(Observable::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reader = Arc::clone(&cell);
        // Reads the cell from inside the callback; must not deadlock.
        cell.subscribe(move |value: &i32| {
            sink.lock().unwrap().push((*value, *reader.get()));
        });

        let pending = cell.replace(7);
        assert_eq!(*cell.get(), 7);
        assert!(seen.lock().unwrap().is_empty());
        pending.dispatch();

        assert_eq!(*seen.lock().unwrap(), vec![(7, 7)]);
    }

    #[test]
    fn reentrant_write_ends_every_subscriber_on_latest_value() {
        let cell = Arc::new(Observable::new(0));
        let writer = Arc::clone(&cell);
        cell.subscribe(move |value: &i32| {
            if *value == 1 {
                writer.set(2);
            }
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        cell.subscribe(move |value: &i32| sink.lock().unwrap().push(*value));

        cell.set(1);

        assert_eq!(*cell.get(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn panicking_subscriber_does_not_block_later_deliveries() {
        let cell = Arc::new(Observable::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        cell.subscribe(move |value: &i32| {
            if *value == 1 {
                panic!("subscriber failure");
            }
            sink.lock().unwrap().push(*value);
        });

        let panicking = Arc::clone(&cell);
        let outcome = std::thread::spawn(move || panicking.set(1)).join();
        assert!(outcome.is_err());

        cell.set(2);
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }
}
