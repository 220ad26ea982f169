//! Store for the user's place collection.
//!
//! # Responsibility
//! - Expose the snapshot, the fetching flag and the last load error as
//!   observable state.
//! - Run load/add/remove against the remote gateway with optimistic updates.
//!
//! # Invariants
//! - All snapshot writes happen under the ledger lock; subscribers are
//!   notified after it is released.
//! - Only the most recently issued load may change state.
//! - Rollback restores the captured snapshot only when no other write landed
//!   since; otherwise it compensates the failed change alone.

use crate::error_sink::ErrorSink;
use crate::model::place::{contains_place, position_of, Place, PlaceId};
use crate::observable::{Observable, SubscriptionId};
use crate::remote::{Endpoints, PlaceSource, RemoteGateway};
use crate::store::cancel::CancellationToken;
use crate::store::error::{StoreError, StoreResult};
use crate::store::messages::StoreMessages;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// Write bookkeeping guarded by one lock.
#[derive(Default)]
struct Ledger {
    /// Bumped on every snapshot replacement.
    revision: u64,
    /// Sequence number of the most recently issued load.
    load_ticket: u64,
}

#[derive(Debug, Clone)]
enum Change {
    Added(PlaceId),
    Removed { place: Place, index: usize },
}

impl Change {
    fn place_id(&self) -> &PlaceId {
        match self {
            Self::Added(id) => id,
            Self::Removed { place, .. } => &place.id,
        }
    }

    /// Undoes this change on top of a snapshot that moved on since.
    fn compensate(&self, current: &[Place]) -> Vec<Place> {
        match self {
            Self::Added(id) => current
                .iter()
                .filter(|place| &place.id != id)
                .cloned()
                .collect(),
            Self::Removed { place, index } => {
                let mut restored = current.to_vec();
                if !contains_place(current, &place.id) {
                    let at = (*index).min(restored.len());
                    restored.insert(at, place.clone());
                }
                restored
            }
        }
    }
}

/// Optimistic change awaiting remote confirmation. Never leaves the store.
struct PendingMutation {
    change: Change,
    before: Arc<Vec<Place>>,
    revision: u64,
}

/// Authoritative local collection synchronized with a remote store.
pub struct PlacesStore {
    gateway: Arc<dyn RemoteGateway>,
    errors: Arc<dyn ErrorSink>,
    endpoints: Endpoints,
    messages: StoreMessages,
    places: Observable<Vec<Place>>,
    fetching: Observable<bool>,
    last_error: Observable<Option<String>>,
    ledger: Mutex<Ledger>,
}

impl PlacesStore {
    /// Creates an empty store with default endpoints and messages.
    pub fn new(gateway: Arc<dyn RemoteGateway>, errors: Arc<dyn ErrorSink>) -> Self {
        Self {
            gateway,
            errors,
            endpoints: Endpoints::default(),
            messages: StoreMessages::default(),
            places: Observable::default(),
            fetching: Observable::new(false),
            last_error: Observable::new(None),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Points the store at a different remote layout.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Overrides the user-facing failure texts.
    pub fn with_messages(mut self, messages: StoreMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn messages(&self) -> &StoreMessages {
        &self.messages
    }

    /// Latest committed snapshot. The returned value is frozen.
    pub fn places(&self) -> Arc<Vec<Place>> {
        self.places.get()
    }

    /// Whether the latest snapshot holds `id`.
    pub fn contains(&self, id: &PlaceId) -> bool {
        contains_place(&self.places.get(), id)
    }

    /// `true` between the start of the latest issued load and its completion.
    pub fn is_fetching(&self) -> bool {
        *self.fetching.get()
    }

    /// Message of the last failed load, cleared when a new load starts.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.get().as_ref().clone()
    }

    /// Registers `listener` for snapshot changes.
    ///
    /// # Invariants
    /// - Runs with no store lock held; it may call back into the store.
    /// - Rapid changes may be coalesced, but the last value delivered is the
    ///   latest committed snapshot.
    pub fn subscribe_places(
        &self,
        listener: impl Fn(&Vec<Place>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.places.subscribe(listener)
    }

    pub fn unsubscribe_places(&self, id: SubscriptionId) -> bool {
        self.places.unsubscribe(id)
    }

    /// Registers `listener` for fetching-flag changes.
    pub fn subscribe_fetching(
        &self,
        listener: impl Fn(&bool) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.fetching.subscribe(listener)
    }

    pub fn unsubscribe_fetching(&self, id: SubscriptionId) -> bool {
        self.fetching.unsubscribe(id)
    }

    /// Registers `listener` for load-error changes.
    pub fn subscribe_error(
        &self,
        listener: impl Fn(&Option<String>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.last_error.subscribe(listener)
    }

    pub fn unsubscribe_error(&self, id: SubscriptionId) -> bool {
        self.last_error.unsubscribe(id)
    }

    /// Loads the user's places with the default failure message.
    pub fn load_user_places(&self) -> StoreResult<Arc<Vec<Place>>> {
        let message = self.messages.load_user_failed.clone();
        self.load(PlaceSource::Mine, &message)
    }

    /// Loads the available catalog with the default failure message.
    pub fn load_available_places(&self) -> StoreResult<Arc<Vec<Place>>> {
        let message = self.messages.load_available_failed.clone();
        self.load(PlaceSource::Available, &message)
    }

    /// Replaces the snapshot with the remote collection of `source`.
    ///
    /// On failure the snapshot is left untouched and `error_message` becomes
    /// the visible last error. A load that is overtaken by a newer one returns
    /// `LoadSuperseded` and changes nothing.
    pub fn load(&self, source: PlaceSource, error_message: &str) -> StoreResult<Arc<Vec<Place>>> {
        let (ticket, fetching, cleared) = {
            let mut ledger = self.lock_ledger();
            ledger.load_ticket += 1;
            (
                ledger.load_ticket,
                self.fetching.replace(true),
                self.last_error.replace(None),
            )
        };
        fetching.dispatch();
        cleared.dispatch();

        let endpoint = self.endpoints.for_source(source);
        debug!(
            "event=load_start module=store status=ok source={} ticket={ticket}",
            source.as_str()
        );
        let outcome = self.gateway.fetch_collection(&endpoint);

        let mut ledger = self.lock_ledger();
        if ledger.load_ticket != ticket {
            drop(ledger);
            debug!(
                "event=load_superseded module=store status=ok source={} ticket={ticket}",
                source.as_str()
            );
            return Err(StoreError::LoadSuperseded { source });
        }

        let fetching = self.fetching.replace(false);
        match outcome {
            Ok(fetched) => {
                let count = fetched.len();
                let snapshot = Arc::new(fetched);
                ledger.revision += 1;
                let replaced = self.places.replace_shared(Arc::clone(&snapshot));
                drop(ledger);
                replaced.dispatch();
                fetching.dispatch();
                info!(
                    "event=load_done module=store status=ok source={} count={count}",
                    source.as_str()
                );
                Ok(snapshot)
            }
            Err(transport) => {
                let message = error_message.to_string();
                let failed = self.last_error.replace(Some(message.clone()));
                drop(ledger);
                fetching.dispatch();
                failed.dispatch();
                warn!(
                    "event=load_done module=store status=error source={} error={transport}",
                    source.as_str()
                );
                Err(StoreError::RemoteLoadFailed {
                    message,
                    source: transport,
                })
            }
        }
    }

    /// Appends `place` optimistically and attaches it on the remote store.
    ///
    /// # Errors
    /// - `DuplicateEntity` when the id is already present; no remote call.
    /// - `RemoteWriteFailed` when the remote call fails; the append is reverted
    ///   and the error sink receives one message.
    pub fn add(&self, place: Place) -> StoreResult<()> {
        let pending = self.begin_add(place)?;
        self.reconcile(pending)
    }

    /// Drops `place` optimistically and detaches it on the remote store.
    ///
    /// # Errors
    /// - `EntityNotFound` when the id is absent; no remote call.
    /// - `RemoteWriteFailed` when the remote call fails; the removal is
    ///   reverted and the error sink receives one message.
    pub fn remove(&self, place: &Place) -> StoreResult<()> {
        let pending = self.begin_remove(&place.id)?;
        self.reconcile(pending)
    }

    /// Same as `add`, but the remote step runs on a worker thread.
    ///
    /// The precondition check and the optimistic append happen before this
    /// returns. `on_done` runs unless `token` was cancelled first.
    pub fn spawn_add<F>(
        self: &Arc<Self>,
        place: Place,
        token: CancellationToken,
        on_done: F,
    ) -> StoreResult<JoinHandle<()>>
    where
        F: FnOnce(StoreResult<()>) + Send + 'static,
    {
        let pending = self.begin_add(place)?;
        Ok(self.spawn_reconcile(pending, token, on_done))
    }

    /// Same as `remove`, but the remote step runs on a worker thread.
    pub fn spawn_remove<F>(
        self: &Arc<Self>,
        place: &Place,
        token: CancellationToken,
        on_done: F,
    ) -> StoreResult<JoinHandle<()>>
    where
        F: FnOnce(StoreResult<()>) + Send + 'static,
    {
        let pending = self.begin_remove(&place.id)?;
        Ok(self.spawn_reconcile(pending, token, on_done))
    }

    fn begin_add(&self, place: Place) -> StoreResult<PendingMutation> {
        let mut ledger = self.lock_ledger();
        let before = self.places.get();
        if contains_place(&before, &place.id) {
            debug!(
                "event=place_add module=store status=rejected reason=duplicate place_id={}",
                place.id
            );
            return Err(StoreError::DuplicateEntity {
                id: place.id,
                message: self.messages.duplicate.clone(),
            });
        }

        let id = place.id.clone();
        let mut next = Vec::with_capacity(before.len() + 1);
        next.extend(before.iter().cloned());
        next.push(place);
        ledger.revision += 1;
        let pending = PendingMutation {
            change: Change::Added(id),
            before,
            revision: ledger.revision,
        };
        let replaced = self.places.replace(next);
        drop(ledger);
        replaced.dispatch();
        Ok(pending)
    }

    fn begin_remove(&self, id: &PlaceId) -> StoreResult<PendingMutation> {
        let mut ledger = self.lock_ledger();
        let before = self.places.get();
        let Some(index) = position_of(&before, id) else {
            debug!(
                "event=place_remove module=store status=rejected reason=not_found place_id={id}"
            );
            return Err(StoreError::EntityNotFound {
                id: id.clone(),
                message: self.messages.not_found.clone(),
            });
        };

        let removed = before[index].clone();
        let next: Vec<Place> = before
            .iter()
            .filter(|place| &place.id != id)
            .cloned()
            .collect();
        ledger.revision += 1;
        let pending = PendingMutation {
            change: Change::Removed {
                place: removed,
                index,
            },
            before,
            revision: ledger.revision,
        };
        let replaced = self.places.replace(next);
        drop(ledger);
        replaced.dispatch();
        Ok(pending)
    }

    /// Issues the remote write for `pending` and commits or rolls it back.
    fn reconcile(&self, pending: PendingMutation) -> StoreResult<()> {
        let id = pending.change.place_id().clone();
        let endpoint = self.endpoints.user_place(&id);
        let (operation, outcome) = match &pending.change {
            Change::Added(_) => ("place_add", self.gateway.create_association(&endpoint, &id)),
            Change::Removed { .. } => (
                "place_remove",
                self.gateway.delete_association(&endpoint, &id),
            ),
        };

        let transport = match outcome {
            Ok(()) => {
                info!("event={operation} module=store status=ok place_id={id}");
                return Ok(());
            }
            Err(transport) => transport,
        };

        let message = match pending.change {
            Change::Added(_) => self.messages.add_failed.clone(),
            Change::Removed { .. } => self.messages.remove_failed.clone(),
        };
        self.roll_back(pending);
        warn!("event={operation} module=store status=error place_id={id} error={transport}");
        self.errors.report_error(&message);
        Err(StoreError::RemoteWriteFailed {
            message,
            source: transport,
        })
    }

    fn roll_back(&self, pending: PendingMutation) {
        let mut ledger = self.lock_ledger();
        let restored = if ledger.revision == pending.revision {
            pending.before
        } else {
            debug!(
                "event=rollback module=store status=ok mode=compensate place_id={}",
                pending.change.place_id()
            );
            Arc::new(pending.change.compensate(&self.places.get()))
        };
        ledger.revision += 1;
        let replaced = self.places.replace_shared(restored);
        drop(ledger);
        replaced.dispatch();
    }

    fn spawn_reconcile<F>(
        self: &Arc<Self>,
        pending: PendingMutation,
        token: CancellationToken,
        on_done: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(StoreResult<()>) + Send + 'static,
    {
        let store = Arc::clone(self);
        thread::spawn(move || {
            let result = store.reconcile(pending);
            if token.is_cancelled() {
                debug!("event=callback_suppressed module=store status=ok");
                return;
            }
            on_done(result);
        })
    }

    fn lock_ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::Change;
    use crate::model::place::{Place, PlaceId, PlaceImage};

    fn place(id: &str) -> Place {
        Place::with_id(id, id, PlaceImage::new("i.jpg", "i"), 0.0, 0.0)
    }

    fn ids(places: &[Place]) -> Vec<&str> {
        places.iter().map(|place| place.id.as_str()).collect()
    }

    #[test]
    fn compensating_an_add_keeps_newer_entries() {
        let change = Change::Added(PlaceId::from("b"));
        let current = vec![place("a"), place("b"), place("c")];
        assert_eq!(ids(&change.compensate(&current)), vec!["a", "c"]);
    }

    #[test]
    fn compensating_a_remove_reinserts_at_original_index() {
        let change = Change::Removed {
            place: place("b"),
            index: 1,
        };
        let current = vec![place("a"), place("c"), place("d")];
        assert_eq!(ids(&change.compensate(&current)), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn compensating_a_remove_clamps_index_and_never_duplicates() {
        let change = Change::Removed {
            place: place("z"),
            index: 5,
        };
        assert_eq!(ids(&change.compensate(&[place("a")])), vec!["a", "z"]);
        assert_eq!(ids(&change.compensate(&[place("z")])), vec!["z"]);
    }
}
