use places_core::{
    ErrorChannel, GatewayCall, InMemoryGateway, Place, PlaceImage, PlaceSource, PlacesStore,
    StoreError, StoreMessages,
};
use std::sync::{Arc, Mutex};

fn place(id: &str) -> Place {
    Place::with_id(id, id, PlaceImage::new("p.jpg", "p"), 1.5, -2.5)
}

fn ids(places: &[Place]) -> Vec<&str> {
    places.iter().map(|place| place.id.as_str()).collect()
}

fn store_with(gateway: &Arc<InMemoryGateway>) -> (PlacesStore, Arc<ErrorChannel>) {
    let errors = Arc::new(ErrorChannel::new());
    let store = PlacesStore::new(gateway.clone(), errors.clone());
    (store, errors)
}

#[test]
fn load_yields_gateway_sequence_in_order() {
    let gateway = Arc::new(
        InMemoryGateway::default().with_user_places(vec![place("c"), place("a"), place("b")]),
    );
    let (store, _) = store_with(&gateway);
    assert!(store.places().is_empty());

    let loaded = store.load_user_places().expect("load succeeds");

    assert_eq!(ids(&loaded), vec!["c", "a", "b"]);
    assert_eq!(ids(&store.places()), vec!["c", "a", "b"]);
    assert!(!store.is_fetching());
    assert_eq!(store.last_error(), None);
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::Fetch(store.endpoints().user_places())]
    );
}

#[test]
fn load_selects_endpoint_by_source() {
    let gateway = Arc::new(
        InMemoryGateway::default()
            .with_available(vec![place("x"), place("y")])
            .with_user_places(vec![place("y")]),
    );
    let (store, _) = store_with(&gateway);

    store.load_available_places().unwrap();
    assert_eq!(ids(&store.places()), vec!["x", "y"]);

    store.load(PlaceSource::Mine, "unused").unwrap();
    assert_eq!(ids(&store.places()), vec!["y"]);
}

#[test]
fn failed_load_keeps_snapshot_and_sets_template_error() {
    let gateway = Arc::new(InMemoryGateway::default().with_user_places(vec![place("a")]));
    let (store, errors) = store_with(&gateway);
    store.load_user_places().unwrap();

    let fetching = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fetching);
    store.subscribe_fetching(move |value: &bool| sink.lock().unwrap().push(*value));
    gateway.fail_fetches(true);

    let err = store
        .load(PlaceSource::Mine, "Could not get your places.")
        .expect_err("transport failure");

    assert!(matches!(err, StoreError::RemoteLoadFailed { .. }));
    assert_eq!(err.user_message(), "Could not get your places.");
    assert_eq!(ids(&store.places()), vec!["a"]);
    assert_eq!(*fetching.lock().unwrap(), vec![true, false]);
    assert_eq!(store.last_error().as_deref(), Some("Could not get your places."));
    assert_eq!(errors.reported_count(), 0);
}

#[test]
fn default_load_messages_match_source() {
    let gateway = Arc::new(InMemoryGateway::default());
    let (store, _) = store_with(&gateway);
    gateway.fail_fetches(true);
    let defaults = StoreMessages::default();

    let available = store.load_available_places().expect_err("fails");
    assert_eq!(available.user_message(), defaults.load_available_failed);
    let mine = store.load_user_places().expect_err("fails");
    assert_eq!(mine.user_message(), defaults.load_user_failed);
}

#[test]
fn next_load_clears_previous_error() {
    let gateway = Arc::new(InMemoryGateway::default().with_user_places(vec![place("a")]));
    let (store, _) = store_with(&gateway);
    gateway.fail_fetches(true);
    let _ = store.load_user_places();
    assert!(store.last_error().is_some());

    gateway.fail_fetches(false);
    store.load_user_places().unwrap();

    assert_eq!(store.last_error(), None);
    assert_eq!(ids(&store.places()), vec!["a"]);
}

#[test]
fn reload_reflects_committed_writes() {
    let gateway = Arc::new(
        InMemoryGateway::default()
            .with_available(vec![place("a"), place("b")])
            .with_user_places(vec![place("a")]),
    );
    let (store, _) = store_with(&gateway);
    store.load_user_places().unwrap();
    store.add(place("b")).unwrap();
    store.remove(&place("a")).unwrap();

    let (fresh, _) = store_with(&gateway);
    fresh.load_user_places().unwrap();

    assert_eq!(ids(&fresh.places()), ids(&store.places()));
}
