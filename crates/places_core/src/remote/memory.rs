//! In-process remote store.
//!
//! # Responsibility
//! - Serve the available catalog and the user's selection from memory.
//! - Record every call and inject failures on demand.
//!
//! # Invariants
//! - Committed writes are reflected by later fetches of `user_places`.
//! - The call hook runs before the call resolves and without internal locks.

use crate::model::place::{contains_place, Place, PlaceId};
use crate::remote::gateway::{Endpoint, Endpoints, GatewayResult, RemoteGateway, TransportError};
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type CallHook = Arc<dyn Fn(&GatewayCall) + Send + Sync>;

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Fetch(Endpoint),
    Create(Endpoint, PlaceId),
    Delete(Endpoint, PlaceId),
}

impl GatewayCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Fetch(_))
    }
}

#[derive(Default)]
struct GatewayState {
    available: Vec<Place>,
    mine: Vec<Place>,
    calls: Vec<GatewayCall>,
    fail_fetches: bool,
    fail_writes: bool,
    fail_next_writes: usize,
    hook: Option<CallHook>,
}

/// Thread-safe gateway backed by in-memory collections.
pub struct InMemoryGateway {
    endpoints: Endpoints,
    state: Mutex<GatewayState>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new(Endpoints::default())
    }
}

impl InMemoryGateway {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            state: Mutex::new(GatewayState::default()),
        }
    }

    pub fn with_available(self, places: Vec<Place>) -> Self {
        self.lock().available = places;
        self
    }

    pub fn with_user_places(self, places: Vec<Place>) -> Self {
        self.lock().mine = places;
        self
    }

    /// Places the remote store currently associates with the user.
    pub fn user_places(&self) -> Vec<Place> {
        self.lock().mine.clone()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    pub fn write_calls(&self) -> usize {
        self.lock().calls.iter().filter(|call| call.is_write()).count()
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.lock().fail_fetches = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Fails only the next write call.
    pub fn fail_next_write(&self) {
        self.lock().fail_next_writes += 1;
    }

    /// Installs a hook invoked at the start of every call.
    pub fn set_call_hook(&self, hook: impl Fn(&GatewayCall) + Send + Sync + 'static) {
        self.lock().hook = Some(Arc::new(hook));
    }

    pub fn clear_call_hook(&self) {
        self.lock().hook = None;
    }

    fn lock(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: GatewayCall) {
        debug!("event=gateway_call module=memory_gateway status=ok call={call:?}");
        let hook = {
            let mut state = self.lock();
            state.calls.push(call.clone());
            state.hook.clone()
        };
        if let Some(hook) = hook {
            hook(&call);
        }
    }

    fn take_write_failure(state: &mut GatewayState) -> bool {
        if state.fail_writes {
            return true;
        }
        if state.fail_next_writes > 0 {
            state.fail_next_writes -= 1;
            return true;
        }
        false
    }

    fn check_write_endpoint(&self, endpoint: &Endpoint, id: &PlaceId) -> GatewayResult<()> {
        if endpoint != &self.endpoints.user_place(id) {
            return Err(TransportError::Status {
                code: 404,
                message: format!("no write route at {endpoint}"),
            });
        }
        Ok(())
    }
}

impl RemoteGateway for InMemoryGateway {
    fn fetch_collection(&self, endpoint: &Endpoint) -> GatewayResult<Vec<Place>> {
        self.record(GatewayCall::Fetch(endpoint.clone()));
        let state = self.lock();
        if state.fail_fetches {
            return Err(TransportError::Unreachable("fetch failure injected".to_string()));
        }
        if endpoint == &self.endpoints.available_places() {
            return Ok(state.available.clone());
        }
        if endpoint == &self.endpoints.user_places() {
            return Ok(state.mine.clone());
        }
        Err(TransportError::Status {
            code: 404,
            message: format!("no collection at {endpoint}"),
        })
    }

    fn create_association(&self, endpoint: &Endpoint, id: &PlaceId) -> GatewayResult<()> {
        self.record(GatewayCall::Create(endpoint.clone(), id.clone()));
        self.check_write_endpoint(endpoint, id)?;
        let mut state = self.lock();
        if Self::take_write_failure(&mut state) {
            return Err(TransportError::Status {
                code: 500,
                message: "write failure injected".to_string(),
            });
        }
        if contains_place(&state.mine, id) {
            return Ok(());
        }
        let place = state
            .available
            .iter()
            .find(|place| &place.id == id)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                code: 404,
                message: format!("unknown place {id}"),
            })?;
        state.mine.push(place);
        Ok(())
    }

    fn delete_association(&self, endpoint: &Endpoint, id: &PlaceId) -> GatewayResult<()> {
        self.record(GatewayCall::Delete(endpoint.clone(), id.clone()));
        self.check_write_endpoint(endpoint, id)?;
        let mut state = self.lock();
        if Self::take_write_failure(&mut state) {
            return Err(TransportError::Status {
                code: 500,
                message: "write failure injected".to_string(),
            });
        }
        state.mine.retain(|place| &place.id != id);
        Ok(())
    }
}
