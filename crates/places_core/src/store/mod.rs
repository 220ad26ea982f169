//! Optimistic collection store.
//!
//! # Responsibility
//! - Own the local snapshot of the user's places.
//! - Apply mutations speculatively and reconcile them with the remote store.
//!
//! # Invariants
//! - The snapshot never holds two places with the same id.
//! - Every change is one atomic snapshot replacement.
//! - A failed remote write reverts only the change of that write.

mod cancel;
mod error;
mod messages;
mod places_store;

pub use cancel::CancellationToken;
pub use error::{StoreError, StoreResult};
pub use messages::StoreMessages;
pub use places_store::PlacesStore;
