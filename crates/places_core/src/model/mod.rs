//! Domain model for place collections.
//!
//! # Responsibility
//! - Define the record shape shared by the store, the gateway and callers.
//!
//! # Invariants
//! - Every place is identified by a stable `PlaceId`.
//! - Identity is the id alone; two records with the same id are the same place.

pub mod place;
