//! Remote store boundary.
//!
//! # Responsibility
//! - Define the narrow request/response contract the store depends on.
//! - Provide wire types and an in-memory implementation for callers and tests.
//!
//! # Invariants
//! - The store never sees transport details beyond `TransportError`.
//! - Deduplication of fetched collections is the gateway's contract.

pub mod gateway;
pub mod memory;
pub mod wire;

pub use gateway::{Endpoint, Endpoints, GatewayResult, PlaceSource, RemoteGateway, TransportError};
pub use memory::{GatewayCall, InMemoryGateway};
