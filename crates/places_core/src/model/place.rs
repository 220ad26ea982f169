//! Place domain model.
//!
//! # Responsibility
//! - Define the canonical place record and its image reference.
//! - Provide id lookups over ordered place sequences.
//!
//! # Invariants
//! - `id` is opaque and never reused for another place.
//! - Equality compares `id` only.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque unique identifier of a place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(String);

impl PlaceId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh random id for locally created places.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PlaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PlaceId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for PlaceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlaceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Image reference attached to a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceImage {
    /// Source reference (usually a relative URL on the remote store).
    pub src: String,
    /// Accessible alternative text.
    pub alt: String,
}

impl PlaceImage {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: alt.into(),
        }
    }
}

/// Canonical place record as served by the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub title: String,
    pub image: PlaceImage,
    pub lat: f64,
    pub lon: f64,
}

impl Place {
    /// Creates a place with a generated id.
    pub fn new(title: impl Into<String>, image: PlaceImage, lat: f64, lon: f64) -> Self {
        Self::with_id(PlaceId::generate(), title, image, lat, lon)
    }

    /// Creates a place with a caller-provided stable id.
    ///
    /// Used for records that already carry an identity on the remote store.
    pub fn with_id(
        id: impl Into<PlaceId>,
        title: impl Into<String>,
        image: PlaceImage,
        lat: f64,
        lon: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image,
            lat,
            lon,
        }
    }

    /// Compares every field, not just identity.
    pub fn same_content(&self, other: &Place) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.image == other.image
            && self.lat == other.lat
            && self.lon == other.lon
    }
}

impl PartialEq for Place {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Place {}

/// Returns whether `places` holds an element with `id`.
pub fn contains_place(places: &[Place], id: &PlaceId) -> bool {
    places.iter().any(|place| &place.id == id)
}

/// Returns the index of the element with `id`.
pub fn position_of(places: &[Place], id: &PlaceId) -> Option<usize> {
    places.iter().position(|place| &place.id == id)
}
