//! Remote gateway contract and endpoint layout.

use crate::model::place::{Place, PlaceId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

pub type GatewayResult<T> = Result<T, TransportError>;

/// Failure reported by a gateway for one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The remote store could not be reached.
    Unreachable(String),
    /// The remote store answered with a non-success status.
    Status { code: u16, message: String },
    /// The response body did not match the expected shape.
    Decode(String),
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable(detail) => write!(f, "remote store unreachable: {detail}"),
            Self::Status { code, message } => {
                write!(f, "remote store responded with status {code}: {message}")
            }
            Self::Decode(detail) => write!(f, "invalid remote response: {detail}"),
        }
    }
}

impl Error for TransportError {}

impl From<serde_json::Error> for TransportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Absolute URL of one remote resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which remote collection a load reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceSource {
    /// Every place the remote store offers.
    Available,
    /// The places the user has selected.
    Mine,
}

impl PlaceSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Mine => "mine",
        }
    }
}

/// Endpoint layout of the remote store.
///
/// Reads use `available_places` and `user_places`; both user writes go to
/// `user_place(id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Endpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn available_places(&self) -> Endpoint {
        Endpoint(format!("{}/places", self.base_url))
    }

    pub fn user_places(&self) -> Endpoint {
        Endpoint(format!("{}/user-places", self.base_url))
    }

    pub fn user_place(&self, id: &PlaceId) -> Endpoint {
        Endpoint(format!("{}/user-places/{}", self.base_url, id))
    }

    pub fn for_source(&self, source: PlaceSource) -> Endpoint {
        match source {
            PlaceSource::Available => self.available_places(),
            PlaceSource::Mine => self.user_places(),
        }
    }
}

/// Network boundary owned by the surrounding application.
///
/// Implementations own timeouts, retries at the transport level, headers and
/// serialization. Each method is one remote call.
pub trait RemoteGateway: Send + Sync {
    fn fetch_collection(&self, endpoint: &Endpoint) -> GatewayResult<Vec<Place>>;
    fn create_association(&self, endpoint: &Endpoint, id: &PlaceId) -> GatewayResult<()>;
    fn delete_association(&self, endpoint: &Endpoint, id: &PlaceId) -> GatewayResult<()>;
}
