use crate::model::place::PlaceId;
use crate::remote::{PlaceSource, TransportError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

const SUPERSEDED_MESSAGE: &str = "This list was refreshed by a newer request.";

/// Failure of a store operation.
///
/// `DuplicateEntity` and `EntityNotFound` are local precondition failures and
/// never reach the network. The remote variants carry the gateway error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    DuplicateEntity {
        id: PlaceId,
        message: String,
    },
    EntityNotFound {
        id: PlaceId,
        message: String,
    },
    RemoteLoadFailed {
        message: String,
        source: TransportError,
    },
    RemoteWriteFailed {
        message: String,
        source: TransportError,
    },
    /// A newer load was issued before this one resolved; its result was dropped.
    LoadSuperseded {
        source: PlaceSource,
    },
}

impl StoreError {
    /// Text suitable for showing to the user.
    ///
    /// `LoadSuperseded` is not a failure the user needs to act on; callers
    /// normally drop it, but it still renders a neutral notice.
    pub fn user_message(&self) -> &str {
        match self {
            Self::DuplicateEntity { message, .. }
            | Self::EntityNotFound { message, .. }
            | Self::RemoteLoadFailed { message, .. }
            | Self::RemoteWriteFailed { message, .. } => message.as_str(),
            Self::LoadSuperseded { .. } => SUPERSEDED_MESSAGE,
        }
    }

    /// Whether the failure came from the remote store.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteLoadFailed { .. } | Self::RemoteWriteFailed { .. }
        )
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEntity { id, message } => write!(f, "{message} (place {id})"),
            Self::EntityNotFound { id, message } => write!(f, "{message} (place {id})"),
            Self::RemoteLoadFailed { message, .. } => write!(f, "{message}"),
            Self::RemoteWriteFailed { message, .. } => write!(f, "{message}"),
            Self::LoadSuperseded { source } => {
                write!(f, "load of `{}` places superseded by a newer load", source.as_str())
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RemoteLoadFailed { source, .. } | Self::RemoteWriteFailed { source, .. } => {
                Some(source)
            }
            Self::DuplicateEntity { .. }
            | Self::EntityNotFound { .. }
            | Self::LoadSuperseded { .. } => None,
        }
    }
}
