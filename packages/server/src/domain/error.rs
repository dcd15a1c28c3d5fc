//! Error taxonomy of the hub.

use thiserror::Error;

use super::DirectoryError;

/// Outcome of a dispatcher operation that did not succeed.
///
/// Handler failures are local per-handler outcomes turned into response
/// envelopes; they never close unrelated connections or crash the
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The credential did not resolve to a user identity. The handler must
    /// not mutate shared state on this path.
    #[error("unauthorized")]
    Unauthorized,
    /// A directory reported a business failure; carried to the room as a
    /// fail envelope, not treated as a hub fault.
    #[error("{0}")]
    Rejected(String),
    /// A handler needed a participant for a connection that never joined.
    #[error("connection has not joined the room")]
    NotJoined,
    /// Room state was not initialized for the addressed room.
    #[error("room state not initialized")]
    RoomNotInitialized,
    /// A collaborator service could not be reached.
    #[error("directory unavailable: {0}")]
    Directory(String),
}

impl From<DirectoryError> for HubError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Unauthorized => HubError::Unauthorized,
            DirectoryError::Rejected(message) => HubError::Rejected(message),
            DirectoryError::Transport(message) => HubError::Directory(message),
        }
    }
}
