//! Domain layer: entities, value objects and the ports the hub depends on.
//!
//! The hub owns all in-process room state; durable room and game records live
//! in external directory services reached through the traits defined here
//! (dependency inversion, same as the repository/pusher split the rest of the
//! codebase follows).

mod directory;
mod error;
mod model;
mod pusher;

pub use directory::{
    DirectoryError, GameDirectory, GameRequest, GameSummary, IdentityService, ParticipantRecord,
    RoomDirectory, RoomSummary, RoundSummary, UserIdentity, UserScore,
};
pub use error::HubError;
pub use model::{
    ConnectionId, GameCategory, Nickname, Participant, RoomId, RoomState, RoomStatus, UserId,
    DEFAULT_ROUND_TIME_SECS,
};
pub use pusher::{MessagePusher, PusherChannel};

#[cfg(test)]
pub use directory::{MockGameDirectory, MockIdentityService, MockRoomDirectory};
