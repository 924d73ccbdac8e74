//! UTTT Sync - Online room protocol
//!
//! Rooms carry an authoritative game state plus a version counter. Clients
//! submit moves tagged with the version they last saw; the store validates
//! and applies atomically, rejecting stale submissions.
//!
//! - `protocol`: wire types and typed rejections
//! - `room` / `store`: room records and the `RoomStore` seam
//! - `client`: the `SyncClient` state machine over a `Transport`

pub mod client;
pub mod config;
pub mod protocol;
pub mod room;
pub mod store;

pub use client::{LocalTransport, SubmitOutcome, SyncClient, SyncStatus, Transport, TransportError, STALE_NOTICE};
pub use config::SyncConfig;
pub use protocol::{
    CreateRoomRequest, CreateRoomResponse, ErrorBody, JoinRoomRequest, MoveAccepted, PerPlayer,
    Presence, Rejection, RoomId, RoomSnapshot, SeatRequest, SubmitMoveRequest,
};
pub use room::Room;
pub use store::{MemoryRoomStore, RoomStore, StoreError};
