//! Wire definitions for the Juju controller API.
//!
//! This crate holds the pieces of the protocol that are pure data:
//!
//! - **Envelopes**: the JSON request/response frames exchanged over the WebSocket
//! - **Facades**: the per-facade version table returned at login and the typed
//!   call registry used to pick a version before anything is sent
//! - **Tags**: parsed `user-...` and `model-...` identifiers
//!
//! Nothing here performs I/O; `jujulib-connect` drives these types over a transport.

pub mod calls;
pub mod envelope;
pub mod facade;
pub mod tags;

pub use calls::FacadeCall;
pub use envelope::{RemoteError, Request, Response};
pub use facade::{FacadeTable, FacadeVersions};
pub use tags::{ModelTag, TagError, UserTag, LOCAL_DOMAIN};

/// An opaque macaroon as carried on the wire.
///
/// Macaroons are never inspected by the client; they are stored and echoed back.
pub type Macaroon = serde_json::Value;
