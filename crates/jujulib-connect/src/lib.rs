//! jujulib Connect: client-side RPC session for the Juju controller API
//!
//! This crate drives the wire types of `jujulib-wire` over a WebSocket:
//!
//! # Architecture
//!
//! - **Transport**: moves text frames; [`WsTransport`] is the tokio-tungstenite backend
//! - **Dispatcher**: assigns request ids and routes each response to its caller
//! - **ControllerApi**: session state, login (password or macaroon discharge)
//!   and the `ModelManager` operations
//!
//! # Example
//!
//! ```rust,no_run
//! use jujulib_connect::{ControllerApi, Credentials};
//! use jujulib_wire::UserTag;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let api = ControllerApi::connect(
//!         "wss://10.0.0.1:17070/api",
//!         Some(Credentials::password("admin", "secret")),
//!     )
//!     .await?;
//!     api.login().await?;
//!
//!     let created = api.create_model("staging", &UserTag::new("admin")).await?;
//!     println!("created {} in {:?}", created.uuid, created.region);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod session;
pub mod testing;
pub mod transport;
pub mod websocket;

pub use auth::{Bakery, LoginOutcome};
pub use controller::ControllerApi;
pub use dispatcher::{Dispatcher, PendingReply};
pub use error::{ClientError, ErrorKind};
pub use models::{CreatedModel, DestroyResult, ModelListing, ModelOptions, ModelSummary};
pub use session::{AuthState, Credentials, Session, SessionEvent};
pub use transport::{Inbound, Transport};
pub use websocket::WsTransport;
