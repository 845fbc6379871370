//! ControllerApi: an authenticated RPC session with a Juju controller

use crate::dispatcher::Dispatcher;
use crate::error::{ClientError, Result};
use crate::session::{AuthState, Credentials, Session, SessionEvent};
use crate::transport::{Inbound, Transport};
use crate::websocket::WsTransport;
use jujulib_wire::calls::{Ping, PINGER_FACADE, PING_METHOD, PING_VERSION};
use jujulib_wire::{FacadeCall, FacadeTable};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const EVENT_CAPACITY: usize = 16;

/// Client for the controller-level API.
///
/// Owns the dispatcher for one connection plus the session state (credentials,
/// negotiated facades, login state). Login lives in `auth.rs`, model
/// operations in `models.rs`.
///
/// # Example
///
/// ```rust,no_run
/// use jujulib_connect::{ControllerApi, Credentials};
///
/// # async fn example() -> anyhow::Result<()> {
/// let api = ControllerApi::connect(
///     "wss://10.0.0.1:17070/api",
///     Some(Credentials::password("admin", "secret")),
/// )
/// .await?;
///
/// api.login().await?;
/// for model in api.list_models_with_info().await? {
///     println!("{} ({})", model.name, model.life);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ControllerApi {
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) session: RwLock<Session>,
    pub(crate) events: broadcast::Sender<SessionEvent>,
    pump: JoinHandle<()>,
}

impl ControllerApi {
    /// Build a client over an already connected transport. Must be called
    /// inside a Tokio runtime: inbound frames are pumped by a spawned task.
    pub fn new(
        transport: Arc<dyn Transport>,
        inbound: Inbound,
        credentials: Option<Credentials>,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(transport));
        let pump = dispatcher.spawn_pump(inbound);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            dispatcher,
            session: RwLock::new(Session::new(credentials)),
            events,
            pump,
        }
    }

    /// Open a WebSocket to `url` and wrap it.
    pub async fn connect(url: &str, credentials: Option<Credentials>) -> Result<Self> {
        let (transport, inbound) = WsTransport::connect(url).await?;
        Ok(Self::new(Arc::new(transport), inbound, credentials))
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Subscribe to login and close notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn notify(&self, event: SessionEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    pub async fn credentials(&self) -> Credentials {
        self.session.read().await.credentials.clone()
    }

    /// Replace the stored credentials; `None` clears them.
    pub async fn set_credentials(&self, credentials: Option<Credentials>) {
        self.session.write().await.credentials = credentials.unwrap_or_default();
    }

    pub async fn facades(&self) -> FacadeTable {
        self.session.read().await.facades.clone()
    }

    /// Replace the facade table. Normally only a login does this.
    pub async fn set_facades(&self, facades: FacadeTable) {
        self.session.write().await.facades = facades;
    }

    pub async fn find_facade_version(&self, name: &str, wanted: Option<u32>) -> Option<u32> {
        self.session.read().await.facades.find_version(name, wanted)
    }

    pub async fn auth_state(&self) -> AuthState {
        self.session.read().await.state
    }

    pub async fn failed_authentication(&self) -> bool {
        self.session.read().await.failed_authentication
    }

    pub async fn is_read_only(&self) -> bool {
        self.session.read().await.read_only
    }

    pub async fn server_version(&self) -> Option<String> {
        self.session.read().await.server_version.clone()
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Issue a typed call at the highest version both sides support.
    pub(crate) async fn call<C: FacadeCall>(&self, params: &C) -> Result<C::Response> {
        let version = self
            .session
            .read()
            .await
            .facades
            .negotiate(C::FACADE, C::VERSIONS)
            .ok_or(ClientError::FacadeNotSupported {
                facade: C::FACADE,
                versions: C::VERSIONS,
            })?;

        self.dispatcher.call(version, params).await
    }

    /// Keep the connection alive.
    pub async fn ping(&self) -> Result<()> {
        let params = serde_json::to_value(Ping::default()).map_err(ClientError::Encode)?;
        self.dispatcher
            .send(PINGER_FACADE, PING_METHOD, PING_VERSION, params)
            .await?
            .recv()
            .await?;
        debug!("Ping answered");
        Ok(())
    }

    /// Close the connection. Pending requests fail with
    /// [`ClientError::TransportClosed`].
    pub async fn close(&self) {
        info!("Closing controller connection");
        self.dispatcher.close().await;
        self.notify(SessionEvent::Closed);
    }
}

impl Drop for ControllerApi {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
