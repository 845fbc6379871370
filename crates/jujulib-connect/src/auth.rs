//! Login handshake: password and macaroon logins, discharge round-trip.

use crate::controller::ControllerApi;
use crate::error::{ClientError, ErrorKind, Result};
use crate::session::{AuthState, Credentials, SessionEvent};
use async_trait::async_trait;
use jujulib_wire::calls::{LoginRequest, LoginResult, ADMIN_FACADE, LOGIN_METHOD, LOGIN_VERSION};
use jujulib_wire::{Macaroon, UserTag};
use tracing::{debug, info, warn};

/// Discharges third-party caveats on a macaroon the controller handed back.
#[async_trait]
pub trait Bakery: Send + Sync {
    /// Return the discharged macaroon set, or a reason for failing.
    async fn discharge(&self, macaroon: Macaroon) -> std::result::Result<Vec<Macaroon>, String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// No usable credentials were stored; nothing was sent
    Skipped,
    Authenticated,
}

/// What the accepted login request carried.
enum Sent {
    Password,
    Macaroons(Option<Vec<Macaroon>>),
}

impl ControllerApi {
    /// Log in with the stored credentials.
    ///
    /// A user/password pair takes precedence over stored macaroons. Without
    /// usable credentials this returns [`LoginOutcome::Skipped`] and sends
    /// nothing.
    pub async fn login(&self) -> Result<LoginOutcome> {
        let (request, sent) = {
            let mut session = self.session.write().await;
            if session.state.is_pending() {
                return Err(ClientError::LoginInProgress);
            }

            let creds = &session.credentials;
            if !creds.are_available() {
                debug!("Skipping login: no credentials");
                return Ok(LoginOutcome::Skipped);
            }

            let login = if !creds.user.is_empty() && !creds.password.is_empty() {
                let tag = UserTag::parse(&creds.user)?;
                (
                    LoginRequest::password(tag.to_string(), creds.password.clone()),
                    Sent::Password,
                )
            } else {
                (
                    LoginRequest::macaroons(creds.macaroons.clone()),
                    Sent::Macaroons(creds.macaroons.clone()),
                )
            };

            session.state = AuthState::LoginPending;
            login
        };

        let result = match self.send_login(&request).await {
            Ok(result) => result,
            Err(e) => return Err(self.fail_login(e).await),
        };

        self.complete_login(result, sent).await?;
        Ok(LoginOutcome::Authenticated)
    }

    /// Log in with macaroons, discharging through `bakery` if the controller
    /// asks for it.
    ///
    /// The first request carries the stored macaroons (or none). A
    /// `discharge-required` answer triggers one discharge and one retry with
    /// the discharged set; a second demand is not honoured.
    pub async fn login_with_macaroon(&self, bakery: &dyn Bakery) -> Result<()> {
        let stored = {
            let mut session = self.session.write().await;
            if session.state.is_pending() {
                debug!("Not logging in: a login is already pending");
                return Err(ClientError::LoginInProgress);
            }
            session.state = AuthState::LoginPending;
            session.credentials.macaroons.clone()
        };

        let request = LoginRequest::macaroons(stored.clone());
        let mut result = match self.send_login(&request).await {
            Ok(result) => result,
            Err(e) => return Err(self.fail_login(e).await),
        };

        let mut sent = stored;
        if let Some(macaroon) = result.discharge_required.take() {
            debug!("Controller requires a macaroon discharge");
            self.set_auth_state(AuthState::DischargePending).await;

            let discharged = match bakery.discharge(macaroon).await {
                Ok(discharged) => discharged,
                Err(reason) => return Err(self.fail_login(ClientError::Discharge(reason)).await),
            };

            // The discharged set reaches the session only with an accepted login.
            self.set_auth_state(AuthState::LoginPending).await;

            let retry = LoginRequest::macaroons(Some(discharged.clone()));
            result = match self.send_login(&retry).await {
                Ok(result) => result,
                Err(e) => return Err(self.fail_login(e).await),
            };
            sent = Some(discharged);
        }

        self.complete_login(result, Sent::Macaroons(sent)).await
    }

    async fn send_login(&self, request: &LoginRequest) -> Result<LoginResult> {
        let params = serde_json::to_value(request).map_err(ClientError::Encode)?;
        let reply = self
            .dispatcher
            .send(ADMIN_FACADE, LOGIN_METHOD, LOGIN_VERSION, params)
            .await?
            .recv()
            .await?;

        serde_json::from_value(reply).map_err(|source| ClientError::Decode {
            method: LOGIN_METHOD,
            source,
        })
    }

    async fn set_auth_state(&self, state: AuthState) {
        self.session.write().await.state = state;
    }

    /// Apply an accepted login to the session in one write.
    async fn complete_login(&self, result: LoginResult, sent: Sent) -> Result<()> {
        let Some(user_info) = result.user_info else {
            let err = ClientError::Authentication("use a proper Juju 2 release".to_string());
            return Err(self.fail_login(err).await);
        };

        let identity = user_info
            .identity
            .as_deref()
            .filter(|identity| !identity.is_empty())
            .map(UserTag::parse)
            .transpose();
        let identity = match identity {
            Ok(identity) => identity,
            Err(e) => {
                let err = ClientError::Authentication(format!("invalid identity: {}", e));
                return Err(self.fail_login(err).await);
            }
        };

        {
            let mut session = self.session.write().await;
            if let Some(tag) = identity {
                session.credentials.user = tag.to_string();
            }
            if let Sent::Macaroons(macaroons) = sent {
                session.credentials.password.clear();
                if macaroons.is_some() {
                    session.credentials.macaroons = macaroons;
                }
            }
            session.facades = result.facades.into_iter().collect();
            session.failed_authentication = false;
            session.read_only = user_info.read_only;
            session.server_version = result.server_version;
            session.state = AuthState::Authenticated;

            info!(
                "Logged in as {} ({} facades)",
                session.credentials.user,
                session.facades.len()
            );
        }

        self.notify(SessionEvent::Login { result: true });
        Ok(())
    }

    /// Record a failed attempt and return the error to hand to the caller.
    ///
    /// Rejections wipe the credentials and mark the session as failed.
    /// Transport and codec failures only release the login guard.
    async fn fail_login(&self, err: ClientError) -> ClientError {
        let err = match err {
            ClientError::Remote(remote) => ClientError::Authentication(remote.message),
            other => other,
        };

        let mut session = self.session.write().await;
        if err.kind() == ErrorKind::Authentication {
            warn!("Login failed: {}", err);
            session.credentials = Credentials::default();
            session.failed_authentication = true;
            session.state = AuthState::Failed;
            drop(session);
            self.notify(SessionEvent::Login { result: false });
        } else {
            debug!("Login interrupted: {}", err);
            session.state = AuthState::Unauthenticated;
        }

        err
    }
}
