//! Authentication state machine.
//!
//! `Unauthenticated -> Authenticating -> Authenticated`, falling back to
//! `Unauthenticated` on handshake failure or explicit invalidation. Every
//! outcome is published on the event bus as `AuthStatusChanged`.

use std::sync::Arc;

use pplx_common::{new_id, ChatError, Event, EventBus, Session};
use pplx_config::schema::ServiceConfig;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::store::SessionStore;
use crate::transport::{Transport, TransportRequest, TransportResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated(Session),
}

pub struct SessionManager {
    transport: Arc<dyn Transport>,
    store: SessionStore,
    service: ServiceConfig,
    state: RwLock<AuthState>,
    events: EventBus,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: SessionStore,
        service: ServiceConfig,
        events: EventBus,
    ) -> Self {
        Self {
            transport,
            store,
            service,
            state: RwLock::new(AuthState::Unauthenticated),
            events,
        }
    }

    /// Set up the transport. Idempotent; construction failures propagate.
    pub async fn initialize(&self) -> Result<(), ChatError> {
        self.transport.initialize().await
    }

    /// Adopt a previously persisted session if one exists.
    pub async fn load_session(&self) -> bool {
        match self.store.load() {
            Some(session) => {
                debug!(session_id = %session.session_id, "loaded stored session");
                self.transition(AuthState::Authenticated(session)).await;
                true
            }
            None => false,
        }
    }

    /// Perform the entry-page handshake and persist the resulting session.
    ///
    /// Failure is a normal `false` return, never an error.
    pub async fn create_session(&self) -> bool {
        *self.state.write().await = AuthState::Authenticating;

        match self.handshake().await {
            Ok(session) => {
                self.store.save(&session);
                info!(session_id = %session.session_id, "session created");
                self.transition(AuthState::Authenticated(session)).await;
                true
            }
            Err(reason) => {
                warn!("authentication failed: {reason}");
                self.transition(AuthState::Unauthenticated).await;
                false
            }
        }
    }

    /// Reuse a stored session, otherwise run a fresh handshake.
    pub async fn authenticate(&self) -> bool {
        if self.load_session().await {
            return true;
        }
        self.create_session().await
    }

    /// Drop the current session, in memory and in storage.
    pub async fn invalidate(&self) {
        self.store.clear();
        self.transition(AuthState::Unauthenticated).await;
        info!("session invalidated");
    }

    pub async fn active_session(&self) -> Option<Session> {
        match &*self.state.read().await {
            AuthState::Authenticated(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(*self.state.read().await, AuthState::Authenticated(_))
    }

    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    async fn transition(&self, next: AuthState) {
        let is_authenticated = matches!(next, AuthState::Authenticated(_));
        *self.state.write().await = next;
        self.events.publish(Event::AuthStatusChanged { is_authenticated });
    }

    async fn handshake(&self) -> Result<Session, String> {
        let request = TransportRequest::get(&self.service.base_url)
            .header("user-agent", &self.service.user_agent)
            .header("accept", "text/html,application/xhtml+xml");

        let response = self
            .transport
            .request(request)
            .await
            .map_err(|e| e.to_string())?;

        if response.status != 200 {
            return Err(format!("handshake returned HTTP {}", response.status));
        }

        let cookies = cookie_header(&response);
        if cookies.is_empty() {
            return Err("handshake response carried no cookies".into());
        }

        Ok(Session::new(cookies, &self.service.user_agent, new_id()))
    }
}

/// Collapse every `Set-Cookie` into a single `Cookie` request header value.
fn cookie_header(response: &TransportResponse) -> String {
    response
        .header_values("set-cookie")
        .filter_map(|raw| raw.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect::<Vec<_>>()
        .join("; ")
}
