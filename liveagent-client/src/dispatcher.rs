/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Outbound dispatcher.
//!
//! Every call against the Live Agent REST API goes through [`Dispatcher`].
//! It decides per [`CallKind`] which headers to attach, funnels queued calls
//! through a single FIFO slot so that at most one of them is in flight, and
//! bumps the outbound sequence only after a sequenced call succeeds.
//!
//! The long-poll retrieval and unscoped calls (availability, settings,
//! visitor id, breadcrumb) bypass the queue so they can overlap with a
//! queued call.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use liveagent_types::requests;
use liveagent_types::responses;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::config::LiveAgentConfig;
use crate::error::LiveAgentError;
use crate::session::SessionState;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};

/// How a call relates to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// No session headers; may run before a session exists.
    Unscoped,
    /// Carries affinity and session key.
    SessionScoped,
    /// Carries affinity, session key and a sequence number, and consumes
    /// that number on success.
    Sequenced,
}

/// An outbound Live Agent request.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// Availability check. Empty `ids` checks the configured button.
    Availability { ids: Vec<String> },
    Breadcrumb(requests::Breadcrumb),
    SessionId,
    ChasitorInit(requests::ChasitorInit),
    ResyncSession,
    ChasitorResyncState(requests::ChasitorResyncState),
    ChasitorTyping,
    ChasitorNotTyping,
    ChasitorSneakPeek(requests::ChasitorSneakPeek),
    ChatEnd(requests::ChatEnd),
    ChatMessage(requests::ChatMessage),
    CustomEvent(requests::CustomEvent),
    MultiNoun(requests::MultiNoun),
    /// Long-poll retrieval; the ack is read from the session at send time.
    Messages,
    Settings(requests::Settings),
    VisitorId,
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::Availability { .. }
            | Call::Breadcrumb(_)
            | Call::SessionId
            | Call::Settings(_)
            | Call::VisitorId => CallKind::Unscoped,
            Call::ResyncSession | Call::ChasitorResyncState(_) | Call::Messages => {
                CallKind::SessionScoped
            }
            Call::ChasitorInit(_)
            | Call::ChasitorTyping
            | Call::ChasitorNotTyping
            | Call::ChasitorSneakPeek(_)
            | Call::ChatEnd(_)
            | Call::ChatMessage(_)
            | Call::CustomEvent(_)
            | Call::MultiNoun(_) => CallKind::Sequenced,
        }
    }

    /// Whether the call waits for the session's single outbound slot.
    pub fn is_queued(&self) -> bool {
        match self.kind() {
            CallKind::Unscoped => false,
            CallKind::SessionScoped => !matches!(self, Call::Messages),
            CallKind::Sequenced => true,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Call::Availability { .. }
            | Call::SessionId
            | Call::ResyncSession
            | Call::Messages
            | Call::Settings(_)
            | Call::VisitorId => Method::Get,
            _ => Method::Post,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Call::Availability { .. } => "/chat/rest/Visitor/Availability",
            Call::Breadcrumb(_) => "/chat/rest/Visitor/Breadcrumb",
            Call::SessionId => "/chat/rest/System/SessionId",
            Call::ChasitorInit(_) => "/chat/rest/Chasitor/ChasitorInit",
            Call::ResyncSession => "/chat/rest/System/ResyncSession",
            Call::ChasitorResyncState(_) => "/chat/rest/Chasitor/ChasitorResyncState",
            Call::ChasitorTyping => "/chat/rest/Chasitor/ChasitorTyping",
            Call::ChasitorNotTyping => "/chat/rest/Chasitor/ChasitorNotTyping",
            Call::ChasitorSneakPeek(_) => "/chat/rest/Chasitor/ChasitorSneakPeek",
            Call::ChatEnd(_) => "/chat/rest/Chasitor/ChatEnd",
            Call::ChatMessage(_) => "/chat/rest/Chasitor/ChatMessage",
            Call::CustomEvent(_) => "/chat/rest/Chasitor/CustomEvent",
            Call::MultiNoun(_) => "/chat/rest/System/MultiNoun",
            Call::Messages => "/chat/rest/System/Messages",
            Call::Settings(_) => "/chat/rest/Visitor/Settings",
            Call::VisitorId => "/chat/rest/Visitor/VisitorId",
        }
    }

    fn query(&self, config: &LiveAgentConfig, state: &SessionState) -> Vec<(String, String)> {
        let deployment = || {
            vec![
                ("org_id".to_string(), config.organization_id.clone()),
                ("deployment_id".to_string(), config.deployment_id.clone()),
            ]
        };
        match self {
            Call::Availability { ids } => {
                let ids = if ids.is_empty() {
                    config.button_id.clone()
                } else {
                    ids.join(",")
                };
                let mut query = deployment();
                query.push(("Availability.ids".to_string(), ids));
                query
            }
            Call::Settings(settings) => {
                let mut query = deployment();
                query.push((
                    "Settings.buttonIds".to_string(),
                    settings.button_ids.join(","),
                ));
                query.push((
                    "Settings.updateBreadcrumb".to_string(),
                    settings.update_breadcrumb.to_string(),
                ));
                query
            }
            Call::VisitorId => deployment(),
            Call::Messages => vec![("ack".to_string(), state.inbound_ack().to_string())],
            Call::ResyncSession => vec![("sessionId".to_string(), state.session_id().to_string())],
            _ => Vec::new(),
        }
    }

    fn body(
        &self,
        config: &LiveAgentConfig,
        state: &SessionState,
    ) -> Result<Option<serde_json::Value>, serde_json::Error> {
        let body = match self {
            Call::Breadcrumb(body) => serde_json::to_value(body)?,
            Call::ChasitorInit(init) => {
                let mut init = init.clone();
                if init.organization_id.is_empty() {
                    init.organization_id = config.organization_id.clone();
                }
                if init.deployment_id.is_empty() {
                    init.deployment_id = config.deployment_id.clone();
                }
                if init.button_id.is_empty() {
                    init.button_id = config.button_id.clone();
                }
                if init.session_id.is_empty() {
                    init.session_id = state.session_id().to_string();
                }
                serde_json::to_value(init)?
            }
            Call::ChasitorResyncState(body) => serde_json::to_value(body)?,
            Call::ChasitorTyping | Call::ChasitorNotTyping => {
                serde_json::Value::Object(serde_json::Map::new())
            }
            Call::ChasitorSneakPeek(body) => serde_json::to_value(body)?,
            Call::ChatEnd(body) => serde_json::to_value(body)?,
            Call::ChatMessage(body) => serde_json::to_value(body)?,
            Call::CustomEvent(body) => serde_json::to_value(body)?,
            Call::MultiNoun(body) => serde_json::to_value(body)?,
            _ => return Ok(None),
        };
        Ok(Some(body))
    }
}

/// Serializes outbound calls against one session.
pub struct Dispatcher<T: HttpTransport> {
    config: LiveAgentConfig,
    transport: T,
    state: Arc<Mutex<SessionState>>,
    queue: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
    pending_replay: Mutex<Option<Call>>,
}

impl<T: HttpTransport> Dispatcher<T> {
    pub fn new(config: LiveAgentConfig, transport: T, cancel: CancellationToken) -> Self {
        Self {
            config,
            transport,
            state: Arc::new(Mutex::new(SessionState::default())),
            queue: tokio::sync::Mutex::new(()),
            cancel,
            pending_replay: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &LiveAgentConfig {
        &self.config
    }

    /// Snapshot of the session state.
    pub fn session(&self) -> SessionState {
        self.state().clone()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The sequenced call that was refused with 503, to be resent after a resync.
    pub(crate) fn take_pending_replay(&self) -> Option<Call> {
        self.pending_replay
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    /// Allocate a new session. Must be the first network call of a session;
    /// failures are returned as-is and never retried.
    pub async fn allocate_session(&self) -> Result<SessionState, LiveAgentError> {
        if self.state().is_established() {
            warn!("session already allocated, keeping the current one");
            return Ok(self.session());
        }
        let allocated: responses::SessionId = self.dispatch_json(Call::SessionId).await?;
        let mut state = self.state();
        state.establish(&allocated);
        info!(
            "allocated Live Agent session {} (poll timeout {}s)",
            state.session_id(),
            state.poll_timeout_secs()
        );
        Ok(state.clone())
    }

    /// Send `call` and return the raw response on a 2xx status.
    pub async fn dispatch(&self, call: Call) -> Result<HttpResponse, LiveAgentError> {
        if self.cancel.is_cancelled() {
            return Err(LiveAgentError::Cancelled);
        }
        let kind = call.kind();
        let _slot = if call.is_queued() {
            Some(self.queue.lock().await)
        } else {
            None
        };
        if self.cancel.is_cancelled() {
            return Err(LiveAgentError::Cancelled);
        }

        let (request, limit) = self.prepare(&call)?;
        debug!("-> {} {} ({:?})", call.path(), request_summary(&request), kind);

        let response = self.exchange(request, limit).await?;
        if response.is_success() {
            if kind == CallKind::Sequenced {
                self.state().advance_sequence();
            }
            debug!("<- {} {}", call.path(), response.status);
            return Ok(response);
        }

        let err = LiveAgentError::from_status(response.status, response.text());
        if err == LiveAgentError::AffinityRotated {
            warn!("affinity token rotated while calling {}", call.path());
            self.state().mark_affinity_rotated();
            if kind == CallKind::Sequenced {
                *self
                    .pending_replay
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(call);
            }
        } else {
            warn!("{} failed: {err}", call.path());
        }
        Err(err)
    }

    /// Send `call` and decode a JSON body.
    pub async fn dispatch_json<R: DeserializeOwned>(&self, call: Call) -> Result<R, LiveAgentError> {
        let response = self.dispatch(call).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Send `call` and decode a JSON body, treating 204 or an empty body as `None`.
    pub async fn dispatch_optional<R: DeserializeOwned>(
        &self,
        call: Call,
    ) -> Result<Option<R>, LiveAgentError> {
        let response = self.dispatch(call).await?;
        if response.status == 204 || response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&response.body)?))
    }

    /// Check preconditions and build the request from a consistent state snapshot.
    fn prepare(&self, call: &Call) -> Result<(HttpRequest, Option<Duration>), LiveAgentError> {
        let mut state = self.state();
        let headers = match call.kind() {
            CallKind::Unscoped => SessionState::unscoped_headers(),
            CallKind::SessionScoped => {
                if !state.is_established() {
                    return Err(LiveAgentError::SessionNotEstablished);
                }
                state.session_headers()
            }
            CallKind::Sequenced => {
                if !state.is_usable() {
                    return Err(LiveAgentError::SessionNotEstablished);
                }
                state.sequenced_headers()
            }
        };

        let body = call.body(&self.config, &state)?;
        if let Some(name) = body
            .as_ref()
            .and_then(|b| b.get("visitorName"))
            .and_then(|v| v.as_str())
        {
            state.record_visitor_name(name);
        }

        let limit = match call {
            Call::Messages if state.poll_timeout_secs() > 0 => {
                Some(Duration::from_secs(state.poll_timeout_secs()))
            }
            _ => None,
        };

        let request = HttpRequest {
            method: call.method(),
            path: call.path().to_string(),
            query: call.query(&self.config, &state),
            body,
            headers,
        };
        Ok((request, limit))
    }

    /// Run one exchange, abandoning it if the session is cancelled.
    async fn exchange(
        &self,
        request: HttpRequest,
        limit: Option<Duration>,
    ) -> Result<HttpResponse, LiveAgentError> {
        let exchange = async {
            match limit {
                Some(limit) => tokio::time::timeout(limit, self.transport.request(request))
                    .await
                    .unwrap_or(Err(TransportError::Timeout)),
                None => self.transport.request(request).await,
            }
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(LiveAgentError::Cancelled),
            result = exchange => Ok(result?),
        }
    }
}

fn request_summary(request: &HttpRequest) -> String {
    request
        .query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}
