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

//! Chat session driver.
//!
//! [`ChatSession`] owns one Live Agent chat from session allocation to its
//! end. It runs startup in order (allocate session, `ChasitorInit`, start
//! polling), pumps the poll loop into the [`EventBus`], and exposes the
//! visitor's outbound calls. Outbound calls publish their failures on the
//! bus as well as returning them; a few also publish a message on success.

use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use liveagent_types::data::NounWrapper;
use liveagent_types::messages;
use liveagent_types::requests::{self, ChasitorInit};
use liveagent_types::responses;
use liveagent_types::Message;
use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bus::{Envelope, EventBus, PublishOutcome};
use crate::config::LiveAgentConfig;
use crate::dispatcher::{Call, Dispatcher};
use crate::error::LiveAgentError;
use crate::poll;
use crate::session::SessionState;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Lifecycle of a [`ChatSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    SessionEstablished,
    ChatInitiated,
    Polling,
    /// The bus has closed. Terminal.
    Ended,
}

/// Parts shared with the poll task.
#[derive(Clone)]
struct Shared {
    bus: Arc<EventBus>,
    phase: Arc<watch::Sender<SessionPhase>>,
    cancel: CancellationToken,
}

impl Shared {
    fn emit(&self, envelope: Envelope) -> PublishOutcome {
        let outcome = self.bus.publish(envelope);
        if outcome == PublishOutcome::Terminated {
            self.finish();
        }
        outcome
    }

    fn finish(&self) {
        self.cancel.cancel();
        self.bus.close();
        if self.phase.send_replace(SessionPhase::Ended) != SessionPhase::Ended {
            info!("chat session ended");
        }
    }

    fn advance(&self, next: SessionPhase) {
        self.phase.send_if_modified(|phase| {
            if *phase == SessionPhase::Ended {
                return false;
            }
            *phase = next;
            true
        });
    }
}

struct Inner<T: HttpTransport> {
    dispatcher: Arc<Dispatcher<T>>,
    shared: Shared,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl<T: HttpTransport> Drop for Inner<T> {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
        let task = self
            .poll_task
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// A visitor-side Live Agent chat.
///
/// Cloning is cheap; clones drive the same session. Dropping the last clone
/// cancels in-flight calls and stops polling.
pub struct ChatSession<T: HttpTransport = ReqwestTransport> {
    inner: Arc<Inner<T>>,
}

impl<T: HttpTransport> Clone for ChatSession<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ChatSession<ReqwestTransport> {
    /// Create a session talking to `config.host` over HTTPS.
    pub fn connect(config: LiveAgentConfig) -> Result<Self, LiveAgentError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config.host, config.version);
        Self::new(config, transport)
    }
}

impl<T: HttpTransport> ChatSession<T> {
    pub fn new(config: LiveAgentConfig, transport: T) -> Result<Self, LiveAgentError> {
        config.validate()?;
        let cancel = CancellationToken::new();
        let (phase, _) = watch::channel(SessionPhase::Uninitialized);
        Ok(Self {
            inner: Arc::new(Inner {
                dispatcher: Arc::new(Dispatcher::new(config, transport, cancel.clone())),
                shared: Shared {
                    bus: Arc::new(EventBus::new()),
                    phase: Arc::new(phase),
                    cancel,
                },
                poll_task: Mutex::new(None),
                started: AtomicBool::new(false),
            }),
        })
    }

    /// The session's event bus. Subscribe before calling [`start`](Self::start)
    /// to see every event.
    pub fn events(&self) -> &EventBus {
        &self.inner.shared.bus
    }

    pub fn phase(&self) -> SessionPhase {
        *self.inner.shared.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.inner.shared.phase.subscribe()
    }

    /// Snapshot of the session state.
    pub fn session_state(&self) -> SessionState {
        self.inner.dispatcher.session()
    }

    pub fn config(&self) -> &LiveAgentConfig {
        self.inner.dispatcher.config()
    }

    /// Allocate a session, request a chat and start polling.
    ///
    /// Empty organization, deployment, button and session ids in `init` are
    /// filled in from the configuration and the allocated session. A failure
    /// in any step is published, ends the session and is returned.
    pub async fn start(&self, init: ChasitorInit) -> Result<SessionState, LiveAgentError> {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return Err(LiveAgentError::Config(
                "chat session was already started".to_string(),
            ));
        }
        let dispatcher = &self.inner.dispatcher;

        let state = match dispatcher.allocate_session().await {
            Ok(state) => state,
            Err(err) => return Err(self.abort_startup(err)),
        };
        self.inner.shared.advance(SessionPhase::SessionEstablished);
        debug!("session {} established", state.session_id());

        if let Err(err) = dispatcher.dispatch(Call::ChasitorInit(init)).await {
            return Err(self.abort_startup(err));
        }
        self.inner.shared.advance(SessionPhase::ChatInitiated);
        info!("chat requested for button {}", self.config().button_id);

        self.spawn_poll();
        self.inner.shared.advance(SessionPhase::Polling);
        Ok(dispatcher.session())
    }

    fn abort_startup(&self, err: LiveAgentError) -> LiveAgentError {
        error!("chat session startup failed: {err}");
        if err != LiveAgentError::Cancelled {
            self.inner.shared.emit(Envelope::Error(err.clone()));
        }
        self.inner.shared.finish();
        err
    }

    fn spawn_poll(&self) {
        let task = tokio::spawn(pump(
            Arc::clone(&self.inner.dispatcher),
            self.inner.shared.clone(),
        ));
        let previous = self
            .inner
            .poll_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Publish the failure of an outbound call.
    fn report<R>(&self, result: Result<R, LiveAgentError>) -> Result<R, LiveAgentError> {
        if let Err(err) = &result {
            if *err != LiveAgentError::Cancelled {
                self.inner.shared.emit(Envelope::Error(err.clone()));
            }
        }
        result
    }

    /// Check button or agent availability. Empty `ids` checks the configured
    /// button. The result is also published as an `Availability` message.
    pub async fn availability(
        &self,
        ids: Vec<String>,
    ) -> Result<messages::Availability, LiveAgentError> {
        let result = self.fetch_availability(ids).await;
        let availability = self.report(result)?;
        self.inner
            .shared
            .emit(Envelope::Message(Message::Availability(availability.clone())));
        Ok(availability)
    }

    async fn fetch_availability(
        &self,
        ids: Vec<String>,
    ) -> Result<messages::Availability, LiveAgentError> {
        let response: responses::Availability = self
            .inner
            .dispatcher
            .dispatch_json(Call::Availability { ids })
            .await?;
        poll::classify(response.messages)
            .into_iter()
            .find_map(|message| match message {
                Message::Availability(availability) => Some(availability),
                _ => None,
            })
            .ok_or_else(|| {
                LiveAgentError::Decode("availability response carried no results".to_string())
            })
    }

    /// Report the page the visitor is viewing.
    pub async fn breadcrumb(&self, location: &str) -> Result<(), LiveAgentError> {
        let call = Call::Breadcrumb(requests::Breadcrumb {
            location: location.to_string(),
        });
        let result = self.inner.dispatcher.dispatch(call).await.map(|_| ());
        self.report(result)
    }

    pub async fn chasitor_typing(&self) -> Result<(), LiveAgentError> {
        let result = self
            .inner
            .dispatcher
            .dispatch(Call::ChasitorTyping)
            .await
            .map(|_| ());
        self.report(result)
    }

    pub async fn chasitor_not_typing(&self) -> Result<(), LiveAgentError> {
        let result = self
            .inner
            .dispatcher
            .dispatch(Call::ChasitorNotTyping)
            .await
            .map(|_| ());
        self.report(result)
    }

    /// Show the agent what the visitor is typing before it is sent.
    pub async fn sneak_peek(&self, position: u64, text: &str) -> Result<(), LiveAgentError> {
        let call = Call::ChasitorSneakPeek(requests::ChasitorSneakPeek {
            position,
            text: text.to_string(),
        });
        let result = self.inner.dispatcher.dispatch(call).await.map(|_| ());
        self.report(result)
    }

    /// End the chat from the visitor's side. On success a `ChatEnd` message
    /// is published and the session ends.
    pub async fn chat_end(&self) -> Result<(), LiveAgentError> {
        let call = Call::ChatEnd(requests::ChatEnd::client());
        let result = self.inner.dispatcher.dispatch(call.clone()).await;
        self.report(result)?;
        self.on_success(&call);
        Ok(())
    }

    /// Send a chat line. On success the line is echoed on the bus as a
    /// `ChasitorChatMessage` carrying the visitor's name and id.
    pub async fn chat_message(&self, text: &str) -> Result<messages::ChatMessage, LiveAgentError> {
        let call = Call::ChatMessage(requests::ChatMessage {
            text: text.to_string(),
        });
        let result = self.inner.dispatcher.dispatch(call).await;
        self.report(result)?;
        Ok(self.echo(text))
    }

    /// Publish the `ChasitorChatMessage` for a delivered chat line.
    fn echo(&self, text: &str) -> messages::ChatMessage {
        let visitor = self.session_state().visitor().clone();
        let echo = messages::ChatMessage {
            name: visitor.name,
            text: text.to_string(),
            agent_id: visitor.id,
        };
        self.inner
            .shared
            .emit(Envelope::Message(Message::ChasitorChatMessage(echo.clone())));
        echo
    }

    /// Local effects of a call the server accepted.
    fn on_success(&self, call: &Call) {
        match call {
            Call::ChatEnd(_) => {
                self.inner
                    .shared
                    .emit(Envelope::Message(Message::ChatEnd(messages::ChatEnd {})));
            }
            Call::ChatMessage(sent) => {
                self.echo(&sent.text);
            }
            _ => {}
        }
    }

    pub async fn custom_event(&self, event_type: &str, data: &str) -> Result<(), LiveAgentError> {
        let call = Call::CustomEvent(requests::CustomEvent {
            event_type: event_type.to_string(),
            data: data.to_string(),
        });
        let result = self.inner.dispatcher.dispatch(call).await.map(|_| ());
        self.report(result)
    }

    /// Send several requests in one sequenced call.
    pub async fn multi_noun(&self, nouns: Vec<NounWrapper>) -> Result<(), LiveAgentError> {
        let call = Call::MultiNoun(requests::MultiNoun { nouns });
        let result = self.inner.dispatcher.dispatch(call).await.map(|_| ());
        self.report(result)
    }

    pub async fn settings(
        &self,
        settings: requests::Settings,
    ) -> Result<responses::Settings, LiveAgentError> {
        let result = self
            .inner
            .dispatcher
            .dispatch_json(Call::Settings(settings))
            .await;
        self.report(result)
    }

    pub async fn visitor_id(&self) -> Result<responses::VisitorId, LiveAgentError> {
        let result = self.inner.dispatcher.dispatch_json(Call::VisitorId).await;
        self.report(result)
    }

    /// Restore the chat visitor's state on the server after a resync.
    pub async fn resync_state(&self) -> Result<(), LiveAgentError> {
        let result = self.restore_state().await;
        self.report(result)
    }

    async fn restore_state(&self) -> Result<(), LiveAgentError> {
        let call = Call::ChasitorResyncState(requests::ChasitorResyncState {
            organization_id: self.config().organization_id.clone(),
        });
        self.inner.dispatcher.dispatch(call).await.map(|_| ())
    }

    /// Recover from an affinity rotation.
    ///
    /// Fetches a new session key and affinity token, restores the visitor's
    /// state, resends the sequenced call the server refused, and restarts
    /// polling from the current ack. A session the server reports as no
    /// longer valid fails with [`LiveAgentError::InvalidSession`], which ends
    /// it.
    pub async fn resync(&self) -> Result<SessionState, LiveAgentError> {
        let result = self.run_resync().await;
        self.report(result)
    }

    async fn run_resync(&self) -> Result<SessionState, LiveAgentError> {
        let dispatcher = &self.inner.dispatcher;
        if !dispatcher.session().is_established() {
            return Err(LiveAgentError::SessionNotEstablished);
        }

        let resynced: responses::ResyncSession =
            dispatcher.dispatch_json(Call::ResyncSession).await?;
        if !resynced.is_valid {
            return Err(LiveAgentError::InvalidSession(
                "session is no longer valid".to_string(),
            ));
        }
        dispatcher.state().apply_resync(&resynced);
        info!("session resynced with a new affinity token");

        self.restore_state().await?;
        if let Some(call) = dispatcher.take_pending_replay() {
            debug!("replaying {} after resync", call.path());
            dispatcher.dispatch(call.clone()).await?;
            self.on_success(&call);
        }
        if self.phase() == SessionPhase::Ended {
            info!("replayed call ended the chat");
            return Ok(dispatcher.session());
        }

        self.spawn_poll();
        self.inner.shared.advance(SessionPhase::Polling);
        Ok(dispatcher.session())
    }
}

/// Forward poll results onto the bus until the stream or the bus ends.
async fn pump<T: HttpTransport>(dispatcher: Arc<Dispatcher<T>>, shared: Shared) {
    let mut polls = pin!(poll::responses(dispatcher));
    while let Some(result) = polls.next().await {
        match result {
            Ok(response) => {
                for event in response.events {
                    if shared.emit(Envelope::Message(event)) != PublishOutcome::Delivered {
                        return;
                    }
                }
            }
            Err(LiveAgentError::Cancelled) => return,
            Err(err) => {
                if err == LiveAgentError::AffinityRotated {
                    warn!("polling suspended until the session is resynced");
                } else {
                    error!("polling stopped: {err}");
                }
                shared.emit(Envelope::Error(err));
                return;
            }
        }
    }
}
