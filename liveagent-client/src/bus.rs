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

//! Per-session event bus.
//!
//! One ordered broadcast channel carries every event of a chat session:
//! inbound messages from the poll loop, messages produced by the session's
//! own outbound calls, and errors. Subscribers either take the raw
//! [`Envelope`] stream or one of the typed sub-streams.
//!
//! The bus stays open until it carries a `ChatEnd`, a `ChatEnded` or a
//! terminal error. That event is delivered like any other, then the channel
//! closes and every subscriber's stream ends.
//!
//! # Example
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! let mut agent_lines = session.events().chat_message();
//! while let Some(line) = agent_lines.next().await {
//!     println!("{}: {}", line.name, line.text);
//! }
//! ```

use std::sync::Mutex;

use async_broadcast::{broadcast, InactiveReceiver, Receiver, Sender, TrySendError};
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use liveagent_types::messages;
use liveagent_types::{EventTag, Message};
use log::{debug, warn};

use crate::error::LiveAgentError;

/// Capacity of the event bus channel
pub const EVENT_BUS_CAPACITY: usize = 256;

/// An item on the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Message(Message),
    Error(LiveAgentError),
}

impl Envelope {
    /// Tag of a message envelope. Errors have none.
    pub fn tag(&self) -> Option<EventTag> {
        match self {
            Envelope::Message(message) => Some(message.tag()),
            Envelope::Error(_) => None,
        }
    }

    /// Whether this envelope is the last one the bus will carry.
    pub fn ends_stream(&self) -> bool {
        match self {
            Envelope::Message(message) => message.tag().ends_chat(),
            Envelope::Error(err) => err.is_terminal(),
        }
    }
}

/// Result of [`EventBus::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Handed to current subscribers; the bus stays open.
    Delivered,
    /// Handed to current subscribers and the bus closed behind it.
    Terminated,
    /// The bus was already closed; the envelope was discarded.
    Closed,
}

pub struct EventBus {
    sender: Sender<Envelope>,
    // Keeps the channel open while nobody is subscribed.
    _keepalive: InactiveReceiver<Envelope>,
    closed: Mutex<bool>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (mut sender, receiver) = broadcast(EVENT_BUS_CAPACITY);
        sender.set_overflow(true);
        sender.set_await_active(false);
        Self {
            sender,
            _keepalive: receiver.deactivate(),
            closed: Mutex::new(false),
        }
    }

    /// Publish one envelope. Never blocks: a lagging subscriber loses its
    /// oldest queued envelope instead.
    pub fn publish(&self, envelope: Envelope) -> PublishOutcome {
        let mut closed = self
            .closed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *closed {
            debug!("event bus closed, discarding {:?}", envelope.tag());
            return PublishOutcome::Closed;
        }

        let terminal = envelope.ends_stream();
        match self.sender.try_broadcast(envelope) {
            Ok(None) => {}
            Ok(Some(dropped)) => warn!("event bus full, dropped oldest {:?}", dropped.tag()),
            // No subscribers right now.
            Err(TrySendError::Inactive(_)) => {}
            Err(err) => warn!("event bus refused an envelope: {err}"),
        }

        if terminal {
            *closed = true;
            self.sender.close();
            PublishOutcome::Terminated
        } else {
            PublishOutcome::Delivered
        }
    }

    /// Close the bus without publishing anything. Idempotent.
    pub fn close(&self) {
        let mut closed = self
            .closed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *closed = true;
        self.sender.close();
    }

    pub fn is_closed(&self) -> bool {
        *self
            .closed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every envelope published from now on.
    pub fn subscribe(&self) -> Receiver<Envelope> {
        self.sender.new_receiver()
    }

    /// Messages carrying `tag`.
    pub fn subscribe_tag(&self, tag: EventTag) -> BoxStream<'static, Message> {
        self.subscribe()
            .filter_map(move |envelope| {
                future::ready(match envelope {
                    Envelope::Message(message) if message.tag() == tag => Some(message),
                    _ => None,
                })
            })
            .boxed()
    }

    /// Errors only.
    pub fn errors(&self) -> BoxStream<'static, LiveAgentError> {
        self.subscribe()
            .filter_map(|envelope| {
                future::ready(match envelope {
                    Envelope::Error(err) => Some(err),
                    Envelope::Message(_) => None,
                })
            })
            .boxed()
    }
}

macro_rules! typed_streams {
    ($($name:ident => $variant:ident($payload:ty);)*) => {
        impl EventBus {
            $(
                #[doc = concat!("Payloads of `", stringify!($variant), "` messages.")]
                pub fn $name(&self) -> BoxStream<'static, $payload> {
                    self.subscribe()
                        .filter_map(|envelope| {
                            future::ready(match envelope {
                                Envelope::Message(Message::$variant(payload)) => Some(payload),
                                _ => None,
                            })
                        })
                        .boxed()
                }
            )*
        }
    };
}

typed_streams! {
    availability => Availability(messages::Availability);
    agent_disconnect => AgentDisconnect(messages::AgentDisconnect);
    agent_typing => AgentTyping(messages::AgentTyping);
    agent_not_typing => AgentNotTyping(messages::AgentNotTyping);
    chasitor_session_data => ChasitorSessionData(messages::ChasitorSessionData);
    chat_ended => ChatEnded(messages::ChatEnded);
    chat_end => ChatEnd(messages::ChatEnd);
    chat_established => ChatEstablished(messages::ChatEstablished);
    chat_message => ChatMessage(messages::ChatMessage);
    chasitor_chat_message => ChasitorChatMessage(messages::ChatMessage);
    chat_request_fail => ChatRequestFail(messages::ChatRequestFail);
    chat_request_success => ChatRequestSuccess(messages::ChatRequestSuccess);
    chat_transferred => ChatTransferred(messages::ChatTransferred);
    custom_event => CustomEvent(messages::CustomEvent);
    new_visitor_breadcrumb => NewVisitorBreadcrumb(messages::NewVisitorBreadcrumb);
    queue_update => QueueUpdate(messages::QueueUpdate);
}
