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

//! Inbound chat messages.
//!
//! Every event the server delivers through the long-poll resource is a
//! `{ "type": <tag>, "message": <payload> }` pair. [`Message`] is the closed
//! set of tags this client understands, each with its own payload struct.
//! Two tags are produced locally rather than by the server:
//! [`Message::ChasitorChatMessage`] (echo of a message the visitor sent) and
//! [`Message::ChatEnd`] (the visitor ended the chat).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{AvailabilityResult, CustomDetail, GeoLocation, TranscriptEntry};
use crate::responses::RawMessage;

/// Discriminant of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTag {
    Availability,
    AgentDisconnect,
    AgentTyping,
    AgentNotTyping,
    ChasitorSessionData,
    ChatEnded,
    ChatEnd,
    ChatEstablished,
    ChatMessage,
    ChasitorChatMessage,
    ChatRequestFail,
    ChatRequestSuccess,
    ChatTransferred,
    CustomEvent,
    NewVisitorBreadcrumb,
    QueueUpdate,
}

impl EventTag {
    pub const ALL: [EventTag; 16] = [
        EventTag::Availability,
        EventTag::AgentDisconnect,
        EventTag::AgentTyping,
        EventTag::AgentNotTyping,
        EventTag::ChasitorSessionData,
        EventTag::ChatEnded,
        EventTag::ChatEnd,
        EventTag::ChatEstablished,
        EventTag::ChatMessage,
        EventTag::ChasitorChatMessage,
        EventTag::ChatRequestFail,
        EventTag::ChatRequestSuccess,
        EventTag::ChatTransferred,
        EventTag::CustomEvent,
        EventTag::NewVisitorBreadcrumb,
        EventTag::QueueUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventTag::Availability => "Availability",
            EventTag::AgentDisconnect => "AgentDisconnect",
            EventTag::AgentTyping => "AgentTyping",
            EventTag::AgentNotTyping => "AgentNotTyping",
            EventTag::ChasitorSessionData => "ChasitorSessionData",
            EventTag::ChatEnded => "ChatEnded",
            EventTag::ChatEnd => "ChatEnd",
            EventTag::ChatEstablished => "ChatEstablished",
            EventTag::ChatMessage => "ChatMessage",
            EventTag::ChasitorChatMessage => "ChasitorChatMessage",
            EventTag::ChatRequestFail => "ChatRequestFail",
            EventTag::ChatRequestSuccess => "ChatRequestSuccess",
            EventTag::ChatTransferred => "ChatTransferred",
            EventTag::CustomEvent => "CustomEvent",
            EventTag::NewVisitorBreadcrumb => "NewVisitorBreadcrumb",
            EventTag::QueueUpdate => "QueueUpdate",
        }
    }

    /// Whether this tag ends the chat, locally or from the agent side.
    pub fn ends_chat(&self) -> bool {
        matches!(self, EventTag::ChatEnd | EventTag::ChatEnded)
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability results for the requested buttons or agents.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Availability {
    pub results: Vec<AvailabilityResult>,
}

/// The agent dropped out. The chat stays open on the server and another
/// agent may pick it up.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct AgentDisconnect {}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct AgentTyping {}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct AgentNotTyping {}

/// Session data restored after a resync. It is the first message delivered
/// once `ResyncSession` succeeds.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChasitorSessionData {
    pub queue_position: i64,
    pub geo_location: GeoLocation,
    pub url: String,
    pub oref: String,
    pub post_chat_url: String,
    pub sneak_peek_enabled: bool,
    pub chat_messages: Vec<TranscriptEntry>,
}

/// The agent ended the chat.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatEnded {
    pub attached_records: Vec<String>,
}

/// The visitor ended the chat.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ChatEnd {}

/// An agent accepted the chat request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatEstablished {
    pub name: String,
    pub user_id: String,
    pub sneak_peek_enabled: bool,
    /// Idle time-out settings; the shape differs between protocol revisions.
    pub chasitor_idle_timeout: serde_json::Value,
}

/// A chat line. Used for both agent messages and echoed visitor messages.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatMessage {
    pub name: String,
    pub text: String,
    pub agent_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRequestFail {
    /// e.g. no agents available, or an internal error.
    pub reason: String,
    pub post_chat_url: String,
}

/// The request was routed to agents. The chat is not accepted until
/// [`ChatEstablished`] arrives.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRequestSuccess {
    pub queue_position: i64,
    pub geo_location: GeoLocation,
    pub url: String,
    pub oref: String,
    pub post_chat_url: String,
    pub custom_details: Vec<CustomDetail>,
    pub visitor_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatTransferred {
    pub name: String,
    pub user_id: String,
    pub sneak_peek_enabled: bool,
    pub chasitor_idle_timeout: serde_json::Value,
}

/// A custom event sent by the agent.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CustomEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct NewVisitorBreadcrumb {
    pub location: String,
}

/// The visitor moved in the chat queue.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct QueueUpdate {
    pub position: i64,
}

/// A classified inbound (or locally produced) chat event.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "message")]
pub enum Message {
    Availability(Availability),
    AgentDisconnect(AgentDisconnect),
    AgentTyping(AgentTyping),
    AgentNotTyping(AgentNotTyping),
    ChasitorSessionData(ChasitorSessionData),
    ChatEnded(ChatEnded),
    ChatEnd(ChatEnd),
    ChatEstablished(ChatEstablished),
    ChatMessage(ChatMessage),
    ChasitorChatMessage(ChatMessage),
    ChatRequestFail(ChatRequestFail),
    ChatRequestSuccess(ChatRequestSuccess),
    ChatTransferred(ChatTransferred),
    CustomEvent(CustomEvent),
    NewVisitorBreadcrumb(NewVisitorBreadcrumb),
    QueueUpdate(QueueUpdate),
}

impl Message {
    pub fn tag(&self) -> EventTag {
        match self {
            Message::Availability(_) => EventTag::Availability,
            Message::AgentDisconnect(_) => EventTag::AgentDisconnect,
            Message::AgentTyping(_) => EventTag::AgentTyping,
            Message::AgentNotTyping(_) => EventTag::AgentNotTyping,
            Message::ChasitorSessionData(_) => EventTag::ChasitorSessionData,
            Message::ChatEnded(_) => EventTag::ChatEnded,
            Message::ChatEnd(_) => EventTag::ChatEnd,
            Message::ChatEstablished(_) => EventTag::ChatEstablished,
            Message::ChatMessage(_) => EventTag::ChatMessage,
            Message::ChasitorChatMessage(_) => EventTag::ChasitorChatMessage,
            Message::ChatRequestFail(_) => EventTag::ChatRequestFail,
            Message::ChatRequestSuccess(_) => EventTag::ChatRequestSuccess,
            Message::ChatTransferred(_) => EventTag::ChatTransferred,
            Message::CustomEvent(_) => EventTag::CustomEvent,
            Message::NewVisitorBreadcrumb(_) => EventTag::NewVisitorBreadcrumb,
            Message::QueueUpdate(_) => EventTag::QueueUpdate,
        }
    }

    /// Classify a raw wire message. Fails for tags outside [`EventTag`] and
    /// for payloads that do not match their tag.
    pub fn from_raw(raw: RawMessage) -> Result<Self, serde_json::Error> {
        let payload = if raw.message.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            raw.message
        };
        serde_json::from_value(serde_json::json!({
            "type": raw.kind,
            "message": payload,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(kind: &str, message: serde_json::Value) -> RawMessage {
        RawMessage {
            kind: kind.to_string(),
            message,
        }
    }

    #[test]
    fn classifies_chat_request_success() {
        let message = Message::from_raw(raw(
            "ChatRequestSuccess",
            json!({ "queuePosition": 2, "visitorId": "V1", "customDetails": [] }),
        ))
        .unwrap();
        match message {
            Message::ChatRequestSuccess(payload) => {
                assert_eq!(payload.visitor_id, "V1");
                assert_eq!(payload.queue_position, 2);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn empty_payload_tags_accept_null_message() {
        let message = Message::from_raw(raw("AgentTyping", serde_json::Value::Null)).unwrap();
        assert_eq!(message.tag(), EventTag::AgentTyping);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let result = Message::from_raw(raw("ChasitorIdleTimeoutWarningEvent", json!({})));
        assert!(result.is_err());
    }

    #[test]
    fn every_tag_round_trips_its_name() {
        for tag in EventTag::ALL {
            let encoded = serde_json::to_value(tag).unwrap();
            assert_eq!(encoded, json!(tag.as_str()));
        }
    }

    #[test]
    fn only_chat_end_tags_end_the_chat() {
        let enders: Vec<_> = EventTag::ALL.iter().filter(|t| t.ends_chat()).collect();
        assert_eq!(enders, vec![&EventTag::ChatEnded, &EventTag::ChatEnd]);
    }

    #[test]
    fn chat_ended_carries_attached_records() {
        let message =
            Message::from_raw(raw("ChatEnded", json!({ "attachedRecords": ["500xx"] }))).unwrap();
        assert_eq!(
            message,
            Message::ChatEnded(ChatEnded {
                attached_records: vec!["500xx".to_string()]
            })
        );
    }
}
