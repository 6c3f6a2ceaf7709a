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

//! Response payloads for the Live Agent REST API.
//!
//! Unlike most REST APIs there is no common envelope: each resource returns
//! its own shape, and the long-poll resource (`System/Messages`) returns a
//! batch of tagged inbound messages plus an ack sequence.

use serde::{Deserialize, Serialize};

use crate::data::Button;

/// Response of `GET /chat/rest/System/SessionId`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionId {
    pub id: String,
    pub key: String,
    pub affinity_token: String,
    /// Seconds within which a `Messages` request must be answered before the
    /// connection is considered broken.
    #[serde(default)]
    pub client_poll_timeout: u64,
}

/// Response of `GET /chat/rest/System/ResyncSession`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResyncSession {
    pub is_valid: bool,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub affinity_token: String,
}

/// Response of `GET /chat/rest/Visitor/Settings`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Rate at which the visitor must ping to keep the visitor session alive.
    #[serde(default)]
    pub pingrate: u64,
    #[serde(default)]
    pub content_server_url: String,
    #[serde(default)]
    pub button: Vec<Button>,
}

/// Response of `GET /chat/rest/Visitor/VisitorId`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VisitorId {
    pub session_id: String,
}

/// Raw inbound message as it appears on the wire, before classification.
///
/// Kept loose so that one unknown `type` does not fail the whole batch.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RawMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: serde_json::Value,
}

/// Response of `GET /chat/rest/System/Messages` (200 only; 204 has no body).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Messages {
    #[serde(default)]
    pub messages: Vec<RawMessage>,
    /// Server-assigned sequence to acknowledge on the next poll.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
}

/// Response of `GET /chat/rest/Visitor/Availability`.
///
/// The server wraps the single `Availability` message in the same
/// `messages` list used by the long-poll resource.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Availability {
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}
