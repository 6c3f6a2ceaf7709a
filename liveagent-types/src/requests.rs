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

//! Request bodies and query parameters for the Live Agent REST API.

use serde::{Deserialize, Serialize};

use crate::data::{CustomDetail, Entity, NounWrapper};

/// Body for `POST /chat/rest/Visitor/Breadcrumb`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Breadcrumb {
    /// URL of the page the visitor is viewing.
    pub location: String,
}

/// Body for `POST /chat/rest/Chasitor/ChasitorInit`.
///
/// `organization_id`, `deployment_id`, `button_id` and `session_id` are
/// filled from the client configuration and the allocated session when left
/// empty.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChasitorInit {
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub deployment_id: String,
    #[serde(default)]
    pub button_id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Rules describing how the request is rerouted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub button_overrides: Vec<String>,
    pub screen_resolution: String,
    pub language: String,
    pub visitor_name: String,
    #[serde(default)]
    pub prechat_details: Vec<CustomDetail>,
    #[serde(default)]
    pub prechat_entities: Vec<Entity>,
    pub receive_queue_updates: bool,
    pub is_post: bool,
}

/// Body for `POST /chat/rest/Chasitor/ChasitorResyncState`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChasitorResyncState {
    pub organization_id: String,
}

/// Body for `POST /chat/rest/Chasitor/ChasitorSneakPeek`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChasitorSneakPeek {
    /// Position of this update within the chat.
    pub position: u64,
    /// Text currently in the visitor's input area.
    pub text: String,
}

/// Body for `POST /chat/rest/Chasitor/ChatEnd`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatEnd {
    pub reason: String,
}

impl ChatEnd {
    /// The visitor closed the chat.
    pub fn client() -> Self {
        Self {
            reason: "client".to_string(),
        }
    }
}

/// Body for `POST /chat/rest/Chasitor/ChatMessage`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub text: String,
}

/// Body for `POST /chat/rest/Chasitor/CustomEvent`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CustomEvent {
    /// Event type the agent side listens for.
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: String,
}

/// Body for `POST /chat/rest/System/MultiNoun`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MultiNoun {
    pub nouns: Vec<NounWrapper>,
}

/// Query for `GET /chat/rest/Visitor/Settings`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub button_ids: Vec<String>,
    /// Whether the visitor location is refreshed from the current page.
    pub update_breadcrumb: bool,
}
