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

//! Data types shared between requests, responses and inbound messages.

use serde::{Deserialize, Serialize};

/// Kind of chat button configured on the deployment.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ButtonType {
    Standard,
    Invite,
    ToAgent,
}

/// Settings for a single chat button, returned by `Settings`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub id: String,
    #[serde(rename = "type")]
    pub button_type: ButtonType,
    /// URL of the custom chat window assigned to the button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    /// URL of the pre-chat form assigned to the button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prechat_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_image_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_image_height: Option<u32>,
    /// Animation of the automated invitation (`Slide`, `Fade`, `Appear`, `Custom`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_renderer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_start_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_end_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_invite_after_accept: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_invite_after_reject: Option<bool>,
    /// Seconds before an unanswered invitation is rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_reject_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_rules: Option<serde_json::Value>,
}

/// A pre-chat detail shown to the agent and saved on the transcript.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustomDetail {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub transcript_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_to_agent: Option<bool>,
}

/// A record to search for or create when the chat begins.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub entity_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_on_create: Option<bool>,
    #[serde(default)]
    pub entity_fields_maps: Vec<EntityFieldMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_to_entity_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_to_entity_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_to_transcript: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntityFieldMap {
    pub field_name: String,
    pub label: String,
    pub do_find: bool,
    pub is_exact_match: bool,
    pub do_create: bool,
}

/// Visitor location derived from the request IP.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    /// ISO 3166-1 alpha-2 country code.
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// One request folded into a `MultiNoun` batch.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NounWrapper {
    pub prefix: String,
    pub noun: String,
    /// JSON-encoded body of the wrapped request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Availability of a single agent or button.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResult {
    pub id: String,
    #[serde(default)]
    pub is_available: bool,
}

/// Who authored a transcript line.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptEntryType {
    Agent,
    Chasitor,
    OperatorTransferred,
}

/// A line of the chat transcript restored after a resync.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    #[serde(rename = "type")]
    pub entry_type: TranscriptEntryType,
    pub name: String,
    pub content: String,
    pub timestamp: i64,
    pub sequence: i64,
}
