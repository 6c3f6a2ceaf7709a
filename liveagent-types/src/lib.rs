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

//! Wire types for the Live Agent chat REST protocol.
//!
//! This crate defines the request bodies, response payloads and inbound
//! message envelopes exchanged with a Live Agent server. It carries no HTTP
//! client and no runtime; the session driver lives in `liveagent-client`.

pub mod data;
pub mod messages;
pub mod requests;
pub mod responses;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use messages::{EventTag, Message};

/// Header carrying the protocol revision on every request.
pub const HEADER_API_VERSION: &str = "X-LIVEAGENT-API-VERSION";

/// Header carrying the affinity token that pins a session to a server node.
pub const HEADER_AFFINITY: &str = "X-LIVEAGENT-AFFINITY";

/// Header carrying the session key returned by `SessionId`.
pub const HEADER_SESSION_KEY: &str = "X-LIVEAGENT-SESSION-KEY";

/// Header carrying the client-assigned sequence number of a state-changing call.
pub const HEADER_SEQUENCE: &str = "X-LIVEAGENT-SEQUENCE";

/// Affinity value sent before a session has been allocated.
pub const NULL_AFFINITY: &str = "null";

/// Supported revisions of the Live Agent REST protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ApiVersion {
    V30,
    V31,
    V32,
    V33,
    V34,
    V35,
    V36,
    V37,
    V38,
    V39,
    V40,
    V41,
    #[default]
    V42,
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 13] = [
        ApiVersion::V30,
        ApiVersion::V31,
        ApiVersion::V32,
        ApiVersion::V33,
        ApiVersion::V34,
        ApiVersion::V35,
        ApiVersion::V36,
        ApiVersion::V37,
        ApiVersion::V38,
        ApiVersion::V39,
        ApiVersion::V40,
        ApiVersion::V41,
        ApiVersion::V42,
    ];

    /// The value sent in [`HEADER_API_VERSION`].
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V30 => "30",
            ApiVersion::V31 => "31",
            ApiVersion::V32 => "32",
            ApiVersion::V33 => "33",
            ApiVersion::V34 => "34",
            ApiVersion::V35 => "35",
            ApiVersion::V36 => "36",
            ApiVersion::V37 => "37",
            ApiVersion::V38 => "38",
            ApiVersion::V39 => "39",
            ApiVersion::V40 => "40",
            ApiVersion::V41 => "41",
            ApiVersion::V42 => "42",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a supported protocol revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedVersion(pub String);

impl fmt::Display for UnsupportedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported Live Agent API version '{}'", self.0)
    }
}

impl std::error::Error for UnsupportedVersion {}

impl FromStr for ApiVersion {
    type Err = UnsupportedVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ApiVersion::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == trimmed)
            .ok_or_else(|| UnsupportedVersion(s.to_string()))
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // YAML and env sources may hand us either `42` or `"42"`.
        let raw = serde_json::Value::deserialize(deserializer)?;
        let text = match raw {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "expected API version, found {other}"
                )))
            }
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}
