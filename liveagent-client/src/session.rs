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

//! Per-session bookkeeping: identity, affinity, sequence and ack cursors.
//!
//! [`SessionState`] is owned by the session driver and shared with exactly
//! two writers: the dispatcher (outbound sequence, affinity, visitor name)
//! and the poll loop (inbound ack, visitor id). Mutators are crate-private so
//! applications can only read snapshots.

use liveagent_types::responses::{ResyncSession, SessionId};
use liveagent_types::{HEADER_AFFINITY, HEADER_SEQUENCE, HEADER_SESSION_KEY, NULL_AFFINITY};

/// First sequence number of a new session.
pub const INITIAL_SEQUENCE: u64 = 1;

/// Ack value sent before any poll response has been received.
pub const NO_ACK: i64 = -1;

/// The chat visitor, discovered lazily during the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visitor {
    /// Set from the first `ChatRequestSuccess` message.
    pub id: String,
    /// Set from the `visitorName` of an outbound request.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    session_id: String,
    session_key: String,
    affinity_token: String,
    poll_timeout_secs: u64,
    outbound_sequence: u64,
    inbound_ack: i64,
    visitor: Visitor,
    affinity_rotated: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            session_key: String::new(),
            affinity_token: String::new(),
            poll_timeout_secs: 0,
            outbound_sequence: INITIAL_SEQUENCE,
            inbound_ack: NO_ACK,
            visitor: Visitor::default(),
            affinity_rotated: false,
        }
    }
}

impl SessionState {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn affinity_token(&self) -> &str {
        &self.affinity_token
    }

    /// Seconds a poll may stay unanswered; `0` means no client-side limit.
    pub fn poll_timeout_secs(&self) -> u64 {
        self.poll_timeout_secs
    }

    /// Sequence number the next sequenced call will carry.
    pub fn outbound_sequence(&self) -> u64 {
        self.outbound_sequence
    }

    pub fn inbound_ack(&self) -> i64 {
        self.inbound_ack
    }

    pub fn visitor(&self) -> &Visitor {
        &self.visitor
    }

    /// A session was allocated. Stays true through an affinity rotation.
    pub fn is_established(&self) -> bool {
        !self.session_id.is_empty() && !self.session_key.is_empty()
    }

    /// Established and not waiting for a resync.
    pub fn is_usable(&self) -> bool {
        self.is_established() && !self.affinity_rotated
    }

    pub fn is_affinity_rotated(&self) -> bool {
        self.affinity_rotated
    }

    /// Affinity and session key headers for a session-scoped call.
    pub(crate) fn session_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (HEADER_AFFINITY, self.affinity_token.clone()),
            (HEADER_SESSION_KEY, self.session_key.clone()),
        ]
    }

    /// Headers for a sequenced call: session headers plus the current sequence.
    pub(crate) fn sequenced_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = self.session_headers();
        headers.push((HEADER_SEQUENCE, self.outbound_sequence.to_string()));
        headers
    }

    /// Headers for calls that carry no session.
    pub(crate) fn unscoped_headers() -> Vec<(&'static str, String)> {
        vec![(HEADER_AFFINITY, NULL_AFFINITY.to_string())]
    }

    pub(crate) fn establish(&mut self, allocated: &SessionId) {
        self.session_id = allocated.id.clone();
        self.session_key = allocated.key.clone();
        self.affinity_token = allocated.affinity_token.clone();
        self.poll_timeout_secs = allocated.client_poll_timeout;
        self.affinity_rotated = false;
    }

    /// Install the key and affinity token handed out by `ResyncSession`.
    pub(crate) fn apply_resync(&mut self, resynced: &ResyncSession) {
        self.session_key = resynced.key.clone();
        self.affinity_token = resynced.affinity_token.clone();
        self.affinity_rotated = false;
    }

    pub(crate) fn mark_affinity_rotated(&mut self) {
        self.affinity_rotated = true;
    }

    pub(crate) fn advance_sequence(&mut self) {
        self.outbound_sequence += 1;
    }

    /// Move the ack cursor forward. Older sequences are ignored.
    pub(crate) fn advance_ack(&mut self, sequence: i64) -> bool {
        if sequence > self.inbound_ack {
            self.inbound_ack = sequence;
            true
        } else {
            false
        }
    }

    /// Record the visitor id once; later calls are no-ops.
    pub(crate) fn record_visitor_id(&mut self, id: &str) -> bool {
        if self.visitor.id.is_empty() && !id.is_empty() {
            self.visitor.id = id.to_string();
            true
        } else {
            false
        }
    }

    pub(crate) fn record_visitor_name(&mut self, name: &str) {
        self.visitor.name = name.to_string();
    }
}
