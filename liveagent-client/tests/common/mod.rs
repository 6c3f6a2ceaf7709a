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

//! Scripted in-memory Live Agent server.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use liveagent_client::liveagent_types::ApiVersion;
use liveagent_client::{
    HttpRequest, HttpResponse, HttpTransport, LiveAgentConfig, TransportError,
};
use serde_json::{json, Value};
use tokio::sync::Notify;

pub const SESSION_ID: &str = "/chat/rest/System/SessionId";
pub const CHASITOR_INIT: &str = "/chat/rest/Chasitor/ChasitorInit";
pub const MESSAGES: &str = "/chat/rest/System/Messages";
pub const CHAT_MESSAGE: &str = "/chat/rest/Chasitor/ChatMessage";
pub const CHAT_END: &str = "/chat/rest/Chasitor/ChatEnd";
pub const TYPING: &str = "/chat/rest/Chasitor/ChasitorTyping";
pub const NOT_TYPING: &str = "/chat/rest/Chasitor/ChasitorNotTyping";
pub const RESYNC_SESSION: &str = "/chat/rest/System/ResyncSession";
pub const RESYNC_STATE: &str = "/chat/rest/Chasitor/ChasitorResyncState";
pub const AVAILABILITY: &str = "/chat/rest/Visitor/Availability";
pub const BREADCRUMB: &str = "/chat/rest/Visitor/Breadcrumb";
pub const SETTINGS: &str = "/chat/rest/Visitor/Settings";
pub const VISITOR_ID: &str = "/chat/rest/Visitor/VisitorId";
pub const SNEAK_PEEK: &str = "/chat/rest/Chasitor/ChasitorSneakPeek";
pub const CUSTOM_EVENT: &str = "/chat/rest/Chasitor/CustomEvent";
pub const MULTI_NOUN: &str = "/chat/rest/System/MultiNoun";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config() -> LiveAgentConfig {
    LiveAgentConfig {
        host: "https://la.example.com".to_string(),
        version: ApiVersion::V42,
        organization_id: "ORG".to_string(),
        deployment_id: "DEP".to_string(),
        button_id: "BTN".to_string(),
    }
}

pub fn json_response(status: u16, body: Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status,
        body: serde_json::to_vec(&body).unwrap(),
    })
}

pub fn text_response(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status,
        body: body.as_bytes().to_vec(),
    })
}

pub fn ok() -> Result<HttpResponse, TransportError> {
    text_response(200, "OK")
}

pub fn no_content() -> Result<HttpResponse, TransportError> {
    text_response(204, "")
}

pub fn session_id(poll_timeout: u64) -> Result<HttpResponse, TransportError> {
    json_response(
        200,
        json!({
            "id": "S1",
            "key": "K1",
            "affinityToken": "A1",
            "clientPollTimeout": poll_timeout
        }),
    )
}

/// A poll batch: `(type, message)` pairs plus the sequence to ack.
pub fn batch(messages: &[(&str, Value)], sequence: i64) -> Result<HttpResponse, TransportError> {
    let messages: Vec<Value> = messages
        .iter()
        .map(|(kind, message)| json!({ "type": kind, "message": message }))
        .collect();
    json_response(
        200,
        json!({ "messages": messages, "sequence": sequence, "offset": 0 }),
    )
}

pub fn availability_response(available: bool) -> Result<HttpResponse, TransportError> {
    json_response(
        200,
        json!({
            "messages": [{
                "type": "Availability",
                "message": { "results": [{ "id": "BTN", "isAvailable": available }] }
            }]
        }),
    )
}

#[derive(Default)]
struct Script {
    routes: Mutex<HashMap<String, VecDeque<Result<HttpResponse, TransportError>>>>,
    requests: Mutex<Vec<HttpRequest>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
    pushed: Notify,
}

/// Replays queued responses per path and records every request.
///
/// A poll with nothing queued waits like an idle long poll until a poll
/// response is pushed. Any other unscripted call answers 404.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: &str, response: Result<HttpResponse, TransportError>) -> &Self {
        self.script
            .routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self.script.pushed.notify_waiters();
        self
    }

    /// Hold every request to `path` open until [`release`](Self::release).
    pub fn hold(&self, path: &str) {
        self.script
            .holds
            .lock()
            .unwrap()
            .insert(path.to_string(), Arc::new(Notify::new()));
    }

    /// Let one held request to `path` complete.
    pub fn release(&self, path: &str) {
        if let Some(gate) = self.script.holds.lock().unwrap().get(path) {
            gate.notify_one();
        }
    }

    fn pop(&self, path: &str) -> Option<Result<HttpResponse, TransportError>> {
        self.script
            .routes
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    /// Wait until at least `count` requests hit `path`.
    pub async fn wait_for(&self, path: &str, count: usize) -> Vec<HttpRequest> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let seen = self.requests_to(path);
                if seen.len() >= count {
                    return seen;
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {count} requests to {path}"))
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = request.path.clone();
        self.script.requests.lock().unwrap().push(request);

        let gate = self.script.holds.lock().unwrap().get(&path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if path != MESSAGES {
            return self
                .pop(&path)
                .unwrap_or_else(|| text_response(404, "unscripted"));
        }
        loop {
            let pushed = self.script.pushed.notified();
            if let Some(response) = self.pop(&path) {
                return response;
            }
            pushed.await;
        }
    }
}
