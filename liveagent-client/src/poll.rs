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

//! Long-poll retrieval loop.
//!
//! The Live Agent server holds `GET /chat/rest/System/Messages` open until
//! it has events to deliver or its own timeout fires (204). Either way the
//! next request is issued straight away; there is no backoff.

use std::sync::Arc;

use futures::stream::{self, Stream};
use liveagent_types::responses::{self, RawMessage};
use liveagent_types::Message;
use log::{debug, info, warn};

use crate::dispatcher::{Call, Dispatcher};
use crate::error::LiveAgentError;
use crate::transport::HttpTransport;

/// One answered poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollResponse {
    pub events: Vec<Message>,
    /// Sequence to acknowledge on the next poll. Absent on 204.
    pub sequence: Option<i64>,
}

/// Endless stream of poll responses.
///
/// Nothing is sent until the stream is first polled. The stream yields the
/// first error it meets and then ends.
pub fn responses<T: HttpTransport>(
    dispatcher: Arc<Dispatcher<T>>,
) -> impl Stream<Item = Result<PollResponse, LiveAgentError>> + Send + 'static {
    stream::unfold(Some(dispatcher), |dispatcher| async move {
        let dispatcher = dispatcher?;
        match poll_once(&dispatcher).await {
            Ok(response) => Some((Ok(response), Some(dispatcher))),
            Err(err) => Some((Err(err), None)),
        }
    })
}

/// Issue a single retrieval call and fold its result into the session state.
pub async fn poll_once<T: HttpTransport>(
    dispatcher: &Dispatcher<T>,
) -> Result<PollResponse, LiveAgentError> {
    let batch: Option<responses::Messages> = dispatcher.dispatch_optional(Call::Messages).await?;
    let Some(batch) = batch else {
        debug!("poll returned no content");
        return Ok(PollResponse::default());
    };

    let events = classify(batch.messages);
    let mut state = dispatcher.state();
    if let Some(sequence) = batch.sequence {
        state.advance_ack(sequence);
    }
    let visitor_id = events.iter().find_map(|event| match event {
        Message::ChatRequestSuccess(success) => Some(success.visitor_id.as_str()),
        _ => None,
    });
    if let Some(id) = visitor_id {
        if state.record_visitor_id(id) {
            info!("visitor id {id} assigned");
        }
    }

    Ok(PollResponse {
        events,
        sequence: batch.sequence,
    })
}

/// Classify a raw batch, skipping messages this client does not understand.
pub(crate) fn classify(raw: Vec<RawMessage>) -> Vec<Message> {
    raw.into_iter()
        .filter_map(|raw| {
            let kind = raw.kind.clone();
            match Message::from_raw(raw) {
                Ok(message) => Some(message),
                Err(err) => {
                    warn!("skipping inbound {kind} message: {err}");
                    None
                }
            }
        })
        .collect()
}
