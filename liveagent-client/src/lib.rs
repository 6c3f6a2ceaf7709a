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

//! Visitor-side session driver for the Salesforce Live Agent REST chat API.
//!
//! A [`ChatSession`] allocates a session, requests a chat, and keeps a
//! long poll running against the server. Every inbound message, every
//! message produced by the visitor's own calls, and every error lands on one
//! ordered [`EventBus`] that can be consumed whole or per message type.
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use liveagent_client::{ChatSession, LiveAgentConfig};
//! use liveagent_client::liveagent_types::requests::ChasitorInit;
//!
//! # async fn example() -> Result<(), liveagent_client::LiveAgentError> {
//! let config = LiveAgentConfig::from_env()?;
//! let session = ChatSession::connect(config)?;
//! let mut agent_lines = session.events().chat_message();
//!
//! session
//!     .start(ChasitorInit {
//!         visitor_name: "Ada".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! session.chat_message("Hello!").await?;
//!
//! while let Some(line) = agent_lines.next().await {
//!     println!("{}: {}", line.name, line.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod poll;
pub mod session;
pub mod transport;

pub use bus::{Envelope, EventBus, PublishOutcome};
pub use config::LiveAgentConfig;
pub use dispatcher::{Call, CallKind, Dispatcher};
pub use driver::{ChatSession, SessionPhase};
pub use error::LiveAgentError;
pub use liveagent_types;
pub use poll::PollResponse;
pub use session::{SessionState, Visitor};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport, TransportError,
};
