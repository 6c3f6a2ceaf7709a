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

use std::fs;

use liveagent_types::ApiVersion;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::LiveAgentError;

pub const ENV_HOST: &str = "LIVEAGENT_HOST";
pub const ENV_API_VERSION: &str = "LIVEAGENT_API_VERSION";
pub const ENV_ORGANIZATION_ID: &str = "LIVEAGENT_ORGANIZATION_ID";
pub const ENV_DEPLOYMENT_ID: &str = "LIVEAGENT_DEPLOYMENT_ID";
pub const ENV_BUTTON_ID: &str = "LIVEAGENT_BUTTON_ID";

/// Connection settings for one Live Agent deployment.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LiveAgentConfig {
    /// Live Agent endpoint, e.g. `https://d.la1-c1-ord.salesforceliveagent.com`.
    pub host: String,
    #[serde(default)]
    pub version: ApiVersion,
    /// Salesforce organization that owns the deployment.
    pub organization_id: String,
    /// Deployment the chat request is initiated from.
    pub deployment_id: String,
    pub button_id: String,
}

impl LiveAgentConfig {
    pub fn from_file(path: &str) -> Result<Self, LiveAgentError> {
        let content = fs::read_to_string(path)
            .map_err(|e| LiveAgentError::Config(format!("cannot read {path}: {e}")))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, LiveAgentError> {
        let config: LiveAgentConfig = serde_yaml::from_str(content)
            .map_err(|e| LiveAgentError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `LIVEAGENT_CONFIG_PATH` if set, otherwise from the
    /// individual `LIVEAGENT_*` variables.
    pub fn from_env() -> Result<Self, LiveAgentError> {
        if let Ok(config_path) = std::env::var("LIVEAGENT_CONFIG_PATH") {
            return Self::from_file(&config_path);
        }

        let version = match std::env::var(ENV_API_VERSION) {
            Ok(raw) => raw
                .parse::<ApiVersion>()
                .map_err(|e| LiveAgentError::Config(e.to_string()))?,
            Err(_) => ApiVersion::default(),
        };

        let config = LiveAgentConfig {
            host: std::env::var(ENV_HOST).unwrap_or_default(),
            version,
            organization_id: std::env::var(ENV_ORGANIZATION_ID).unwrap_or_default(),
            deployment_id: std::env::var(ENV_DEPLOYMENT_ID).unwrap_or_default(),
            button_id: std::env::var(ENV_BUTTON_ID).unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Every option is required before any call can be made.
    pub fn validate(&self) -> Result<(), LiveAgentError> {
        let required = [
            ("host", &self.host),
            ("organization_id", &self.organization_id),
            ("deployment_id", &self.deployment_id),
            ("button_id", &self.button_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(LiveAgentError::Config(format!("{name} is required")));
            }
        }
        self.host_url()?;
        Ok(())
    }

    pub fn host_url(&self) -> Result<Url, LiveAgentError> {
        let url = Url::parse(&self.host)
            .map_err(|e| LiveAgentError::Config(format!("invalid host URL: {e:?}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(LiveAgentError::Config(format!(
                "host must be http(s), got '{other}'"
            ))),
        }
    }
}
