//! Latest ECS container agent release lookup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

const LATEST_RELEASE_URL: &str =
    "https://api.github.com/repos/aws/amazon-ecs-agent/releases/latest";

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// Fetches the version of the latest published ECS agent, e.g. `1.82.1`.
///
/// # Errors
/// Fails on any network, HTTP status or decoding error.
pub async fn latest_agent_version() -> Result<String> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("ecs-scope/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(5))
        .build()
        .context("Failed to build HTTP client")?;

    let body = client
        .get(LATEST_RELEASE_URL)
        .send()
        .await
        .context("Failed to query ECS agent releases")?
        .error_for_status()
        .context("ECS agent release query was rejected")?
        .text()
        .await
        .context("Failed to read ECS agent release response")?;

    parse_release(&body)
}

fn parse_release(body: &str) -> Result<String> {
    let release: Release =
        serde_json::from_str(body).context("Unexpected ECS agent release payload")?;
    Ok(release.tag_name.trim_start_matches('v').to_string())
}

/// How an instance's agent compares with the latest release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Latest,
    Outdated,
    Unknown,
}

impl AgentStatus {
    pub fn of(agent_version: Option<&str>, latest: Option<&str>) -> Self {
        match (agent_version, latest) {
            (Some(current), Some(latest)) if current.trim_start_matches('v') == latest => {
                AgentStatus::Latest
            }
            (Some(_), Some(_)) => AgentStatus::Outdated,
            _ => AgentStatus::Unknown,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            AgentStatus::Latest => "✅",
            AgentStatus::Outdated => "⚠️",
            AgentStatus::Unknown => "❓",
        }
    }
}
