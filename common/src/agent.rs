use crate::model::{AgentRunResult, Task};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_url")]
    pub url: String,
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
    #[serde(default = "default_message")]
    pub message: String,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

fn default_agent_url() -> String { "http://localhost:3000/api/agent".to_string() }
fn default_agent_id() -> String { crate::DEFAULT_AGENT_ID.to_string() }
fn default_message() -> String { crate::AGENT_MESSAGE.to_string() }

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            url: default_agent_url(),
            agent_id: default_agent_id(),
            message: default_message(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct AgentRequest<'a> {
    message: &'a str,
    agent_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<AgentResponse>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl AgentEnvelope {
    /// The nested result object, present only on a successful call.
    pub fn result(&self) -> Option<&Value> {
        if !self.success {
            return None;
        }
        self.response
            .as_ref()
            .and_then(|r| r.result.as_ref())
            .filter(|v| !v.is_null())
    }
}

pub struct AgentClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl AgentClient {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        Ok(Self {
            http: builder.build().context("Failed to build agent HTTP client")?,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Send an instruction to the agent and return the raw envelope.
    pub async fn call(&self, message: &str, agent_id: &str) -> Result<AgentEnvelope> {
        let mut request = self.http.post(&self.url).json(&AgentRequest { message, agent_id });
        if let Some(ref key) = self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Agent request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Agent returned {}: {}", status, body));
        }

        response
            .json::<AgentEnvelope>()
            .await
            .context("Failed to decode agent response")
    }
}

/// Build a run result from whatever the agent returned, defaulting every
/// field that is missing or of the wrong shape.
pub fn normalize_result(raw: &Value, now: DateTime<Utc>) -> AgentRunResult {
    let tasks = match raw.get("tasks") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match serde_json::from_value::<Task>(item.clone()) {
                Ok(task) => Some(task),
                Err(e) => {
                    log::warn!("Skipping malformed task from agent: {}", e);
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    let emails_processed = raw
        .get("emailsProcessed")
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)))
        .unwrap_or(0);

    let generated_at = raw
        .get("generatedAt")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| now.to_rfc3339());

    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string());

    AgentRunResult {
        tasks,
        emails_processed,
        generated_at,
        status,
    }
}
