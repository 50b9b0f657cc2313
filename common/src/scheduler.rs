use crate::model::{RunStatus, ScheduleInfo, ScheduleRun, ScheduleStatus};
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_url")]
    pub base_url: String,
    #[serde(default = "default_schedule_id")]
    pub schedule_id: String,
    pub api_key: Option<String>,
    #[serde(default = "default_logs_limit")]
    pub logs_limit: u32,
    #[serde(default = "default_refresh_delay")]
    pub trigger_refresh_delay_ms: u64,
    pub timeout_secs: Option<u64>,
}

fn default_scheduler_url() -> String { "http://localhost:3000/api/scheduler".to_string() }
fn default_schedule_id() -> String { crate::DEFAULT_SCHEDULE_ID.to_string() }
fn default_logs_limit() -> u32 { crate::SCHEDULE_LOG_LIMIT }
fn default_refresh_delay() -> u64 { crate::TRIGGER_REFRESH_DELAY_MS }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_url: default_scheduler_url(),
            schedule_id: default_schedule_id(),
            api_key: None,
            logs_limit: default_logs_limit(),
            trigger_refresh_delay_ms: default_refresh_delay(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSchedule {
    pub id: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub next_run_time: Option<String>,
    #[serde(default)]
    pub cron_expression: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Execution {
    pub id: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub executed_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub schedule: Option<RemoteSchedule>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogsEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub executions: Option<Vec<Execution>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActionEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl ScheduleInfo {
    pub fn from_remote(schedule: RemoteSchedule) -> Self {
        Self {
            id: schedule.id,
            status: if schedule.is_active { ScheduleStatus::Active } else { ScheduleStatus::Paused },
            next_run: schedule
                .next_run_time
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| crate::NOT_SCHEDULED.to_string()),
            cron_expression: schedule.cron_expression,
            timezone: schedule.timezone,
        }
    }
}

impl ScheduleRun {
    pub fn from_execution(exec: Execution) -> Self {
        Self {
            id: exec.id,
            status: if exec.success { RunStatus::Success } else { RunStatus::Failed },
            started_at: exec.executed_at.clone(),
            completed_at: exec.executed_at,
        }
    }
}

pub struct SchedulerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SchedulerClient {
    pub fn new(config: &SchedulerConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        Ok(Self {
            http: builder.build().context("Failed to build scheduler HTTP client")?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, schedule_id: &str, action: Option<&str>) -> String {
        match action {
            Some(action) => format!("{}/schedules/{}/{}", self.base_url, schedule_id, action),
            None => format!("{}/schedules/{}", self.base_url, schedule_id),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let request = match self.api_key {
            Some(ref key) => request.header("x-api-key", key),
            None => request,
        };
        let response = request.send().await.context("Scheduler request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Scheduler returned {}: {}", status, body));
        }

        response
            .json::<T>()
            .await
            .context("Failed to decode scheduler response")
    }

    pub async fn get_schedule(&self, schedule_id: &str) -> Result<ScheduleEnvelope> {
        self.send(self.http.get(self.url(schedule_id, None))).await
    }

    pub async fn pause(&self, schedule_id: &str) -> Result<ActionEnvelope> {
        self.send(self.http.post(self.url(schedule_id, Some("pause")))).await
    }

    pub async fn resume(&self, schedule_id: &str) -> Result<ActionEnvelope> {
        self.send(self.http.post(self.url(schedule_id, Some("resume")))).await
    }

    pub async fn trigger_now(&self, schedule_id: &str) -> Result<ActionEnvelope> {
        self.send(self.http.post(self.url(schedule_id, Some("trigger")))).await
    }

    pub async fn get_logs(&self, schedule_id: &str, limit: u32) -> Result<LogsEnvelope> {
        let request = self
            .http
            .get(self.url(schedule_id, Some("logs")))
            .query(&[("limit", limit)]);
        self.send(request).await
    }
}

/// Describe simple daily cron expressions in words. Anything else is
/// returned unchanged.
pub fn cron_to_human(expression: &str) -> String {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() != 5 || fields[2] != "*" || fields[3] != "*" {
        return expression.to_string();
    }

    let (minute, hour) = match (fields[0].parse::<u32>(), fields[1].parse::<u32>()) {
        (Ok(m), Ok(h)) if m < 60 && h < 24 => (m, h),
        _ => return expression.to_string(),
    };

    let days = match fields[4] {
        "*" => "Daily",
        "1-5" | "MON-FRI" => "Weekdays",
        "0,6" | "6,0" | "SAT,SUN" => "Weekends",
        _ => return expression.to_string(),
    };

    let (display_hour, suffix) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };

    format!("{} at {}:{:02} {}", days, display_hour, minute, suffix)
}
