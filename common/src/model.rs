use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    Medium,
    Low,
    Other(String),
}

impl From<String> for Priority {
    fn from(label: String) -> Self {
        match label.as_str() {
            "High" => Priority::High,
            "Medium" => Priority::Medium,
            "Low" => Priority::Low,
            _ => Priority::Other(label),
        }
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.to_string()
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Other(String::new())
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
            Priority::Other(label) => write!(f, "{}", label),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEmail {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
}

/// One action item extracted by the agent from a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(rename = "sourceEmail", default, skip_serializing_if = "Option::is_none")]
    pub source_email: Option<SourceEmail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl Task {
    pub fn subject_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.source_email
            .as_ref()
            .and_then(|s| s.subject.as_deref())
            .unwrap_or(default)
    }

    pub fn sender_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.source_email
            .as_ref()
            .and_then(|s| s.sender.as_deref())
            .unwrap_or(default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRunResult {
    pub tasks: Vec<Task>,
    pub emails_processed: u64,
    pub generated_at: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub emails_processed: u64,
    #[serde(default)]
    pub status: String,
}

impl From<&AgentRunResult> for HistoryEntry {
    fn from(run: &AgentRunResult) -> Self {
        Self {
            date: run.generated_at.clone(),
            tasks: run.tasks.clone(),
            emails_processed: run.emails_processed,
            status: run.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Active,
    Paused,
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleStatus::Active => write!(f, "active"),
            ScheduleStatus::Paused => write!(f, "paused"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleInfo {
    pub id: String,
    pub status: ScheduleStatus,
    /// Timestamp of the next run, or the literal `Not scheduled`.
    pub next_run: String,
    pub cron_expression: Option<String>,
    pub timezone: Option<String>,
}

impl ScheduleInfo {
    pub fn is_active(&self) -> bool {
        self.status == ScheduleStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRun {
    pub id: String,
    pub status: RunStatus,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_keeps_unknown_labels() {
        let task: Task = serde_json::from_str(
            r#"{"description":"Call back","priority":"Urgent"}"#,
        )
        .unwrap();
        assert_eq!(task.priority, Priority::Other("Urgent".to_string()));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["priority"], "Urgent");
    }

    #[test]
    fn task_uses_camel_case_source_email() {
        let task: Task = serde_json::from_str(
            r#"{"description":"Reply","priority":"High","sourceEmail":{"subject":"Hi","sender":"a@b.com"},"deadline":"Today"}"#,
        )
        .unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.subject_or("No subject"), "Hi");
        assert_eq!(task.sender_or("Unknown"), "a@b.com");
        assert_eq!(task.deadline.as_deref(), Some("Today"));
    }

    #[test]
    fn missing_source_email_falls_back_to_defaults() {
        let task: Task = serde_json::from_str(r#"{"description":"x","priority":"Low"}"#).unwrap();
        assert_eq!(task.subject_or("No subject"), "No subject");
        assert_eq!(task.sender_or("Unknown"), "Unknown");
    }

    #[test]
    fn history_entry_snapshots_run() {
        let run = AgentRunResult {
            tasks: vec![Task::default()],
            emails_processed: 12,
            generated_at: "2026-10-18T08:00:00Z".to_string(),
            status: "success".to_string(),
        };
        let entry = HistoryEntry::from(&run);
        assert_eq!(entry.date, run.generated_at);
        assert_eq!(entry.tasks.len(), 1);
        assert_eq!(entry.emails_processed, 12);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["emailsProcessed"], 12);
    }

    #[test]
    fn unknown_run_status_deserializes() {
        let status: RunStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(status, RunStatus::Unknown);
    }
}
