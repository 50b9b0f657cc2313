pub mod agent;
pub mod dashboard;
pub mod format;
pub mod history;
pub mod model;
pub mod sample;
pub mod scheduler;
pub mod settings;
pub mod store;

pub use agent::{AgentClient, AgentConfig};
pub use dashboard::Dashboard;
pub use format::DisplayZone;
pub use model::{AgentRunResult, ConnectionStatus, HistoryEntry, Priority, RunStatus,
                ScheduleInfo, ScheduleRun, ScheduleStatus, SourceEmail, Task};
pub use scheduler::{cron_to_human, SchedulerClient, SchedulerConfig};
pub use settings::Settings;
pub use store::LocalStore;

pub const DEFAULT_AGENT_ID: &str = "698dad822332705a73b4cbea";
pub const DEFAULT_SCHEDULE_ID: &str = "698daf7cebe6fd87d1dcc173";
pub const AGENT_MESSAGE: &str = "Analyze yesterday's emails and send daily task list";

pub const HISTORY_LIMIT: usize = 30;
pub const SCHEDULE_LOG_LIMIT: u32 = 10;
pub const TRIGGER_REFRESH_DELAY_MS: u64 = 2000;
pub const DEFAULT_SCHEDULED_TIME: &str = "16:30";
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const NOT_SCHEDULED: &str = "Not scheduled";

pub const CONFIG_DIR_NAME: &str = "taskdigest";
pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const STORE_FILE_NAME: &str = "storage.json";

/// `~/.config/taskdigest`, or the working directory when no config dir exists.
pub fn user_config_dir() -> std::path::PathBuf {
    dirs::config_dir()
        .map(|d| d.join(CONFIG_DIR_NAME))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
}

pub fn default_store_path() -> std::path::PathBuf {
    dirs::data_dir()
        .map(|d| d.join(CONFIG_DIR_NAME))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(STORE_FILE_NAME)
}
