use crate::agent::{normalize_result, AgentClient, AgentConfig};
use crate::history::{load_history, push_entry, save_history};
use crate::model::{AgentRunResult, ConnectionStatus, HistoryEntry, ScheduleInfo, ScheduleRun, Task};
use crate::sample::{sample_history, sample_run};
use crate::scheduler::{SchedulerClient, SchedulerConfig};
use crate::store::LocalStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::time::Duration;

/// Page-level state: what the dashboard shows plus the remote clients that
/// feed it. Remote failures never escape; they end up in `connection` or the
/// log.
pub struct Dashboard {
    agent: AgentClient,
    scheduler: SchedulerClient,
    store: LocalStore,
    agent_id: String,
    message: String,
    schedule_id: String,
    logs_limit: u32,
    refresh_delay: Duration,

    pub sample_mode: bool,
    pub current: Option<AgentRunResult>,
    pub history: Vec<HistoryEntry>,
    pub expanded: BTreeSet<usize>,
    pub loading: bool,
    pub schedule_loading: bool,
    pub schedule: Option<ScheduleInfo>,
    pub runs: Vec<ScheduleRun>,
    pub connection: ConnectionStatus,
}

impl Dashboard {
    pub fn new(agent: &AgentConfig, scheduler: &SchedulerConfig, store: LocalStore) -> Result<Self> {
        Ok(Self {
            agent: AgentClient::new(agent)?,
            scheduler: SchedulerClient::new(scheduler)?,
            store,
            agent_id: agent.agent_id.clone(),
            message: agent.message.clone(),
            schedule_id: scheduler.schedule_id.clone(),
            logs_limit: scheduler.logs_limit,
            refresh_delay: Duration::from_millis(scheduler.trigger_refresh_delay_ms),
            sample_mode: false,
            current: None,
            history: Vec::new(),
            expanded: BTreeSet::new(),
            loading: false,
            schedule_loading: false,
            schedule: None,
            runs: Vec::new(),
            connection: ConnectionStatus::Connected,
        })
    }

    pub fn schedule_id(&self) -> &str {
        &self.schedule_id
    }

    /// Initial load: schedule, recent runs and stored history.
    pub async fn load(&mut self) {
        self.load_schedule_info().await;
        self.load_schedule_runs().await;
        if !self.sample_mode {
            self.history = load_history(&self.store);
        }
    }

    pub fn set_sample_mode(&mut self, on: bool, now: DateTime<Utc>) {
        self.sample_mode = on;
        self.expanded.clear();
        if on {
            self.current = Some(sample_run(now));
            self.history = sample_history(now);
        } else {
            self.current = None;
            self.history.clear();
        }
    }

    pub async fn load_schedule_info(&mut self) -> bool {
        match self.scheduler.get_schedule(&self.schedule_id).await {
            Ok(env) => match (env.success, env.schedule) {
                (true, Some(schedule)) => {
                    self.schedule = Some(ScheduleInfo::from_remote(schedule));
                    true
                }
                _ => {
                    log::warn!(
                        "Schedule {} unavailable: {}",
                        self.schedule_id,
                        env.error.as_deref().unwrap_or("no schedule in response")
                    );
                    false
                }
            },
            Err(e) => {
                log::error!("Failed to load schedule info: {:#}", e);
                false
            }
        }
    }

    pub async fn load_schedule_runs(&mut self) -> bool {
        match self.scheduler.get_logs(&self.schedule_id, self.logs_limit).await {
            Ok(env) => match (env.success, env.executions) {
                (true, Some(executions)) => {
                    self.runs = executions.into_iter().map(ScheduleRun::from_execution).collect();
                    true
                }
                _ => {
                    log::warn!(
                        "Schedule logs unavailable: {}",
                        env.error.as_deref().unwrap_or("no executions in response")
                    );
                    false
                }
            },
            Err(e) => {
                log::error!("Failed to load schedule runs: {:#}", e);
                false
            }
        }
    }

    /// Ask the agent for a fresh task list. Returns whether the run succeeded.
    pub async fn run_now(&mut self) -> bool {
        if self.loading {
            return false;
        }
        if self.sample_mode {
            self.set_sample_mode(false, Utc::now());
            self.history = load_history(&self.store);
        }

        self.loading = true;
        log::info!("Running agent {}", self.agent_id);
        let outcome = self.agent.call(&self.message, &self.agent_id).await;
        self.loading = false;

        let envelope = match outcome {
            Ok(envelope) => envelope,
            Err(e) => {
                log::error!("Failed to run agent: {:#}", e);
                self.connection = ConnectionStatus::Disconnected;
                return false;
            }
        };

        let Some(raw) = envelope.result() else {
            log::warn!(
                "Agent run unsuccessful: {}",
                envelope.error.as_deref().unwrap_or("no result in response")
            );
            self.connection = ConnectionStatus::Disconnected;
            return false;
        };

        let run = normalize_result(raw, Utc::now());
        log::info!(
            "Agent returned {} tasks from {} emails",
            run.tasks.len(),
            run.emails_processed
        );

        self.history = push_entry(&self.history, HistoryEntry::from(&run));
        if let Err(e) = save_history(&mut self.store, &self.history) {
            log::error!("Failed to save history: {:#}", e);
        }
        self.current = Some(run);
        self.expanded.clear();
        self.connection = ConnectionStatus::Connected;
        true
    }

    /// Fire the schedule immediately, then refresh runs and tasks once the
    /// scheduler has had time to record the execution.
    pub async fn trigger_schedule(&mut self) -> bool {
        if self.schedule_loading || self.loading {
            return false;
        }

        self.schedule_loading = true;
        let outcome = self.scheduler.trigger_now(&self.schedule_id).await;
        self.schedule_loading = false;

        match outcome {
            Ok(env) if env.success => {
                log::info!("Triggered schedule {}", self.schedule_id);
                tokio::time::sleep(self.refresh_delay).await;
                self.load_schedule_runs().await;
                self.run_now().await;
                true
            }
            Ok(env) => {
                log::warn!(
                    "Trigger rejected: {}",
                    env.error.as_deref().unwrap_or("unsuccessful response")
                );
                false
            }
            Err(e) => {
                log::error!("Failed to run schedule: {:#}", e);
                false
            }
        }
    }

    /// Pause an active schedule or resume a paused one. Without loaded
    /// schedule info this does nothing.
    pub async fn toggle_schedule(&mut self) -> bool {
        match self.schedule.as_ref().map(ScheduleInfo::is_active) {
            Some(active) => self.set_schedule_active(!active).await,
            None => false,
        }
    }

    pub async fn pause_schedule(&mut self) -> bool {
        self.set_schedule_active(false).await
    }

    pub async fn resume_schedule(&mut self) -> bool {
        self.set_schedule_active(true).await
    }

    async fn set_schedule_active(&mut self, active: bool) -> bool {
        if self.schedule_loading {
            return false;
        }

        self.schedule_loading = true;
        let outcome = if active {
            self.scheduler.resume(&self.schedule_id).await
        } else {
            self.scheduler.pause(&self.schedule_id).await
        };

        let applied = match outcome {
            Ok(env) => {
                if env.success {
                    log::info!(
                        "Schedule {} {}",
                        self.schedule_id,
                        if active { "resumed" } else { "paused" }
                    );
                } else {
                    log::warn!(
                        "Scheduler did not apply change: {}",
                        env.error.as_deref().unwrap_or("unsuccessful response")
                    );
                }
                self.load_schedule_info().await;
                env.success
            }
            Err(e) => {
                log::error!("Failed to toggle schedule: {:#}", e);
                false
            }
        };
        self.schedule_loading = false;
        applied
    }

    pub fn toggle_task_expanded(&mut self, index: usize) {
        if !self.expanded.remove(&index) {
            self.expanded.insert(index);
        }
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }

    pub fn display_tasks(&self) -> &[Task] {
        self.current.as_ref().map(|r| r.tasks.as_slice()).unwrap_or(&[])
    }

    pub fn display_emails_processed(&self) -> u64 {
        self.current.as_ref().map(|r| r.emails_processed).unwrap_or(0)
    }

    pub fn display_status(&self) -> &str {
        self.current.as_ref().map(|r| r.status.as_str()).unwrap_or("ready")
    }

    pub fn agent_state(&self) -> &'static str {
        if self.loading { "Processing" } else { "Ready" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dashboard(dir: &tempfile::TempDir) -> Dashboard {
        let store = LocalStore::open(dir.path().join("store.json"));
        Dashboard::new(&AgentConfig::default(), &SchedulerConfig::default(), store).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn sample_mode_populates_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let mut dash = dashboard(&dir);

        dash.set_sample_mode(true, now());
        assert_eq!(dash.display_tasks().len(), 5);
        assert_eq!(dash.history.len(), 2);
        assert_eq!(dash.display_emails_processed(), 47);

        dash.toggle_task_expanded(1);
        dash.set_sample_mode(false, now());
        assert!(dash.current.is_none());
        assert!(dash.history.is_empty());
        assert!(dash.expanded.is_empty());
        assert_eq!(dash.display_status(), "ready");
    }

    #[test]
    fn expand_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let mut dash = dashboard(&dir);
        dash.toggle_task_expanded(3);
        assert!(dash.is_expanded(3));
        dash.toggle_task_expanded(3);
        assert!(!dash.is_expanded(3));
    }

    #[test]
    fn defaults_before_any_run() {
        let dir = tempfile::tempdir().unwrap();
        let dash = dashboard(&dir);
        assert!(dash.display_tasks().is_empty());
        assert_eq!(dash.display_emails_processed(), 0);
        assert_eq!(dash.connection, ConnectionStatus::Connected);
        assert_eq!(dash.agent_state(), "Ready");
    }

    #[tokio::test]
    async fn trigger_is_refused_while_busy() {
        let dir = tempfile::tempdir().unwrap();
        let mut dash = dashboard(&dir);

        dash.loading = true;
        assert!(!dash.trigger_schedule().await);
        assert!(dash.loading);
        assert!(!dash.schedule_loading);

        dash.loading = false;
        dash.schedule_loading = true;
        assert!(!dash.trigger_schedule().await);
        assert!(dash.schedule_loading);
        assert!(dash.runs.is_empty());
    }

    #[tokio::test]
    async fn toggle_without_schedule_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut dash = dashboard(&dir);
        assert!(!dash.toggle_schedule().await);
        assert!(dash.schedule.is_none());
    }
}
