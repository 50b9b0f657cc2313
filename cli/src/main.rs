mod config;
mod export;
mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use common::history::{clear_history, load_history};
use common::{Dashboard, DisplayZone, LocalStore, Settings};
use config::{Config, LoggingConfig};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (.yaml, .yml or .toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Show fixed demonstration data instead of live results
    #[arg(long, global = true)]
    sample: bool,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the full dashboard (default)
    Dashboard {
        /// Expand the task card at this index (repeatable)
        #[arg(long)]
        expand: Vec<usize>,
        /// Expand every task card
        #[arg(long)]
        expand_all: bool,
    },
    /// Analyze emails now and show the resulting tasks
    Run,
    /// Inspect or control the recurring schedule
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// Show stored run history
    History {
        /// Only show the newest N entries
        #[arg(short, long)]
        limit: Option<usize>,
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Export stored history tasks as CSV
    Export {
        #[arg(short, long)]
        output: PathBuf,
    },
    /// View or change digest preferences
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Refresh schedule status on an interval until interrupted
    Watch {
        /// Seconds between refreshes
        #[arg(short, long, default_value_t = 30)]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// Show schedule status
    Status,
    /// Pause the schedule
    Pause,
    /// Resume the schedule
    Resume,
    /// Pause if active, resume if paused
    Toggle,
    /// Trigger a scheduled run now
    Trigger,
    /// List recent executions
    Runs,
}

/// The subset of [`Commands`] that needs remote state.
enum LiveCommand {
    Dashboard { expand: Vec<usize>, expand_all: bool },
    Run,
    Schedule(ScheduleAction),
    Watch { interval: u64 },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Delete stored history
    Clear,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show current preferences
    Show,
    /// Update preferences; omitted fields keep their stored value
    Set {
        /// Recipient email address
        #[arg(long)]
        email: Option<String>,
        /// Delivery time, HH:MM
        #[arg(long)]
        time: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    setup_logging(&config.logging, cli.verbose)?;
    let zone = DisplayZone::parse(config.display.timezone.as_deref())?;
    let now = chrono::Utc::now();

    let command = cli.command.unwrap_or(Commands::Dashboard { expand: Vec::new(), expand_all: false });

    match command {
        Commands::Settings { action } => {
            let mut store = LocalStore::open(&config.storage.path);
            let mut settings = Settings::load(&store);
            if let SettingsAction::Set { email, time } = action {
                if let Some(email) = email {
                    settings.recipient_email = email;
                }
                if let Some(time) = time {
                    settings.scheduled_time = time;
                }
                settings.save(&mut store)?;
                println!("Settings saved");
            }
            let timezone = config.digest_timezone();
            print!("{}", render::settings_view(&settings, &timezone));
        },
        Commands::History { limit, action } => {
            let mut store = LocalStore::open(&config.storage.path);
            if let Some(HistoryAction::Clear) = action {
                clear_history(&mut store)?;
                println!("History cleared");
                return Ok(());
            }
            let mut history = if cli.sample { common::sample::sample_history(now) } else { load_history(&store) };
            if let Some(n) = limit {
                history.truncate(n);
            }
            print!("{}", render::history_panel(&history, zone));
        },
        Commands::Export { output } => {
            let store = LocalStore::open(&config.storage.path);
            let history = if cli.sample { common::sample::sample_history(now) } else { load_history(&store) };
            let rows = export::export_to_file(&output, &history)?;
            println!("Exported {} tasks to {}", rows, output.display());
        },
        Commands::Dashboard { expand, expand_all } => {
            live(&config, LiveCommand::Dashboard { expand, expand_all }, cli.sample, zone).await?;
        },
        Commands::Run => {
            live(&config, LiveCommand::Run, cli.sample, zone).await?;
        },
        Commands::Schedule { action } => {
            live(&config, LiveCommand::Schedule(action), cli.sample, zone).await?;
        },
        Commands::Watch { interval } => {
            live(&config, LiveCommand::Watch { interval }, cli.sample, zone).await?;
        },
    }

    Ok(())
}

async fn live(config: &Config, command: LiveCommand, sample: bool, zone: DisplayZone) -> anyhow::Result<()> {
    let store = LocalStore::open(&config.storage.path);
    let mut dash = Dashboard::new(&config.agent, &config.scheduler, store)?;
    run_live(&mut dash, command, sample, zone).await
}

/// Commands that talk to the remote services through the dashboard state.
async fn run_live(dash: &mut Dashboard, command: LiveCommand, sample: bool, zone: DisplayZone) -> anyhow::Result<()> {
    let now = chrono::Utc::now();

    match command {
        LiveCommand::Dashboard { expand, expand_all } => {
            dash.load().await;
            if sample {
                dash.set_sample_mode(true, now);
            }
            let indices: Vec<usize> = if expand_all {
                (0..dash.display_tasks().len()).collect()
            } else {
                expand
            };
            for index in indices {
                dash.toggle_task_expanded(index);
            }
            print!("{}", render::dashboard(dash, zone, now));
        },
        LiveCommand::Run => {
            dash.load().await;
            if !dash.run_now().await {
                eprintln!("Agent run failed; showing previous state");
            }
            print!("{}", render::header(dash));
            print!("{}", render::status_overview(dash, zone, chrono::Utc::now()));
            print!("{}", render::tasks_panel(dash, zone));
        },
        LiveCommand::Schedule(action) => {
            match action {
                ScheduleAction::Status => {
                    dash.load_schedule_info().await;
                },
                ScheduleAction::Pause => {
                    dash.pause_schedule().await;
                },
                ScheduleAction::Resume => {
                    dash.resume_schedule().await;
                },
                ScheduleAction::Toggle => {
                    if !dash.load_schedule_info().await {
                        eprintln!("Schedule {} could not be loaded; nothing to toggle", dash.schedule_id());
                    }
                    dash.toggle_schedule().await;
                },
                ScheduleAction::Trigger => {
                    dash.load().await;
                    if dash.trigger_schedule().await {
                        print!("{}", render::runs_panel(&dash.runs, zone));
                        print!("{}", render::tasks_panel(dash, zone));
                    } else {
                        eprintln!("Scheduled run was not triggered");
                    }
                    return Ok(());
                },
                ScheduleAction::Runs => {
                    dash.load_schedule_runs().await;
                    print!("{}", render::runs_panel(&dash.runs, zone));
                    return Ok(());
                },
            }
            print!("{}", render::schedule_panel(dash.schedule.as_ref(), zone));
        },
        LiveCommand::Watch { interval } => {
            let interrupted = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            watch(dash, interval, sample, zone, interrupted).await;
        },
    }

    Ok(())
}

/// Redraw the dashboard every `interval` seconds until `shutdown` resolves.
/// Shutdown also cancels a refresh that is still waiting on the network.
async fn watch<F>(dash: &mut Dashboard, interval: u64, sample: bool, zone: DisplayZone, shutdown: F)
where
    F: std::future::Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(tokio::time::Duration::from_secs(interval.max(1)));
    let mut first = true;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {},
        }

        let refresh = async {
            if first {
                dash.load().await;
                if sample {
                    dash.set_sample_mode(true, chrono::Utc::now());
                }
            } else {
                dash.load_schedule_info().await;
                dash.load_schedule_runs().await;
            }
        };
        tokio::select! {
            _ = &mut shutdown => break,
            _ = refresh => {},
        }
        first = false;

        print!("\x1B[2J\x1B[H{}", render::dashboard(dash, zone, chrono::Utc::now()));
    }

    log::info!("Interrupted, leaving watch mode");
}

fn setup_logging(logging: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::from_str(&logging.level)
            .with_context(|| format!("Invalid log level: {}", logging.level))?
    };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d][%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .level_for("hyper", log::LevelFilter::Warn)
        .level_for("reqwest", log::LevelFilter::Warn)
        .chain(std::io::stderr());

    let log_file = std::env::var_os("TASKDIGEST_LOG")
        .map(PathBuf::from)
        .or_else(|| logging.output.clone());
    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path))?);
    }

    dispatch.apply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{AgentConfig, SchedulerConfig};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dashboard(server: &MockServer, dir: &tempfile::TempDir) -> Dashboard {
        let scheduler = SchedulerConfig {
            base_url: server.uri(),
            ..SchedulerConfig::default()
        };
        let store = LocalStore::open(dir.path().join("store.json"));
        Dashboard::new(&AgentConfig::default(), &scheduler, store).unwrap()
    }

    #[tokio::test]
    async fn watch_stops_while_refresh_is_stalled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(60)))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut dash = dashboard(&server, &dir);
        let shutdown = tokio::time::sleep(Duration::from_millis(200));

        let finished = tokio::time::timeout(
            Duration::from_secs(10),
            watch(&mut dash, 30, false, DisplayZone::Utc, shutdown),
        )
        .await;
        assert!(finished.is_ok());
        assert!(dash.schedule.is_none());
    }

    #[tokio::test]
    async fn watch_stops_between_ticks() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let mut dash = dashboard(&server, &dir);
        let shutdown = tokio::time::sleep(Duration::from_millis(300));

        let finished = tokio::time::timeout(
            Duration::from_secs(10),
            watch(&mut dash, 3600, false, DisplayZone::Utc, shutdown),
        )
        .await;
        assert!(finished.is_ok());
    }

    #[test]
    fn default_command_is_the_dashboard() {
        let cli = Cli::try_parse_from(["taskdigest"]).unwrap();
        assert!(cli.command.is_none());
        let cli = Cli::try_parse_from(["taskdigest", "schedule", "toggle"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Schedule { action: ScheduleAction::Toggle })
        ));
    }
}
