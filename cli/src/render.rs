use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, Table};
use common::format::pluralize_tasks;
use common::{cron_to_human, ConnectionStatus, Dashboard, DisplayZone, HistoryEntry, Priority,
             RunStatus, ScheduleInfo, ScheduleRun, Settings, Task};
use std::fmt::Write;

/// Tasks listed per history entry before collapsing into a `+N more` line.
const HISTORY_PREVIEW: usize = 3;

fn table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

fn title(text: &str) -> String {
    format!("\n== {} ==\n", text)
}

fn priority_cell(priority: &Priority) -> Cell {
    let cell = Cell::new(priority);
    match priority {
        Priority::High => cell.fg(Color::Red),
        Priority::Medium => cell.fg(Color::Yellow),
        Priority::Low => cell.fg(Color::Green),
        Priority::Other(_) => cell,
    }
}

fn run_status_cell(status: &RunStatus) -> Cell {
    let cell = Cell::new(status);
    match status {
        RunStatus::Success => cell.fg(Color::Green),
        RunStatus::Failed => cell.fg(Color::Red),
        RunStatus::Unknown => cell,
    }
}

pub fn header(dash: &Dashboard) -> String {
    let connection = match dash.connection {
        ConnectionStatus::Connected => "● Connected",
        ConnectionStatus::Disconnected => "○ Disconnected",
    };
    format!(
        "Daily Email Task Agent\nAutomated email analysis and task extraction\nSample Data: {}   {}\n",
        if dash.sample_mode { "on" } else { "off" },
        connection
    )
}

pub fn status_overview(dash: &Dashboard, zone: DisplayZone, now: DateTime<Utc>) -> String {
    let next_run = dash.schedule.as_ref().map(|s| s.next_run.as_str());
    let mut next_cell = zone.format_next_run(next_run, now);
    if let Some(cron) = dash.schedule.as_ref().and_then(|s| s.cron_expression.as_deref()) {
        next_cell.push('\n');
        next_cell.push_str(&cron_to_human(cron));
    }

    let status = dash.display_status();
    let status_cell = if status == "success" {
        Cell::new("✓ Success").fg(Color::Green)
    } else {
        Cell::new(status)
    };

    let mut table = table();
    table.set_header(vec!["Next Scheduled Run", "Last Run Status", "Emails Processed"]);
    table.add_row(vec![
        Cell::new(next_cell),
        status_cell,
        Cell::new(dash.display_emails_processed()),
    ]);
    format!("{}{}\n", title("Status Overview"), table)
}

/// One task card. Expanded cards repeat the full details below the summary.
pub fn task_card(index: usize, task: &Task, expanded: bool) -> String {
    let mut table = table();
    table.set_header(vec![
        Cell::new(format!("#{} {}", index, task.description)).add_attribute(Attribute::Bold),
        priority_cell(&task.priority),
    ]);
    table.add_row(vec![
        Cell::new(format!(
            "{}\nFrom: {}",
            task.subject_or("No subject"),
            task.sender_or("Unknown")
        )),
        Cell::new(""),
    ]);
    if let Some(ref deadline) = task.deadline {
        table.add_row(vec![Cell::new(format!("Deadline: {}", deadline)).fg(Color::Yellow), Cell::new("")]);
    }

    if expanded {
        let mut details = format!(
            "Full Description: {}\nPriority Level: {}\nSource: {} ({})",
            task.description,
            task.priority,
            task.subject_or("N/A"),
            task.sender_or("N/A")
        );
        if let Some(ref deadline) = task.deadline {
            let _ = write!(details, "\nDue By: {}", deadline);
        }
        table.add_row(vec![Cell::new(details), Cell::new("")]);
    }
    table.to_string()
}

pub fn tasks_panel(dash: &Dashboard, zone: DisplayZone) -> String {
    let tasks = dash.display_tasks();
    let mut out = title("Today's Tasks");

    match dash.current {
        Some(ref run) => {
            let _ = writeln!(
                out,
                "{} | Generated {}",
                pluralize_tasks(tasks.len()),
                zone.format_date(&run.generated_at)
            );
        }
        None => out.push_str("No tasks generated yet\n"),
    }

    if tasks.is_empty() {
        out.push_str("\nNo tasks available\n");
        out.push_str(if dash.sample_mode {
            "Toggle off sample data to run live agent\n"
        } else {
            "Run `taskdigest run` to analyze emails or pass --sample\n"
        });
        return out;
    }

    for (index, task) in tasks.iter().enumerate() {
        out.push_str(&task_card(index, task, dash.is_expanded(index)));
        out.push('\n');
    }
    out
}

pub fn history_panel(history: &[HistoryEntry], zone: DisplayZone) -> String {
    let mut out = title("Task History");
    out.push_str("Previous daily summaries (last 30 days)\n");
    if history.is_empty() {
        out.push_str("\nNo history available\n");
        return out;
    }

    let mut table = table();
    table.set_header(vec!["Date", "Emails", "Status", "Tasks"]);
    for entry in history {
        let mut preview: Vec<String> = entry
            .tasks
            .iter()
            .take(HISTORY_PREVIEW)
            .map(|t| format!("[{}] {}", t.priority, t.description))
            .collect();
        if entry.tasks.len() > HISTORY_PREVIEW {
            preview.push(format!("+{} more tasks", entry.tasks.len() - HISTORY_PREVIEW));
        }
        table.add_row(vec![
            Cell::new(zone.format_date(&entry.date)),
            Cell::new(format!("{} emails", entry.emails_processed)),
            Cell::new(&entry.status),
            Cell::new(preview.join("\n")),
        ]);
    }
    format!("{}{}\n", out, table)
}

/// Prefer the schedule's own timezone for its timestamps.
fn schedule_zone(info: &ScheduleInfo, fallback: DisplayZone) -> DisplayZone {
    info.timezone
        .as_deref()
        .and_then(|tz| DisplayZone::parse(Some(tz)).ok())
        .unwrap_or(fallback)
}

pub fn schedule_panel(schedule: Option<&ScheduleInfo>, zone: DisplayZone) -> String {
    let mut out = title("Schedule Status");
    let Some(info) = schedule else {
        out.push_str("Schedule unavailable\n");
        return out;
    };

    let status = Cell::new(info.status);
    let status = if info.is_active() { status.fg(Color::Green) } else { status.fg(Color::Yellow) };

    let mut table = table();
    table.add_row(vec![Cell::new("Status"), status]);
    table.add_row(vec![
        Cell::new("Schedule"),
        Cell::new(info.cron_expression.as_deref().map(cron_to_human).unwrap_or_else(|| "Not set".to_string())),
    ]);
    table.add_row(vec![Cell::new("Timezone"), Cell::new(info.timezone.as_deref().unwrap_or("Not set"))]);
    table.add_row(vec![
        Cell::new("Next Run"),
        Cell::new(schedule_zone(info, zone).format_date(&info.next_run)),
    ]);
    format!("{}{}\n", out, table)
}

pub fn runs_panel(runs: &[ScheduleRun], zone: DisplayZone) -> String {
    let mut out = title("Recent Runs");
    if runs.is_empty() {
        out.push_str("No runs yet\n");
        return out;
    }

    let mut table = table();
    table.set_header(vec!["Started", "Completed", "Status"]);
    for run in runs {
        table.add_row(vec![
            Cell::new(run.started_at.as_deref().map(|s| zone.format_date(s)).unwrap_or_else(|| "Unknown time".to_string())),
            Cell::new(run.completed_at.as_deref().map(|s| zone.format_date(s)).unwrap_or_default()),
            run_status_cell(&run.status),
        ]);
    }
    format!("{}{}\n", out, table)
}

pub fn agent_info(dash: &Dashboard) -> String {
    let mut table = table();
    table.add_row(vec!["Agent", "Email Task Agent"]);
    table.add_row(vec!["Output", "Text + JSON"]);
    table.add_row(vec!["Status", dash.agent_state()]);
    format!("{}{}\n", title("Agent Info"), table)
}

pub fn settings_view(settings: &Settings, timezone: &str) -> String {
    let mut table = table();
    table.add_row(vec![
        "Recipient Email",
        if settings.recipient_email.is_empty() { "(not set)" } else { settings.recipient_email.as_str() },
    ]);
    table.add_row(vec!["Scheduled Time", settings.scheduled_time.as_str()]);
    table.add_row(vec!["Timezone", timezone]);
    format!("{}Configure your daily email task digest preferences\n{}\n", title("Settings"), table)
}

pub fn dashboard(dash: &Dashboard, zone: DisplayZone, now: DateTime<Utc>) -> String {
    [
        header(dash),
        status_overview(dash, zone, now),
        tasks_panel(dash, zone),
        history_panel(&dash.history, zone),
        schedule_panel(dash.schedule.as_ref(), zone),
        runs_panel(&dash.runs, zone),
        agent_info(dash),
    ]
    .concat()
}
