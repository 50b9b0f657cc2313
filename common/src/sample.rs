//! Fixed demonstration content shown while sample data mode is on.

use crate::model::{AgentRunResult, HistoryEntry, Priority, SourceEmail, Task};
use chrono::{DateTime, Duration, Utc};

fn task(description: &str, priority: Priority, subject: &str, sender: &str, deadline: Option<&str>) -> Task {
    Task {
        description: description.to_string(),
        priority,
        source_email: Some(SourceEmail {
            subject: Some(subject.to_string()),
            sender: Some(sender.to_string()),
        }),
        deadline: deadline.map(str::to_string),
    }
}

pub fn sample_run(now: DateTime<Utc>) -> AgentRunResult {
    AgentRunResult {
        tasks: vec![
            task(
                "Review and approve Q1 budget proposal from Finance team",
                Priority::High,
                "Q1 Budget Proposal - Needs Approval",
                "finance@company.com",
                Some("Today, 5:00 PM"),
            ),
            task(
                "Schedule project kickoff meeting with development team",
                Priority::Medium,
                "New Project: Dashboard Redesign",
                "pm@company.com",
                Some("This Week"),
            ),
            task(
                "Respond to client inquiry about feature request",
                Priority::High,
                "Feature Request: Export Functionality",
                "client@example.com",
                Some("Tomorrow, 2:00 PM"),
            ),
            task(
                "Review team performance reports for monthly meeting",
                Priority::Low,
                "Monthly Performance Summary",
                "hr@company.com",
                Some("End of Week"),
            ),
            task(
                "Update documentation for API integration process",
                Priority::Medium,
                "API Documentation Updates Needed",
                "dev@company.com",
                None,
            ),
        ],
        emails_processed: 47,
        generated_at: now.to_rfc3339(),
        status: "success".to_string(),
    }
}

pub fn sample_history(now: DateTime<Utc>) -> Vec<HistoryEntry> {
    vec![
        HistoryEntry {
            date: (now - Duration::days(1)).to_rfc3339(),
            tasks: vec![
                task(
                    "Complete quarterly performance reviews",
                    Priority::High,
                    "Q4 Reviews Due",
                    "hr@company.com",
                    None,
                ),
                task(
                    "Update project timeline with stakeholders",
                    Priority::Medium,
                    "Project Timeline Discussion",
                    "pm@company.com",
                    None,
                ),
            ],
            emails_processed: 32,
            status: "success".to_string(),
        },
        HistoryEntry {
            date: (now - Duration::days(2)).to_rfc3339(),
            tasks: vec![task(
                "Review contract renewal proposals",
                Priority::High,
                "Contract Renewals - Action Required",
                "legal@company.com",
                None,
            )],
            emails_processed: 28,
            status: "success".to_string(),
        },
    ]
}
