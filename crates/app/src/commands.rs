use std::error::Error;
use std::fmt::Write as _;

use services::{AppServices, Dashboard, ReflectionDraft, WeekSchedule, build_schedule};
use study_core::model::{Reflection, Session, SessionId, UpsertOutcome, WeekId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Toggle,
    Check,
    Uncheck,
}

/// Journal fields given on the command line. Absent fields keep their
/// stored value.
#[derive(Debug, Default)]
pub struct JournalFields {
    pub notes: Option<String>,
    pub issues: Option<String>,
    pub fixes: Option<String>,
}

#[derive(Debug)]
pub enum Command {
    Dashboard,
    Schedule,
    Show(SessionId),
    Task {
        id: SessionId,
        index: usize,
        action: TaskAction,
    },
    Journal {
        id: SessionId,
        fields: JournalFields,
    },
    Reflect {
        week: WeekId,
        understood: String,
        confused: String,
        questions: String,
    },
    Reflections,
    Weeks,
    Reset,
}

type CommandResult = Result<String, Box<dyn Error>>;

pub async fn execute(services: &AppServices, command: Command, json: bool) -> CommandResult {
    match command {
        Command::Dashboard => {
            let dashboard = services.dashboard().overview().await?;
            render(json, &dashboard, render_dashboard)
        }
        Command::Schedule => {
            let sessions = services.sessions().list_sessions().await?;
            let schedule = build_schedule(&sessions);
            render(json, &schedule, |s| render_schedule(s))
        }
        Command::Show(id) => {
            let session = find(services, &id).await?;
            render(json, &session, render_session)
        }
        Command::Task { id, index, action } => {
            let sessions = services.sessions();
            let toggle = match action {
                TaskAction::Toggle => sessions.toggle_task(&id, index).await?,
                TaskAction::Check => sessions.set_task(&id, index, true).await?,
                TaskAction::Uncheck => sessions.set_task(&id, index, false).await?,
            };
            let session = find(services, &id).await?;
            if json {
                return Ok(serde_json::to_string_pretty(&session)?);
            }
            let mut out = format!(
                "Task {} is now {}.",
                toggle.index + 1,
                if toggle.task_completed { "done" } else { "open" }
            );
            if toggle.session_completed {
                out.push_str(" Session complete.");
            }
            out.push('\n');
            out.push_str(&render_session(&session));
            Ok(out)
        }
        Command::Journal { id, fields } => {
            let current = find(services, &id).await?;
            let notes = fields.notes.unwrap_or_else(|| current.notes().to_owned());
            let issues = fields.issues.unwrap_or_else(|| current.issues().to_owned());
            let fixes = fields.fixes.unwrap_or_else(|| current.fixes().to_owned());
            services
                .sessions()
                .save_journal(&id, &notes, &issues, &fixes)
                .await?;
            let session = find(services, &id).await?;
            render(json, &session, render_session)
        }
        Command::Reflect {
            week,
            understood,
            confused,
            questions,
        } => {
            let draft = ReflectionDraft {
                understood,
                confused,
                questions,
            };
            let (reflection, outcome) = services.reflections().save(week, draft).await?;
            if json {
                return Ok(serde_json::to_string_pretty(&reflection)?);
            }
            let verb = match outcome {
                UpsertOutcome::Inserted => "Saved",
                UpsertOutcome::Replaced => "Updated",
            };
            Ok(format!(
                "{verb} reflection for week {}.\n{}",
                reflection.week_id(),
                render_reflection(&reflection)
            ))
        }
        Command::Reflections => {
            let past = services.reflections().past_reflections().await?;
            render(json, &past, |r| render_reflections(r))
        }
        Command::Weeks => {
            let weeks = services.reflections().week_options().await?;
            if json {
                return Ok(serde_json::to_string_pretty(&weeks)?);
            }
            Ok(weeks
                .iter()
                .map(|w| format!("Week {w}"))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        Command::Reset => {
            services.store().clear_all().await?;
            Ok("All study data erased. It will be reseeded on the next run.".to_owned())
        }
    }
}

async fn find(services: &AppServices, id: &SessionId) -> Result<Session, Box<dyn Error>> {
    services
        .sessions()
        .find_session(id)
        .await?
        .ok_or_else(|| format!("no session with id {id}").into())
}

fn render<T: serde::Serialize + ?Sized>(
    json: bool,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> CommandResult {
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(text(value))
    }
}

fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut out = dashboard.summary.clone();
    if let Some(phase) = dashboard.current_phase() {
        let _ = write!(out, "\nCurrent phase: {phase}");
    }
    match &dashboard.next {
        Some(next) => {
            let _ = write!(
                out,
                "\n\nNext up: Week {} - {}\n  {}\n  {}\n  (session {})",
                next.week, next.day, next.title, next.topic, next.id
            );
        }
        None => out.push_str("\n\nAll sessions caught up! Great work."),
    }
    out
}

fn render_schedule(schedule: &[WeekSchedule]) -> String {
    if schedule.is_empty() {
        return "No sessions scheduled.".to_owned();
    }
    let mut out = String::new();
    for week in schedule {
        let _ = writeln!(out, "Week {}: {}", week.week, week.title);
        for entry in &week.entries {
            let _ = writeln!(
                out,
                "  [{:<9}] {:<9} {}  ({}/{} tasks, {})",
                entry.status.label(),
                entry.day,
                entry.topic,
                entry.tasks_done,
                entry.tasks_total,
                entry.id
            );
        }
    }
    out.trim_end().to_owned()
}

fn render_session(session: &Session) -> String {
    let mut out = String::new();
    let status = if session.is_completed() {
        "Completed"
    } else {
        "Upcoming"
    };
    let _ = writeln!(
        out,
        "{} ({})\nWeek {} - {} | {}\n{}",
        session.title(),
        session.id(),
        session.week(),
        session.day(),
        status,
        session.topic()
    );

    let (done, total) = session.task_counts();
    let _ = writeln!(out, "\nTasks ({done}/{total}):");
    for (i, task) in session.tasks().iter().enumerate() {
        let mark = if task.is_completed() { 'x' } else { ' ' };
        let _ = writeln!(out, "  {}. [{mark}] {}", i + 1, task.text());
    }

    if !session.deliverables().is_empty() {
        out.push_str("\nDeliverables:\n");
        for d in session.deliverables() {
            let _ = writeln!(out, "  - {d}");
        }
    }
    if !session.links().is_empty() {
        out.push_str("\nLinks:\n");
        for link in session.links() {
            let _ = writeln!(out, "  - {link}");
        }
    }

    for (label, value) in [
        ("Notes", session.notes()),
        ("Issues", session.issues()),
        ("Fixes", session.fixes()),
    ] {
        if !value.trim().is_empty() {
            let _ = write!(out, "\n{label}:\n  {value}\n");
        }
    }
    out.trim_end().to_owned()
}

fn render_reflection(reflection: &Reflection) -> String {
    let mut out = format!(
        "Week {} ({})",
        reflection.week_id(),
        reflection.date().format("%Y-%m-%d")
    );
    for (label, value) in [
        ("Understood", reflection.understood()),
        ("Confused", reflection.confused()),
        ("Questions", reflection.questions()),
    ] {
        if !value.trim().is_empty() {
            let _ = write!(out, "\n  {label}: {value}");
        }
    }
    out
}

fn render_reflections(reflections: &[Reflection]) -> String {
    if reflections.is_empty() {
        return "No reflections yet.".to_owned();
    }
    reflections
        .iter()
        .map(render_reflection)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{SessionDay, Task};
    use study_core::time::fixed_now;

    fn session() -> Session {
        Session::new(
            SessionId::new("w1-fri"),
            WeekId::new(1),
            SessionDay::Friday,
            "Foundations",
            "Regions and AZs",
            vec![Task::done("Read"), Task::new("Draw")],
        )
        .unwrap()
    }

    #[test]
    fn session_view_numbers_tasks_from_one() {
        let text = render_session(&session());
        assert!(text.contains("Tasks (1/2):"));
        assert!(text.contains("  1. [x] Read"));
        assert!(text.contains("  2. [ ] Draw"));
        assert!(!text.contains("Notes:"));
    }

    #[test]
    fn dashboard_view_names_next_session() {
        let text = render_dashboard(&Dashboard::from_sessions(&[session().with_phase("Phase 1")]));
        assert!(text.starts_with("0 of 1 sessions completed (0%)"));
        assert!(text.contains("Current phase: Phase 1"));
        assert!(text.contains("(session w1-fri)"));

        let empty = render_dashboard(&Dashboard::from_sessions(&[]));
        assert!(empty.contains("All sessions caught up!"));
        assert!(empty.contains("Current phase: Journey Completed!"));
    }

    #[test]
    fn reflection_view_skips_blank_fields() {
        let reflection =
            Reflection::new(WeekId::new(2), fixed_now(), "VPCs", "", "").unwrap();
        let text = render_reflection(&reflection);
        assert!(text.starts_with("Week 2 (2023-11-14)"));
        assert!(text.contains("Understood: VPCs"));
        assert!(!text.contains("Confused"));
    }
}
