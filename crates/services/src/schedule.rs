use serde::Serialize;
use study_core::model::Session;

/// Badge shown next to a session in the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Completed,
    Upcoming,
}

impl SessionStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Completed => "Completed",
            SessionStatus::Upcoming => "Upcoming",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub id: String,
    pub day: String,
    pub topic: String,
    pub status: SessionStatus,
    pub tasks_done: usize,
    pub tasks_total: usize,
}

/// Sessions of one curriculum week, in day order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSchedule {
    pub week: u32,
    /// Title of the first session scheduled that week.
    pub title: String,
    pub entries: Vec<ScheduleEntry>,
}

/// Group sessions into weeks (ascending) and order each week by weekday.
///
/// Sessions on the same week and day keep their storage order.
#[must_use]
pub fn build_schedule(sessions: &[Session]) -> Vec<WeekSchedule> {
    let mut ordered: Vec<&Session> = sessions.iter().collect();
    ordered.sort_by_key(|s| (s.week(), s.day()));

    let mut weeks: Vec<WeekSchedule> = Vec::new();
    for session in ordered {
        let week = session.week().value();
        if weeks.last().is_none_or(|w| w.week != week) {
            weeks.push(WeekSchedule {
                week,
                title: session.title().to_owned(),
                entries: Vec::new(),
            });
        }
        let (tasks_done, tasks_total) = session.task_counts();
        let status = if session.is_completed() {
            SessionStatus::Completed
        } else {
            SessionStatus::Upcoming
        };
        if let Some(current) = weeks.last_mut() {
            current.entries.push(ScheduleEntry {
                id: session.id().to_string(),
                day: session.day().to_string(),
                topic: session.topic().to_owned(),
                status,
                tasks_done,
                tasks_total,
            });
        }
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{SessionDay, SessionId, Task, WeekId};

    fn session(id: &str, week: u32, day: SessionDay, tasks: Vec<Task>) -> Session {
        Session::new(
            SessionId::new(id),
            WeekId::new(week),
            day,
            format!("Week {week} title"),
            format!("Topic {id}"),
            tasks,
        )
        .unwrap()
    }

    #[test]
    fn groups_by_week_and_orders_days() {
        let sessions = vec![
            session("w2-sat", 2, SessionDay::Saturday, vec![Task::new("a")]),
            session("w1-sat", 1, SessionDay::Saturday, vec![Task::done("a")]),
            session("w2-fri", 2, SessionDay::Friday, vec![Task::done("a"), Task::new("b")]),
            session("w1-fri", 1, SessionDay::Friday, vec![Task::new("a")]),
        ];

        let schedule = build_schedule(&sessions);
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].week, 1);
        assert_eq!(schedule[0].title, "Week 1 title");

        let ids: Vec<&str> = schedule
            .iter()
            .flat_map(|w| w.entries.iter().map(|e| e.id.as_str()))
            .collect();
        assert_eq!(ids, vec!["w1-fri", "w1-sat", "w2-fri", "w2-sat"]);

        let w1_sat = &schedule[0].entries[1];
        assert_eq!(w1_sat.status, SessionStatus::Completed);
        let w2_fri = &schedule[1].entries[0];
        assert_eq!(w2_fri.status.label(), "Upcoming");
        assert_eq!((w2_fri.tasks_done, w2_fri.tasks_total), (1, 2));
    }

    #[test]
    fn empty_collection_has_no_weeks() {
        assert!(build_schedule(&[]).is_empty());
    }
}
