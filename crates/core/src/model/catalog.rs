use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{SessionId, WeekId};
use crate::model::session::{Session, SessionDay, Task};

//
// ─── VALIDATION ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog contains no sessions")]
    Empty,

    #[error("session at position {position} has an empty id")]
    EmptyId { position: usize },

    #[error("duplicate session id: {0}")]
    DuplicateId(SessionId),
}

/// Check a session catalog before it is persisted and bring every session's
/// `completed` flag in line with its tasks.
///
/// # Errors
///
/// Returns `CatalogError` if the catalog is empty, has a blank id, or repeats an id.
pub fn validate_catalog(mut sessions: Vec<Session>) -> Result<Vec<Session>, CatalogError> {
    if sessions.is_empty() {
        return Err(CatalogError::Empty);
    }

    let mut seen = HashSet::with_capacity(sessions.len());
    for (position, session) in sessions.iter_mut().enumerate() {
        if session.id().is_blank() {
            return Err(CatalogError::EmptyId { position });
        }
        if !seen.insert(session.id().clone()) {
            return Err(CatalogError::DuplicateId(session.id().clone()));
        }
        session.rederive_completion();
    }

    Ok(sessions)
}

//
// ─── FALLBACK CATALOG ──────────────────────────────────────────────────────────
//

struct Entry {
    id: &'static str,
    week: u32,
    day: SessionDay,
    title: &'static str,
    phase: &'static str,
    topic: &'static str,
    tasks: &'static [&'static str],
    deliverables: &'static [&'static str],
    links: &'static [&'static str],
}

const FALLBACK: &[Entry] = &[
    Entry {
        id: "w1-fri",
        week: 1,
        day: SessionDay::Friday,
        title: "Cloud Foundations",
        phase: "Phase 1: Foundations",
        topic: "What the cloud is and how AWS is organised",
        tasks: &[
            "Read the cloud computing overview",
            "Create an AWS free-tier account",
            "Enable MFA on the root user",
        ],
        deliverables: &["Account with MFA enabled"],
        links: &["https://aws.amazon.com/what-is-cloud-computing/"],
    },
    Entry {
        id: "w1-sat",
        week: 1,
        day: SessionDay::Saturday,
        title: "Cloud Foundations",
        phase: "Phase 1: Foundations",
        topic: "Regions, availability zones and the shared responsibility model",
        tasks: &[
            "List three regions and their availability zones",
            "Summarise the shared responsibility model",
        ],
        deliverables: &["One-page summary of global infrastructure"],
        links: &["https://aws.amazon.com/about-aws/global-infrastructure/"],
    },
    Entry {
        id: "w2-fri",
        week: 2,
        day: SessionDay::Friday,
        title: "Identity and Access",
        phase: "Phase 1: Foundations",
        topic: "IAM users, groups and policies",
        tasks: &[
            "Create an admin IAM user",
            "Attach a managed policy to a group",
            "Stop using the root user for daily work",
        ],
        deliverables: &["IAM user with least-privilege group"],
        links: &["https://docs.aws.amazon.com/IAM/latest/UserGuide/introduction.html"],
    },
    Entry {
        id: "w2-sat",
        week: 2,
        day: SessionDay::Saturday,
        title: "Identity and Access",
        phase: "Phase 1: Foundations",
        topic: "Roles and temporary credentials",
        tasks: &[
            "Create a role for EC2",
            "Assume a role from the CLI",
        ],
        deliverables: &["Notes on when to use roles instead of users"],
        links: &["https://docs.aws.amazon.com/IAM/latest/UserGuide/id_roles.html"],
    },
    Entry {
        id: "w3-fri",
        week: 3,
        day: SessionDay::Friday,
        title: "Compute and Storage",
        phase: "Phase 2: Core Services",
        topic: "Launching EC2 instances",
        tasks: &[
            "Launch a t2.micro instance",
            "Connect over SSH",
            "Terminate the instance",
        ],
        deliverables: &["Screenshot of a running instance"],
        links: &["https://docs.aws.amazon.com/ec2/"],
    },
    Entry {
        id: "w3-sat",
        week: 3,
        day: SessionDay::Saturday,
        title: "Compute and Storage",
        phase: "Phase 2: Core Services",
        topic: "S3 buckets and static hosting",
        tasks: &[
            "Create a bucket",
            "Upload an object and set its permissions",
            "Host a static page",
        ],
        deliverables: &["Public URL of a static page"],
        links: &["https://docs.aws.amazon.com/s3/"],
    },
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

/// Built-in catalog used when the seed document cannot be fetched.
///
/// Every task starts unchecked, so every session starts incomplete.
#[must_use]
pub fn fallback_catalog() -> Vec<Session> {
    FALLBACK
        .iter()
        .filter_map(|entry| {
            let tasks = entry.tasks.iter().map(|t| Task::new(*t)).collect();
            Session::new(
                SessionId::new(entry.id),
                WeekId::new(entry.week),
                entry.day,
                entry.title,
                entry.topic,
                tasks,
            )
            .ok()
            .map(|s| {
                s.with_deliverables(owned(entry.deliverables))
                    .with_links(owned(entry.links))
                    .with_phase(entry.phase)
            })
        })
        .collect()
}
