#![forbid(unsafe_code)]

pub mod app_services;
pub mod dashboard;
pub mod error;
pub mod identity;
pub mod reflection_service;
pub mod schedule;
pub mod seed_source;
pub mod session_service;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use dashboard::{Dashboard, DashboardService, JOURNEY_COMPLETED, NextSession};
pub use error::{AppServicesError, ReflectionServiceError, SessionServiceError};
pub use identity::{GateDecision, Identity, IdentityGate, LocalIdentityGate, gate};
pub use reflection_service::{ReflectionDraft, ReflectionService};
pub use schedule::{ScheduleEntry, SessionStatus, WeekSchedule, build_schedule};
pub use seed_source::{DEFAULT_SEED_TIMEOUT, FileSeedSource, HttpSeedSource, seed_source_for};
pub use session_service::{SessionService, TaskToggle};
