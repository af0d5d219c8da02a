mod catalog;
mod ids;
mod reflection;
mod session;

pub use ids::{ParseIdError, SessionId, WeekId};

pub use catalog::{CatalogError, fallback_catalog, validate_catalog};
pub use reflection::{
    Reflection, ReflectionError, UpsertOutcome, most_recent_first, upsert_reflection,
};
pub use session::{Session, SessionDay, SessionError, SessionPatch, Task, derive_completion};
