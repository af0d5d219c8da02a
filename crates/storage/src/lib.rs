#![forbid(unsafe_code)]

pub mod repository;
pub mod seed;
pub mod sqlite;
pub mod store;

pub use repository::{InMemoryMedium, KeyValueMedium, Storage, StorageError};
pub use seed::{SeedError, SeedSource, StaticSeedSource};
pub use store::{InitReport, SeedOrigin, VersionedStore};
