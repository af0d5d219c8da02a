#![forbid(unsafe_code)]

pub mod model;
pub mod progress;
pub mod time;
pub mod version;

pub use time::Clock;
