pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, SchedulePolicy};
pub use error::IngestError;
pub use types::*;
