//! Engines: identifiers, config records, payload validation and the
//! lifecycle manager that keeps an engine's records together

mod config;
mod id;
mod locks;
mod manager;
mod payload;
mod report;

pub use config::EngineConfig;
pub use id::EngineId;
pub use locks::{EngineGuard, EngineLocks};
pub use manager::EngineManager;
pub use payload::{DEFAULT_PRINCIPAL, DEFAULT_TTL_SECS, EngineConfigPayload, MAX_TTL_SECS};
pub use report::{DeleteOutcome, DeleteReport, DeleteStatus, EngineHealth};
