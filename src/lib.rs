// SpaceTraders state synchronization engine
// Keeps an in-memory agent, fleet and contract model in step with the server
// as actions are dispatched.

pub mod admiral;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod operations;
pub mod storage;

// Re-export commonly used types
pub use admiral::{Admiral, AdmiralError, FleetStatus};
pub use client::{HttpTransport, Method, Session, Transport};
pub use config::{ConfigError, SyncConfig};
pub use error::{ActionError, ApiError, ApiErrorCategory, StoreError};
pub use operations::{Action, ActionExecutor, ActionKind, ActionOutcome, Bootstrap, CooldownPolicy};
pub use storage::{CooldownTracker, EntityKey, EntityKind, EntityStore};
