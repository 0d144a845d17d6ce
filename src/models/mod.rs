// Models module - Entities and wire payloads

pub mod agent;
pub mod ship;
pub mod contract;
pub mod transaction;
pub mod navigation;
pub mod system;
pub mod waypoint;
pub mod responses;

// Re-export all models for easier imports
pub use agent::*;
pub use ship::*;
pub use contract::*;
pub use transaction::*;
pub use navigation::*;
pub use system::*;
pub use waypoint::*;
pub use responses::*;
