// Storage module - in-memory entity and cooldown state
pub mod cooldown_store;
pub mod entity_store;

pub use cooldown_store::*;
pub use entity_store::*;
