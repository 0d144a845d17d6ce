// Operations module - action catalog, executor and the layers on top of it

pub mod actions;
pub mod bootstrap;
pub mod executor;
pub mod outcome;
pub mod ship_actor;

pub use actions::*;
pub use bootstrap::{fetch_snapshot, Bootstrap, BootstrapError};
pub use executor::*;
pub use outcome::*;
pub use ship_actor::*;
