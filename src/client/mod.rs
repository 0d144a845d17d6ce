// Client module - transport seam and the HTTP implementation
pub mod api;
pub mod session;
pub mod transport;

pub use api::HttpTransport;
pub use session::Session;
pub use transport::{Method, Transport};
