pub mod handler;
pub mod server;
pub mod types;

pub use handler::{Body, UpdateRequestHandler};
pub use server::UpdateServer;
pub use types::{Action, Route, UpdateManifest};
