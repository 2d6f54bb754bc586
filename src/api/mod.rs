//! HTTP surface for word and letter predictions

pub mod routes;
pub mod server;
pub mod state;
pub mod types;

pub use routes::create_router;
pub use server::run_server;
pub use state::{AppState, AppStateHandle};
pub use types::*;
