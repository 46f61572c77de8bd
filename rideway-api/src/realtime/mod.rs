pub mod dispatcher;
pub mod registry;
pub mod socket;

pub use dispatcher::Dispatcher;
pub use registry::{ConnectionId, SocketRegistry};

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/socket", get(socket::ws_handler))
}
