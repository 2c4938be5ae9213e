//! HTTP surface for peakstreak: axum handlers, JWT middleware and the
//! local-disk avatar store.

pub mod auth;
pub mod error;
pub mod feeds;
pub mod habits;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod storage;
pub mod users;

mod validate;

pub use routes::router;
pub use state::{AppState, AppStateInner};
pub use storage::LocalStorage;
