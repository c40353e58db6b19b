//! HTTP API.
//!
//! `api_router()` returns a composable `Router` with every route, CORS,
//! request tracing and access logging. `server` binds it to a socket.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ApiSession};
pub use types::ApiContext;
