//! match-api: HTTP transport for the matchmaking registry
//!
//! A single `/match` endpoint dispatches on a query flag
//! (`?create`, `?list`, `?ping`, `?update`, `?destroy`) and speaks the
//! `match://` / `result://` wire format. All protocol failures travel in
//! the wire error code; HTTP status stays 200.

pub mod handlers;
pub mod routes;
pub mod server;

pub use server::{start_server, AppState};
