//! match-core: Matchmaking Registry Core Library
//!
//! Session lifecycle, durable storage and credential checks for the
//! matchmaking service. Transport and wire encoding live in sibling crates.

pub mod config;
pub mod error;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{
    CreateRequest, NewSession, PublicSession, SessionPatch, SessionRecord, SessionRegistry,
    SessionState, SessionStore, UpdateRequest,
};
