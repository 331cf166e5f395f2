//! Session lifecycle and registry
//!
//! Records, durable storage, credential checks and the registry that
//! orchestrates create/list/ping/close.

mod guard;
mod registry;
mod secret;
mod store;
mod types;

pub use guard::CredentialGuard;
pub use registry::{CreateRequest, SessionRegistry, UpdateRequest};
pub use secret::generate_secret;
pub use store::SessionStore;
pub use types::{NewSession, PublicSession, SessionPatch, SessionRecord, SessionState};
