//! Session registry
//!
//! The orchestrator behind the four matchmaking operations. Each call runs
//! as an independent unit of work; the store is the only shared state and
//! resolves contention inside its own atomic statements. Expiry is lazy:
//! a sweep runs at the start of every create and list, so no response can
//! include a session whose lease has lapsed.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

use crate::session::{
    generate_secret, CredentialGuard, NewSession, PublicSession, SessionPatch, SessionState,
    SessionStore,
};
use crate::{Config, Error, Result};

/// Inputs for advertising a new session.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub game_id: String,
    pub session_id: String,
    pub title: String,
    pub total_slots: u32,
    pub info: String,
    /// Taken from the transport peer address, never from the request body
    pub owner_address: String,
    pub host_address: String,
    pub port: u16,
}

/// Inputs for a ping/update; `update` is an alias of `ping` on the wire.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub session_id: String,
    pub secret: String,
    pub state: Option<SessionState>,
    pub used_slots: Option<u32>,
    pub info: Option<String>,
}

/// Orchestrates create/list/ping/close against the session store.
pub struct SessionRegistry {
    /// Persistent storage (wrapped in Mutex for thread safety)
    store: Arc<Mutex<SessionStore>>,
    /// Lease duration granted at creation and on every ping
    ttl: TimeDelta,
    /// Hard cap on list results
    max_results: usize,
}

impl SessionRegistry {
    /// Create a registry over a store, with limits from the configuration.
    pub fn new(store: SessionStore, config: &Config) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            ttl: TimeDelta::seconds(config.session_ttl_secs),
            max_results: config.max_results,
        }
    }

    /// Advertise a new session and return the generated secret.
    ///
    /// This is the only moment the secret is ever revealed. The sweep runs
    /// first so a stale Active record does not block its owner from
    /// creating again.
    pub fn create(&self, request: CreateRequest, now: DateTime<Utc>) -> Result<String> {
        let store = self.store.lock().unwrap();

        let swept = store.sweep_expired(now)?;
        if swept > 0 {
            debug!("Swept {} expired sessions before create", swept);
        }

        let secret = generate_secret();
        let session = NewSession {
            game_id: request.game_id,
            created_at: now,
            expires_at: now + self.ttl,
            owner_address: request.owner_address,
            session_id: request.session_id,
            secret: secret.clone(),
            host_address: request.host_address,
            port: request.port,
            state: SessionState::Active,
            title: request.title,
            total_slots: request.total_slots,
            info: request.info,
        };

        let id = store.insert(&session)?;
        info!(
            "Created session {} (id {}) for game {}",
            session.session_id, id, session.game_id
        );

        Ok(secret)
    }

    /// List joinable sessions for a game.
    ///
    /// The requested limit is clamped to the configured maximum. An empty
    /// result is reported as [`Error::NoResults`]; that is an expected
    /// outcome, not a backend fault.
    pub fn list(
        &self,
        game_id: &str,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<PublicSession>> {
        let store = self.store.lock().unwrap();

        let swept = store.sweep_expired(now)?;
        if swept > 0 {
            debug!("Swept {} expired sessions before list", swept);
        }

        let limit = limit.min(self.max_results);
        let records = store.find_by_game(game_id, SessionState::Active, now, limit)?;
        if records.is_empty() {
            return Err(Error::NoResults);
        }

        Ok(records.iter().map(PublicSession::from).collect())
    }

    /// Refresh a session's lease and apply any field changes.
    pub fn ping(&self, request: UpdateRequest, now: DateTime<Utc>) -> Result<()> {
        let store = self.store.lock().unwrap();

        let record = CredentialGuard::authorize(&store, &request.session_id, &request.secret)?;

        if let Some(next) = request.state {
            if !record.state.can_become(next) {
                return Err(Error::InvalidTransition {
                    from: record.state,
                    to: next,
                });
            }
        }

        if let Some(used) = request.used_slots {
            if used > record.total_slots {
                return Err(Error::SlotsExceeded {
                    used,
                    total: record.total_slots,
                });
            }
        }

        // The heartbeat: every authorized ping extends the lease
        let patch = SessionPatch {
            expires_at: Some(now + self.ttl),
            state: request.state,
            used_slots: request.used_slots,
            info: request.info,
        };
        store.update_fields(record.id, &patch)?;

        debug!("Pinged session {}", request.session_id);
        Ok(())
    }

    /// Close a session; no further mutation is permitted afterward.
    pub fn close(&self, session_id: &str, secret: &str, _now: DateTime<Utc>) -> Result<()> {
        let store = self.store.lock().unwrap();

        let record = CredentialGuard::authorize(&store, session_id, secret)?;
        store.update_fields(
            record.id,
            &SessionPatch {
                state: Some(SessionState::Closed),
                ..Default::default()
            },
        )?;

        info!("Closed session {}", session_id);
        Ok(())
    }
}
