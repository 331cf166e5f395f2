//! Session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a session.
///
/// The discriminants are the stable integers used on the wire and in the
/// database; they must not be renumbered. Ordering follows the lifecycle, so
/// a transition is forward iff the target compares greater or equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Being set up, not yet joinable
    Creating = 1,
    /// Advertised and joinable
    Active = 2,
    /// The match has begun
    Started = 3,
    /// Winding down
    Closing = 4,
    /// Explicitly closed by its owner (terminal)
    Closed = 5,
    /// Lease lapsed without a ping (terminal, sweeper only)
    Timeout = 6,
}

impl SessionState {
    /// Parse a wire/database integer.
    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Creating),
            2 => Some(Self::Active),
            3 => Some(Self::Started),
            4 => Some(Self::Closing),
            5 => Some(Self::Closed),
            6 => Some(Self::Timeout),
            _ => None,
        }
    }

    /// The stable wire/database integer.
    pub fn as_wire(self) -> i64 {
        self as i64
    }

    /// Closed and Timeout are terminal; a record never leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Timeout)
    }

    /// Whether an explicit update may move a session from `self` to `next`.
    ///
    /// Transitions only move forward; re-asserting the current state is
    /// allowed (a bare heartbeat). Timeout is reserved for the sweeper.
    pub fn can_become(self, next: Self) -> bool {
        !self.is_terminal() && next != Self::Timeout && next >= self
    }
}

/// One advertised lobby, as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Store-assigned id, never reused
    pub id: i64,
    /// Game/title family this session belongs to
    pub game_id: String,
    pub created_at: DateTime<Utc>,
    /// End of the current lease; advanced on every ping
    pub expires_at: DateTime<Utc>,
    /// Network identity of the creator
    pub owner_address: String,
    /// Client-chosen external identifier, unique while live
    pub session_id: String,
    /// Server-generated credential, revealed only at creation
    pub secret: String,
    /// Connection endpoint advertised to joiners
    pub host_address: String,
    /// Optional port, 0 when unused
    pub port: u16,
    pub state: SessionState,
    pub title: String,
    pub total_slots: u32,
    pub used_slots: u32,
    /// Opaque metadata blob, passed through unmodified
    pub info: String,
}

/// A candidate record for insertion; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub game_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub owner_address: String,
    pub session_id: String,
    pub secret: String,
    pub host_address: String,
    pub port: u16,
    pub state: SessionState,
    pub title: String,
    pub total_slots: u32,
    pub info: String,
}

/// Partial update applied to an existing record.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub expires_at: Option<DateTime<Utc>>,
    pub state: Option<SessionState>,
    pub used_slots: Option<u32>,
    pub info: Option<String>,
}

/// The fields a list query exposes to prospective joiners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicSession {
    pub session_id: String,
    pub host_address: String,
    pub title: String,
    pub total_slots: u32,
    pub used_slots: u32,
    pub info: String,
}

impl From<&SessionRecord> for PublicSession {
    fn from(record: &SessionRecord) -> Self {
        Self {
            session_id: record.session_id.clone(),
            host_address: record.host_address.clone(),
            title: record.title.clone(),
            total_slots: record.total_slots,
            used_slots: record.used_slots,
            info: record.info.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_round_trip() {
        for state in [
            SessionState::Creating,
            SessionState::Active,
            SessionState::Started,
            SessionState::Closing,
            SessionState::Closed,
            SessionState::Timeout,
        ] {
            assert_eq!(SessionState::from_wire(state.as_wire()), Some(state));
        }
        assert_eq!(SessionState::from_wire(0), None);
        assert_eq!(SessionState::from_wire(7), None);
    }

    #[test]
    fn test_forward_only_transitions() {
        assert!(SessionState::Active.can_become(SessionState::Started));
        assert!(SessionState::Active.can_become(SessionState::Active));
        assert!(SessionState::Started.can_become(SessionState::Closing));
        assert!(SessionState::Closing.can_become(SessionState::Closed));

        // Backwards is rejected
        assert!(!SessionState::Started.can_become(SessionState::Active));
        assert!(!SessionState::Closing.can_become(SessionState::Creating));

        // Timeout belongs to the sweeper
        assert!(!SessionState::Active.can_become(SessionState::Timeout));

        // Terminal states never move
        assert!(!SessionState::Closed.can_become(SessionState::Closed));
        assert!(!SessionState::Timeout.can_become(SessionState::Closed));
    }
}
