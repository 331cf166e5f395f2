//! Request handlers
//!
//! Maps the transport surface onto registry operations: decodes the request
//! body, picks the operation from the query flag, and encodes the outcome
//! with its stable wire error code. Owner and host addresses always come
//! from the peer address, never from the body.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, State};
use chrono::Utc;
use tracing::{debug, warn};

use match_core::{CreateRequest, Error, SessionState, UpdateRequest};
use match_wire::{codes, decode_request, ResponseWriter};

use crate::server::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// The matchmaking endpoint; the query flag selects the operation.
pub async fn dispatch(
    State(app): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> String {
    let fields = match decode_request(&body) {
        Ok(fields) => fields,
        Err(e) => {
            debug!("Rejected request body from {}: {}", peer, e);
            return ResponseWriter::error(codes::QUERY_FAILED).finish();
        }
    };

    if query.contains_key("create") {
        create(&app, peer, &fields)
    } else if query.contains_key("list") {
        list(&app, &fields)
    } else if query.contains_key("ping") || query.contains_key("update") {
        // update is an alias of ping; both refresh the lease
        ping(&app, &fields)
    } else if query.contains_key("destroy") {
        destroy(&app, &fields)
    } else {
        debug!("Request from {} without a command flag", peer);
        ResponseWriter::error(codes::QUERY_FAILED).finish()
    }
}

fn create(app: &AppState, peer: SocketAddr, fields: &HashMap<String, String>) -> String {
    let (Some(game_id), Some(session_id), Some(title)) =
        (fields.get("gid"), fields.get("sid"), fields.get("title"))
    else {
        return ResponseWriter::error(codes::QUERY_FAILED).finish();
    };
    let Some(total_slots) = fields.get("slots").and_then(|s| s.parse::<u32>().ok()) else {
        return ResponseWriter::error(codes::QUERY_FAILED).finish();
    };

    let request = CreateRequest {
        game_id: game_id.clone(),
        session_id: session_id.clone(),
        title: title.clone(),
        total_slots,
        info: fields.get("info").cloned().unwrap_or_default(),
        owner_address: peer.ip().to_string(),
        host_address: peer.ip().to_string(),
        port: 0,
    };

    match app.registry.create(request, Utc::now()) {
        Ok(secret) => {
            let mut writer = ResponseWriter::success();
            writer.push("pass", secret);
            writer.finish()
        }
        Err(e) => error_response(&e),
    }
}

fn list(app: &AppState, fields: &HashMap<String, String>) -> String {
    let Some(game_id) = fields.get("gid") else {
        return ResponseWriter::error(codes::QUERY_FAILED).finish();
    };
    // A missing or malformed limit falls back to the configured cap
    let limit = fields
        .get("limit")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(usize::MAX);

    match app.registry.list(game_id, limit, Utc::now()) {
        Ok(sessions) => {
            let mut writer = ResponseWriter::success();
            writer.push("results", sessions.len());
            for (index, session) in sessions.iter().enumerate() {
                writer.push(&format!("sid:{}", index), &session.session_id);
                writer.push(&format!("ip:{}", index), &session.host_address);
                writer.push(&format!("title:{}", index), &session.title);
                writer.push(&format!("tslots:{}", index), session.total_slots);
                writer.push(&format!("uslots:{}", index), session.used_slots);
                writer.push(&format!("info:{}", index), &session.info);
            }
            writer.finish()
        }
        Err(e) => error_response(&e),
    }
}

fn ping(app: &AppState, fields: &HashMap<String, String>) -> String {
    let (Some(session_id), Some(secret)) = (fields.get("sid"), fields.get("pass")) else {
        return ResponseWriter::error(codes::QUERY_FAILED).finish();
    };

    let new_state = match fields.get("state") {
        None => None,
        Some(raw) => match raw.parse::<i64>().ok().and_then(SessionState::from_wire) {
            Some(state) => Some(state),
            None => return ResponseWriter::error(codes::QUERY_FAILED).finish(),
        },
    };
    let used_slots = match fields.get("uslots") {
        None => None,
        Some(raw) => match raw.parse::<u32>().ok() {
            Some(used) => Some(used),
            None => return ResponseWriter::error(codes::QUERY_FAILED).finish(),
        },
    };

    let request = UpdateRequest {
        session_id: session_id.clone(),
        secret: secret.clone(),
        state: new_state,
        used_slots,
        info: fields.get("info").cloned(),
    };

    match app.registry.ping(request, Utc::now()) {
        Ok(()) => ResponseWriter::success().finish(),
        Err(e) => error_response(&e),
    }
}

fn destroy(app: &AppState, fields: &HashMap<String, String>) -> String {
    let (Some(session_id), Some(secret)) = (fields.get("sid"), fields.get("pass")) else {
        return ResponseWriter::error(codes::QUERY_FAILED).finish();
    };

    match app.registry.close(session_id, secret, Utc::now()) {
        Ok(()) => ResponseWriter::success().finish(),
        Err(e) => error_response(&e),
    }
}

/// Map a registry error to its stable wire code.
fn error_response(error: &Error) -> String {
    let code = match error {
        Error::OwnerExists => codes::OWNER_EXISTS,
        Error::SessionExists => codes::SESSION_EXISTS,
        Error::SessionNotFound(_) => codes::INVALID_SESSION,
        Error::SecretMismatch => codes::INVALID_PASSWORD,
        Error::NoResults => codes::NO_RESULTS,
        // Storage faults and validation failures share the generic code
        _ => codes::QUERY_FAILED,
    };
    if code == codes::QUERY_FAILED {
        warn!("Operation failed: {}", error);
    }
    ResponseWriter::error(code).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use match_core::{Config, SessionRegistry, SessionStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let registry =
            SessionRegistry::new(SessionStore::in_memory().unwrap(), &Config::default());
        let state = AppState {
            registry: Arc::new(registry),
        };
        crate::routes::routes().with_state(state)
    }

    async fn call_from(app: &Router, peer: [u8; 4], uri: &str, body: &str) -> String {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .extension(ConnectInfo(SocketAddr::from((peer, 9000))))
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn extract_pass(response: &str) -> String {
        response
            .strip_prefix("result://error=0&pass=")
            .expect("create should succeed")
            .to_string()
    }

    #[tokio::test]
    async fn test_full_scenario() {
        let app = app();

        // Create from 1.2.3.4
        let response = call_from(
            &app,
            [1, 2, 3, 4],
            "/match?create",
            "match://gid=G1&sid=S1&title=Arena&slots=8&info=v1",
        )
        .await;
        let pass = extract_pass(&response);
        assert_eq!(pass.len(), 12);

        // Same sid from another owner is rejected
        let response = call_from(
            &app,
            [5, 6, 7, 8],
            "/match?create",
            "match://gid=G1&sid=S1&title=Other&slots=4&info=v1",
        )
        .await;
        assert_eq!(response, "result://error=3");

        // The session is listed with its public fields
        let response =
            call_from(&app, [9, 9, 9, 9], "/match?list", "match://gid=G1&limit=10").await;
        assert!(response.starts_with("result://error=0&results=1"));
        assert!(response.contains("&sid:0=S1"));
        assert!(response.contains("&ip:0=1.2.3.4"));
        assert!(response.contains("&title:0=Arena"));
        assert!(response.contains("&tslots:0=8"));
        assert!(response.contains("&uslots:0=0"));
        assert!(response.contains("&info:0=v1"));

        // Ping with an occupancy change
        let body = format!("match://sid=S1&pass={}&uslots=3", pass);
        let response = call_from(&app, [1, 2, 3, 4], "/match?ping", &body).await;
        assert_eq!(response, "result://error=0");

        let response =
            call_from(&app, [9, 9, 9, 9], "/match?list", "match://gid=G1&limit=10").await;
        assert!(response.contains("&uslots:0=3"));

        // Destroy with a wrong secret fails and changes nothing
        let response = call_from(
            &app,
            [1, 2, 3, 4],
            "/match?destroy",
            "match://sid=S1&pass=WRONG0000000",
        )
        .await;
        assert_eq!(response, "result://error=5");

        let response =
            call_from(&app, [9, 9, 9, 9], "/match?list", "match://gid=G1&limit=10").await;
        assert!(response.contains("&sid:0=S1"));

        // Destroy with the right secret; the list is then empty
        let body = format!("match://sid=S1&pass={}", pass);
        let response = call_from(&app, [1, 2, 3, 4], "/match?destroy", &body).await;
        assert_eq!(response, "result://error=0");

        let response =
            call_from(&app, [9, 9, 9, 9], "/match?list", "match://gid=G1&limit=10").await;
        assert_eq!(response, "result://error=6");
    }

    #[tokio::test]
    async fn test_owner_exists_code() {
        let app = app();

        call_from(
            &app,
            [1, 2, 3, 4],
            "/match?create",
            "match://gid=G1&sid=S1&title=Arena&slots=8",
        )
        .await;
        let response = call_from(
            &app,
            [1, 2, 3, 4],
            "/match?create",
            "match://gid=G1&sid=S2&title=Arena&slots=8",
        )
        .await;
        assert_eq!(response, "result://error=2");
    }

    #[tokio::test]
    async fn test_update_is_alias_of_ping() {
        let app = app();

        let response = call_from(
            &app,
            [1, 2, 3, 4],
            "/match?create",
            "match://gid=G1&sid=S1&title=Arena&slots=8",
        )
        .await;
        let pass = extract_pass(&response);

        let body = format!("match://sid=S1&pass={}&uslots=2&info=round2", pass);
        let response = call_from(&app, [1, 2, 3, 4], "/match?update", &body).await;
        assert_eq!(response, "result://error=0");

        let response =
            call_from(&app, [9, 9, 9, 9], "/match?list", "match://gid=G1&limit=10").await;
        assert!(response.contains("&uslots:0=2"));
        assert!(response.contains("&info:0=round2"));
    }

    #[tokio::test]
    async fn test_unknown_session_code() {
        let app = app();

        let response = call_from(
            &app,
            [1, 2, 3, 4],
            "/match?ping",
            "match://sid=NOPE&pass=SECRET123456",
        )
        .await;
        assert_eq!(response, "result://error=4");
    }

    #[tokio::test]
    async fn test_missing_marker_rejected() {
        let app = app();

        let response = call_from(&app, [1, 2, 3, 4], "/match?list", "gid=G1&limit=10").await;
        assert_eq!(response, "result://error=1");
    }

    #[tokio::test]
    async fn test_missing_command_flag() {
        let app = app();

        let response = call_from(&app, [1, 2, 3, 4], "/match", "match://gid=G1").await;
        assert_eq!(response, "result://error=1");
    }

    #[tokio::test]
    async fn test_slot_overflow_is_generic_failure() {
        let app = app();

        let response = call_from(
            &app,
            [1, 2, 3, 4],
            "/match?create",
            "match://gid=G1&sid=S1&title=Arena&slots=8",
        )
        .await;
        let pass = extract_pass(&response);

        let body = format!("match://sid=S1&pass={}&uslots=9", pass);
        let response = call_from(&app, [1, 2, 3, 4], "/match?ping", &body).await;
        assert_eq!(response, "result://error=1");
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
