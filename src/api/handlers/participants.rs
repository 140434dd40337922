//! Participant roster snapshot.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::RosterResponse;
use crate::app_state::AppState;

/// `GET /participants`: Current ready roster and connection counts.
#[utoipa::path(
    get,
    path = "/api/v1/participants",
    tag = "Participants",
    summary = "Roster snapshot",
    description = "Returns the identities of ready participants in join order, plus connection counts per lifecycle state.",
    responses(
        (status = 200, description = "Roster snapshot", body = RosterResponse),
    )
)]
pub async fn list_participants(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry();
    let participants = registry.ready_roster().await;
    let stats = registry.stats().await;
    (
        StatusCode::OK,
        Json(RosterResponse::new(participants, stats)),
    )
}

/// Participant routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/participants", get(list_participants))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::RelayConfig;
    use crate::domain::{ConnectionHandle, Identity};

    async fn fetch(state: AppState) -> Value {
        let app = routes().with_state(state);
        let Ok(request) = Request::builder().uri("/participants").body(Body::empty()) else {
            panic!("valid request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router is infallible");
        };
        assert_eq!(response.status(), StatusCode::OK);
        let Ok(body) = to_bytes(response.into_body(), 4096).await else {
            panic!("readable body");
        };
        serde_json::from_slice(&body).unwrap_or_default()
    }

    #[tokio::test]
    async fn empty_registry() {
        let json = fetch(AppState::new(RelayConfig::default())).await;
        assert_eq!(json.get("participants"), Some(&json!([])));
        assert_eq!(json.get("pending"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn lists_ready_participants_only() {
        let state = AppState::new(RelayConfig::default());
        let registry = state.registry();

        let mut ids = Vec::new();
        let mut queues = Vec::new();
        for _ in 0..3 {
            let (handle, rx) = ConnectionHandle::channel(4);
            ids.push(handle.id());
            queues.push(rx);
            registry.register_pending(handle).await;
        }
        let Some((&alice, rest)) = ids.split_first() else {
            panic!("three connections");
        };
        let Some(&bob) = rest.first() else {
            panic!("three connections");
        };
        let (Ok(a), Ok(b)) = (Identity::parse("alice"), Identity::parse("bob")) else {
            panic!("valid identities");
        };
        assert!(registry.assign_identity(alice, a).await.is_ok());
        assert!(registry.assign_identity(bob, b).await.is_ok());
        assert!(registry.mark_ready(bob).await.is_ok());

        let json = fetch(state).await;
        assert_eq!(json.get("participants"), Some(&json!(["bob"])));
        assert_eq!(json.get("pending"), Some(&json!(1)));
        assert_eq!(json.get("identified"), Some(&json!(2)));
        assert_eq!(json.get("ready"), Some(&json!(1)));
    }
}
