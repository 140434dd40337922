//! OpenAPI document for the HTTP surface.

use utoipa::OpenApi;

use crate::api::dto::RosterResponse;
use crate::api::handlers::{participants, system};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of every REST endpoint.
///
/// The WebSocket protocol at `/ws` is not described here.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "audio-relay-gateway",
        description = "Presence tracking and signaling relay for multi-party audio sessions"
    ),
    paths(
        system::banner_handler,
        system::health_handler,
        participants::list_participants,
    ),
    components(schemas(RosterResponse, system::HealthResponse, ErrorResponse, ErrorBody)),
    tags(
        (name = "System", description = "Service status"),
        (name = "Participants", description = "Presence roster"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_all_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/"));
        assert!(paths.contains_key("/health"));
        assert!(paths.contains_key("/api/v1/participants"));
    }
}
