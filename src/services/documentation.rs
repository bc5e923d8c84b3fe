//! OpenAPI document aggregation.

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quizroom Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::list_rooms,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::rooms::RoomList,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dto::ws::HistoryEntry,
            crate::dto::ws::ScoreEntry,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room discovery"),
        (name = "quiz", description = "WebSocket operations for quiz clients"),
    )
)]
pub struct ApiDoc;
