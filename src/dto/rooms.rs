//! DTOs for the room discovery endpoint.

use serde::Serialize;
use utoipa::ToSchema;

/// Identifiers of rooms that currently have members, returned by `GET /rooms`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomList {
    /// Sorted room identifiers.
    pub rooms: Vec<String>,
}
