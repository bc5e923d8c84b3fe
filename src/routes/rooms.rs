//! Room discovery endpoint.

use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::rooms::RoomList, state::SharedState};

#[utoipa::path(
    get,
    path = "/rooms",
    tag = "rooms",
    responses((status = 200, description = "Identifiers of live rooms", body = RoomList))
)]
/// List identifiers of rooms that currently have members.
pub async fn list_rooms(State(state): State<SharedState>) -> Json<RoomList> {
    Json(RoomList {
        rooms: state.registry().list(),
    })
}

/// Configure the room discovery subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms", get(list_rooms))
}
