//! Orchestration services sitting between routes and shared state.

pub mod documentation;
pub mod room_service;
pub mod websocket_service;
