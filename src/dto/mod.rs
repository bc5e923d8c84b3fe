//! Wire-facing data transfer objects.

pub mod health;
pub mod rooms;
pub mod validation;
pub mod ws;
