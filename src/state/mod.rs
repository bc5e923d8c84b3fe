//! Shared application state: question bank, room registry, and bindings.

pub mod bank;
pub mod binding;
pub mod log;
pub mod registry;
pub mod room;
pub mod scoreboard;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    state::{
        bank::{EmptyBank, QuestionBank},
        binding::ConnectionBindings,
        registry::SessionRegistry,
    },
};

/// Shared handle to [`AppState`], cloned into every connection task.
pub type SharedState = Arc<AppState>;

/// Central application state storing the question bank, the live rooms, and
/// the connection bindings. Initialized once at startup, shared for the
/// process lifetime.
pub struct AppState {
    bank: QuestionBank,
    registry: SessionRegistry,
    bindings: ConnectionBindings,
}

impl AppState {
    /// Construct the shared state from configuration, wrapped in an [`Arc`]
    /// so it can be cloned cheaply.
    ///
    /// Fails only when the configured question bank is empty, which is a
    /// startup configuration fault.
    pub fn new(config: &AppConfig) -> Result<SharedState, EmptyBank> {
        let bank = QuestionBank::new(config.questions().to_vec())?;
        Ok(Arc::new(Self {
            bank,
            registry: SessionRegistry::new(config.questions_per_game()),
            bindings: ConnectionBindings::new(),
        }))
    }

    /// Process-wide question bank.
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Registry of live rooms.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Connection to room/participant bindings.
    pub fn bindings(&self) -> &ConnectionBindings {
        &self.bindings
    }
}
