pub mod action;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod server;
pub mod utils;
pub mod webhook;

use std::sync::Arc;
use tokio::sync::Mutex;

use action::ActionDispatcher;
use config::ListenerConfig;

pub struct AppState {
    pub config: ListenerConfig,
    pub dispatcher: ActionDispatcher,
    /// Held while an action script runs when `serialize_actions` is set.
    pub action_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: ListenerConfig) -> Self {
        let dispatcher = ActionDispatcher::new(config.action_script_path.clone());
        Self::with_dispatcher(config, dispatcher)
    }

    pub fn with_dispatcher(config: ListenerConfig, dispatcher: ActionDispatcher) -> Self {
        Self {
            config,
            dispatcher,
            action_lock: Mutex::new(()),
        }
    }
}

pub type SharedState = Arc<AppState>;
