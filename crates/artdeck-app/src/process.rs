//! Message processing
//!
//! Runs the TEA update loop for one incoming message and hands every
//! resulting action to the background [`Services`].

use tokio::sync::mpsc;

use artdeck_core::prelude::*;

use crate::actions::Services;
use crate::handler;
use crate::message::Message;
use crate::product_view::ScanSource;
use crate::state::AppState;

/// Process a message through the TEA update function
pub fn process_message<S>(
    state: &mut AppState,
    message: Message,
    msg_tx: &mpsc::Sender<Message>,
    services: &mut Services<S>,
) where
    S: ScanSource + Clone + Send + Sync + 'static,
{
    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, m);
        if let Some(action) = result.action {
            services.handle_action(action, msg_tx.clone());
        }
        msg = result.message;
    }
}

/// Release what the console holds before exiting: jobs of every launch tab
/// are terminated, their variant instances removed and watching stops.
pub fn shutdown<S>(state: &mut AppState, services: &mut Services<S>)
where
    S: ScanSource + Clone + Send + Sync + 'static,
{
    info!("Shutting down client '{}'", state.client.id());
    services.shutdown();
    let workspace = state.workspace.clone();
    state.client.teardown(workspace.as_ref());
}
