//! Console runner - entry point and event loop

use std::sync::Arc;
use std::time::Duration;

use artdeck_app::config::Settings;
use artdeck_app::message::Message;
use artdeck_app::process;
use artdeck_app::product_view::CachedScan;
use artdeck_app::signals;
use artdeck_app::state::AppState;
use artdeck_app::Services;
use artdeck_core::prelude::*;
use artdeck_daemon::WorkspaceApi;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::render::FrameInfo;
use crate::{event, render};

/// Longest wait for a key press between two frames
const FRAME_TIMEOUT: Duration = Duration::from_millis(50);

/// Run the console on a workspace until the user quits or a signal arrives.
/// Running jobs are terminated on the way out.
pub async fn run(workspace: Arc<dyn WorkspaceApi>, settings: Settings) -> Result<()> {
    restore_on_panic();

    let debounce = Duration::from_millis(settings.product_view.debounce_ms);
    let poll_interval = Duration::from_millis(settings.behavior.poll_interval_ms.max(50));

    let mut state = AppState::new(workspace, settings);
    state.load_projects();
    info!("Console started with {} projects", state.projects.len());

    let (msg_tx, msg_rx) = mpsc::channel::<Message>(256);
    let signal_task = signals::spawn_signal_handler(msg_tx.clone());
    let tick_task = spawn_ticker(msg_tx.clone(), poll_interval);
    let mut services = Services::new(CachedScan, debounce);

    let mut term = ratatui::init();
    let result = run_loop(&mut term, &mut state, msg_rx, &msg_tx, &mut services);

    process::shutdown(&mut state, &mut services);
    ratatui::restore();
    signal_task.abort();
    tick_task.abort();
    result
}

/// Leave raw mode before the default hook prints the panic
fn restore_on_panic() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        previous(info);
    }));
}

/// Poll timer of the job monitors
fn spawn_ticker(tx: mpsc::Sender<Message>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if tx.send(Message::Tick).await.is_err() {
                break;
            }
        }
    })
}

fn run_loop(
    terminal: &mut ratatui::DefaultTerminal,
    state: &mut AppState,
    mut msg_rx: mpsc::Receiver<Message>,
    msg_tx: &mpsc::Sender<Message>,
    services: &mut Services<CachedScan>,
) -> Result<()> {
    let mut last_viewport = None;

    while !state.should_quit() {
        // Ticks, scan results, watcher events and signals
        while let Ok(msg) = msg_rx.try_recv() {
            process::process_message(state, msg, msg_tx, services);
        }

        let mut info = FrameInfo::default();
        terminal.draw(|frame| info = render::view(frame, state))?;

        let current = viewport_of(state, info);
        if let Some(msg) = viewport_message(&last_viewport, &current) {
            process::process_message(state, msg, msg_tx, services);
        }
        last_viewport = current;

        if let Some(message) = event::poll(FRAME_TIMEOUT)? {
            process::process_message(state, message, msg_tx, services);
        }
    }
    Ok(())
}

/// Selected tab and the output pane height it was drawn with
type Viewport = Option<(String, usize)>;

fn viewport_of(state: &AppState, info: FrameInfo) -> Viewport {
    let key = state.client.tabs().selected_key()?.to_string();
    info.output_viewport.map(|lines| (key, lines))
}

/// Tell the monitor about a new pane height or a newly selected launch tab
fn viewport_message(last: &Viewport, current: &Viewport) -> Option<Message> {
    match current {
        Some((_, lines)) if last != current => Some(Message::OutputViewport { lines: *lines }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(tab: &str, lines: usize) -> Viewport {
        Some((tab.to_string(), lines))
    }

    #[test]
    fn test_viewport_message_on_change_only() {
        assert!(viewport_message(&None, &None).is_none());
        assert!(matches!(
            viewport_message(&None, &viewport("launch:1", 20)),
            Some(Message::OutputViewport { lines: 20 })
        ));
        assert!(viewport_message(&viewport("launch:1", 20), &viewport("launch:1", 20)).is_none());
        assert!(matches!(
            viewport_message(&viewport("launch:1", 20), &viewport("launch:1", 12)),
            Some(Message::OutputViewport { lines: 12 })
        ));
        assert!(viewport_message(&viewport("launch:1", 20), &None).is_none());
    }

    #[test]
    fn test_new_launch_tab_gets_viewport() {
        assert!(matches!(
            viewport_message(&viewport("launch:1", 20), &viewport("launch:2", 20)),
            Some(Message::OutputViewport { lines: 20 })
        ));
    }

    #[tokio::test]
    async fn test_ticker_sends_ticks() {
        let (tx, mut rx) = mpsc::channel(4);
        let task = spawn_ticker(tx, Duration::from_millis(10));
        let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert!(matches!(msg, Some(Message::Tick)));
        task.abort();
    }
}
