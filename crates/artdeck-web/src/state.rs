//! Shared state of the web process

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use url::Url;

use artdeck_app::auth::AuthStore;
use artdeck_app::config::{layout_config, Settings};
use artdeck_app::session_store::SessionStore;
use artdeck_app::ClientState;
use artdeck_core::prelude::*;
use artdeck_core::LayoutConfig;
use artdeck_daemon::WorkspaceApi;

/// Interval of the page heartbeat
pub const HEARTBEAT_SECS: u64 = 5;

/// A client not heard from for this long is disconnected
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(3 * HEARTBEAT_SECS);

/// Per-session state
#[derive(Debug)]
pub struct WebClient {
    pub client: ClientState,
    /// User whose password reset link was opened in this session
    pub reset_grant: Option<String>,
    /// Link created by the last admin action, shown once
    pub created_link: Option<String>,
    pub last_seen: Instant,
}

impl WebClient {
    pub fn new(id: &str) -> Self {
        Self {
            client: ClientState::new(id),
            reset_grant: None,
            created_link: None,
            last_seen: Instant::now(),
        }
    }
}

/// Startup parameters of [`WebState`]
#[derive(Debug, Clone)]
pub struct WebOptions {
    pub secret: String,
    pub base: Url,
    /// Directory of the user database
    pub auth_dir: PathBuf,
    pub settings: Settings,
}

struct Inner {
    workspace: Arc<dyn WorkspaceApi>,
    auth: AuthStore,
    sessions: Mutex<SessionStore<WebClient>>,
    secret: String,
    base: Url,
    layout: LayoutConfig,
}

/// Handle shared by all request handlers
#[derive(Clone)]
pub struct WebState {
    inner: Arc<Inner>,
}

impl WebState {
    pub fn new(workspace: Arc<dyn WorkspaceApi>, options: WebOptions) -> Self {
        let teardown_ws = Arc::clone(&workspace);
        let sessions = SessionStore::new(WebClient::new).on_destroy(move |_, mut state: WebClient| {
            state.client.teardown(teardown_ws.as_ref());
        });
        Self {
            inner: Arc::new(Inner {
                workspace,
                auth: AuthStore::new(options.auth_dir),
                sessions: Mutex::new(sessions),
                secret: options.secret,
                base: options.base,
                layout: layout_config(&options.settings),
            }),
        }
    }

    pub fn workspace(&self) -> &dyn WorkspaceApi {
        self.inner.workspace.as_ref()
    }

    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    pub fn secret(&self) -> &str {
        &self.inner.secret
    }

    /// Base URL public links are built on
    pub fn base(&self) -> &Url {
        &self.inner.base
    }

    pub fn layout_config(&self) -> LayoutConfig {
        self.inner.layout
    }

    fn sessions(&self) -> MutexGuard<'_, SessionStore<WebClient>> {
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the state of client `id`, connecting it on first contact
    pub fn with_client<R>(&self, id: &str, f: impl FnOnce(&mut WebClient) -> R) -> R {
        let mut sessions = self.sessions();
        let client = sessions.connect(id);
        client.last_seen = Instant::now();
        f(client)
    }

    /// Run `f` on the blocking pool, away from the session lock.
    ///
    /// Password hashing and user database reads go through here.
    pub async fn blocking<R>(&self, f: impl FnOnce(&WebState) -> R + Send + 'static) -> Result<R>
    where
        R: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state))
            .await
            .map_err(|e| Error::server(format!("Background task failed: {}", e)))
    }

    pub fn disconnect(&self, id: &str) -> bool {
        self.sessions().disconnect(id)
    }

    pub fn client_count(&self) -> usize {
        self.sessions().len()
    }

    pub fn last_disconnect(&self) -> Instant {
        self.sessions().last_disconnect()
    }

    /// Disconnect clients not seen for `timeout`; returns how many
    pub fn expire_sessions(&self, now: Instant, timeout: Duration) -> usize {
        let mut sessions = self.sessions();
        let stale: Vec<String> = sessions
            .iter_mut()
            .filter(|(_, c)| now.saturating_duration_since(c.last_seen) >= timeout)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            debug!("Session {} expired", id);
            sessions.disconnect(id);
        }
        stale.len()
    }

    /// Disconnect every client
    pub fn close_all(&self) {
        self.sessions().clear();
    }
}
