//! Router and lifecycle of the web process

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use artdeck_app::config::{load_settings, load_web_config, user_dir, workspace_gui_dir};
use artdeck_app::idle;
use artdeck_app::routes::base_url;
use artdeck_app::signals::wait_for_signal;
use artdeck_core::prelude::*;
use artdeck_daemon::{FsWorkspace, WorkspaceApi};

use crate::handlers;
use crate::state::{WebOptions, WebState, SESSION_TIMEOUT};

/// Host name public links are built with
const LINK_HOST: &str = "localhost";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebArgs {
    pub workspace: PathBuf,
    /// Shut down once no client was connected for this long
    pub timeout: Duration,
    /// Launch-file basename projects must have to be listed
    pub launch_file: Option<String>,
    pub no_ssl: bool,
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(handlers::overview))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/ping", get(handlers::ping))
        .route(
            "/resetpw/:user/:id",
            get(handlers::reset_form).post(handlers::reset_password),
        )
        .route("/productview/:project/:vg/:id", get(handlers::product_view))
        .route(
            "/productview/:project/:vg/:id/category",
            post(handlers::cycle_category),
        )
        .route(
            "/productview/:project/:vg/:id/files/*path",
            get(handlers::artefact_file),
        )
        .route("/admin/users", post(handlers::add_user))
        .route("/admin/productview", post(handlers::share_product_view))
        .with_state(state)
}

/// Expire silent sessions every `period` and finish once the process has
/// been idle for `timeout`
fn idle_watchdog(state: WebState, timeout: Duration, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;
        loop {
            interval.tick().await;
            let now = Instant::now();
            let expired = state.expire_sessions(now, SESSION_TIMEOUT);
            if expired > 0 {
                debug!("{} session(s) expired", expired);
            }
            if idle::should_exit(state.client_count(), state.last_disconnect(), now, timeout) {
                info!("No clients for {:?}, shutting down", timeout);
                break;
            }
        }
    })
}

/// Run the web process of a workspace until it is idle or signalled
pub async fn serve(args: WebArgs) -> Result<()> {
    let workspace = FsWorkspace::open(&args.workspace)?.with_launch_file(args.launch_file.clone());
    let root = workspace.root();
    let config = load_web_config(&root, &user_dir()?)?;
    if !args.no_ssl && config.cert_file.is_some() {
        warn!("TLS certificates are not supported, serving plain HTTP");
    }
    let base = base_url(LINK_HOST, config.port, false)?;

    let state = WebState::new(
        Arc::new(workspace),
        WebOptions {
            secret: config.secret_key,
            base: base.clone(),
            auth_dir: workspace_gui_dir(&root),
            settings: load_settings(&root),
        },
    );

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .map_err(|e| Error::server(format!("cannot listen on port {}: {}", config.port, e)))?;
    info!("Serving {} at {}", root.display(), base);
    println!("GUI web server running at {}", base);

    let watchdog = idle_watchdog(state.clone(), args.timeout, idle::check_interval(args.timeout));
    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = watchdog => {}
                signal = wait_for_signal() => {
                    if let Err(e) = signal {
                        warn!("Signal handling unavailable: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        })
        .await
        .map_err(|e| Error::server(format!("web server failed: {}", e)))?;

    state.close_all();
    info!("Web process stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn get_raw(addr: std::net::SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_routes_over_http() {
        let (_temp, state) = test_state();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        let overview = get_raw(addr, "/").await;
        assert!(overview.starts_with("HTTP/1.1 200"));
        assert!(overview.contains("set-cookie: artdeck_session="));
        assert!(overview.contains("demo/p1"));

        let missing = get_raw(addr, "/productview/demo+p1/vg1/nope").await;
        assert!(missing.starts_with("HTTP/1.1 403"));

        let unknown = get_raw(addr, "/nothing-here").await;
        assert!(unknown.starts_with("HTTP/1.1 404"));

        server.abort();
    }

    #[tokio::test]
    async fn test_watchdog_exits_when_idle() {
        let (_temp, state) = test_state();
        let watchdog = idle_watchdog(state, Duration::ZERO, Duration::from_millis(10));
        tokio::time::timeout(Duration::from_secs(2), watchdog)
            .await
            .expect("watchdog did not finish")
            .unwrap();
    }

    #[tokio::test]
    async fn test_watchdog_waits_for_clients() {
        let (_temp, state) = test_state();
        state.with_client("a", |_| ());
        let watchdog = idle_watchdog(state.clone(), Duration::ZERO, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!watchdog.is_finished());
        assert!(state.disconnect("a"));
        tokio::time::timeout(Duration::from_secs(2), watchdog)
            .await
            .expect("watchdog did not finish")
            .unwrap();
    }
}
