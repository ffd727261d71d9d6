//! Route handlers
//!
//! Each handler resolves the session from the request cookie and answers
//! with a page or a redirect. User database work runs on the blocking pool;
//! the session lock is only taken to read or store client state. Failures
//! surface as [`PageError`] pages.

use std::path::{Path, PathBuf};

use axum::extract::{Form, Path as UrlPath, Query, State};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use url::Url;

use artdeck_app::auth::{LoginState, PUBLIC_USER};
use artdeck_app::product_view::{CachedScan, ProductViewState, ScanRequest, ScanSource};
use artdeck_app::routes::{
    apply_new_password, check_new_password, check_product_view_link, create_add_user_link,
    create_product_view_link, decode_id, default_product_view_expire, default_user_expire,
    open_reset_link, productview_path, resetpw_path,
};
use artdeck_core::prelude::*;
use artdeck_core::view_dim::ArtefactCell;
use artdeck_core::{CategoryPath, LayoutNode};
use artdeck_daemon::production::PRODUCTION_FILE;

use crate::pages::{self, Overview, ProductViewHtml, ProjectEntry};
use crate::session::{clear_cookie_header, Session};
use crate::state::WebState;

/// Characters escaped in a file path segment
const FILE_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A request that ends in an error page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    Forbidden(String),
    NotFound(String),
    Failed(String),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, title, text) = match self {
            Self::Forbidden(text) => (StatusCode::FORBIDDEN, "Access denied", text),
            Self::NotFound(text) => (StatusCode::NOT_FOUND, "Not available", text),
            Self::Failed(text) => (StatusCode::INTERNAL_SERVER_ERROR, "Error", text),
        };
        (status, Html(pages::message_page(title, &text))).into_response()
    }
}

impl From<Error> for PageError {
    fn from(e: Error) -> Self {
        Self::Failed(e.to_string())
    }
}

fn session(state: &WebState, headers: &HeaderMap) -> Session {
    Session::resolve(state.secret(), headers)
}

// ─────────────────────────────────────────────────────────────────
// Overview and login
// ─────────────────────────────────────────────────────────────────

fn project_entries(state: &WebState) -> Result<Vec<ProjectEntry>> {
    let workspace = state.workspace();
    let entries = workspace
        .project_ids()?
        .into_iter()
        .map(|id| {
            let variant_groups = workspace.variant_groups(&id).unwrap_or_else(|e| {
                warn!("Variant groups of {} unavailable: {}", id, e);
                Vec::new()
            });
            ProjectEntry { id, variant_groups }
        })
        .collect();
    Ok(entries)
}

/// What a client may see, derived from a snapshot of its login
struct Access {
    need_auth: bool,
    user: String,
    is_admin: bool,
}

/// Snapshot the login under the session lock, then read the user
/// database on the blocking pool
async fn access(state: &WebState, id: &str) -> Result<Access> {
    let login = state.with_client(id, |c| c.client.login.clone());
    state
        .blocking(move |s| {
            let auth = s.auth();
            Access {
                need_auth: login.need_auth(auth),
                user: login.username(auth).unwrap_or_else(|| PUBLIC_USER.to_string()),
                is_admin: login.is_admin(auth),
            }
        })
        .await
}

pub async fn overview(State(state): State<WebState>, headers: HeaderMap) -> Response {
    let session = session(&state, &headers);
    let access = match access(&state, &session.id).await {
        Ok(access) => access,
        Err(e) => return session.respond(PageError::from(e)),
    };
    if access.need_auth {
        return session.respond(Redirect::to("/login"));
    }

    let (projects, load_error) = match project_entries(&state) {
        Ok(projects) => (projects, None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };
    let workspace = state.workspace().root().display().to_string();
    let (link, notice) = state.with_client(&session.id, |c| {
        (c.created_link.take(), c.client.take_notifications().pop())
    });
    let error = notice.or(load_error);
    let html = pages::overview_page(&Overview {
        workspace: &workspace,
        user: &access.user,
        is_admin: access.is_admin,
        can_logout: access.user != PUBLIC_USER,
        projects: &projects,
        link: link.as_deref(),
        error: error.as_deref(),
    });
    session.respond(Html(html))
}

pub async fn login_form(State(state): State<WebState>, headers: HeaderMap) -> Response {
    let session = session(&state, &headers);
    match access(&state, &session.id).await {
        Ok(access) if access.need_auth => session.respond(Html(pages::login_page(None))),
        Ok(_) => session.respond(Redirect::to("/")),
        Err(e) => session.respond(PageError::from(e)),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<WebState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let session = session(&state, &headers);
    let user = form.username.trim().to_string();
    let checked = {
        let user = user.clone();
        state
            .blocking(move |s| LoginState::check_credentials(s.auth(), &user, &form.password))
            .await
    };
    let result = match checked {
        Ok(result) => result,
        Err(e) => return session.respond(PageError::from(e)),
    };
    state.with_client(&session.id, |c| c.client.login.record_login(&user, &result));
    if result.is_valid() {
        session.respond(Redirect::to("/"))
    } else {
        session.respond((
            StatusCode::UNAUTHORIZED,
            Html(pages::login_page(Some(result.message()))),
        ))
    }
}

/// Log out and drop the client's state
pub async fn logout(State(state): State<WebState>, headers: HeaderMap) -> Response {
    let session = session(&state, &headers);
    if !session.is_new() {
        state.disconnect(&session.id);
    }
    ([(SET_COOKIE, clear_cookie_header())], Redirect::to("/login")).into_response()
}

/// Heartbeat of open pages
pub async fn ping(State(state): State<WebState>, headers: HeaderMap) -> Response {
    let session = session(&state, &headers);
    state.with_client(&session.id, |_| ());
    session.respond(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────
// Password reset
// ─────────────────────────────────────────────────────────────────

fn holds_reset_grant(state: &WebState, session: &Session, user: &str) -> bool {
    state.with_client(&session.id, |c| c.reset_grant.as_deref() == Some(user))
}

/// Open a reset link. The link is used up; the session keeps the right to
/// set the password until it does.
pub async fn reset_form(
    State(state): State<WebState>,
    UrlPath((user, id)): UrlPath<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let session = session(&state, &headers);
    let action = resetpw_path(&user, &id);
    if !holds_reset_grant(&state, &session, &user) {
        let opened = {
            let user = user.clone();
            state
                .blocking(move |s| open_reset_link(s.auth(), &user, &id))
                .await
        };
        match opened {
            Ok(result) if result.is_valid() => {
                state.with_client(&session.id, |c| c.reset_grant = Some(user.clone()));
            }
            Ok(result) => {
                return session.respond(PageError::Forbidden(result.message().to_string()))
            }
            Err(e) => return session.respond(PageError::from(e)),
        }
    }
    session.respond(Html(pages::reset_page(&user, &action, None)))
}

#[derive(Debug, Deserialize)]
pub struct ResetForm {
    pub password: String,
    pub confirm: String,
}

pub async fn reset_password(
    State(state): State<WebState>,
    UrlPath((user, id)): UrlPath<(String, String)>,
    headers: HeaderMap,
    Form(form): Form<ResetForm>,
) -> Response {
    let session = session(&state, &headers);
    let action = resetpw_path(&user, &id);
    if !holds_reset_grant(&state, &session, &user) {
        return session.respond(PageError::Forbidden("Invalid link".to_string()));
    }

    let applied = match check_new_password(&form.password, &form.confirm) {
        Err(problem) => Err(problem.message().to_string()),
        Ok(()) => {
            let user = user.clone();
            state
                .blocking(move |s| apply_new_password(s.auth(), &user, &form.password, &form.confirm))
                .await
                .and_then(|applied| applied)
                .map_err(|e| e.to_string())
        }
    };

    match applied {
        Ok(()) => {
            state.with_client(&session.id, |c| c.reset_grant = None);
            info!("Password of '{}' set through reset link", user);
            session.respond(Redirect::to("/login"))
        }
        Err(message) => session.respond((
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(pages::reset_page(&user, &action, Some(&message))),
        )),
    }
}

// ─────────────────────────────────────────────────────────────────
// Admin actions
// ─────────────────────────────────────────────────────────────────

/// Store the outcome of an admin action for the next overview
fn record_link(state: &WebState, session: &Session, created: std::result::Result<Url, String>) {
    state.with_client(&session.id, |c| match created {
        Ok(url) => c.created_link = Some(url.to_string()),
        Err(text) => c.client.notify(text),
    });
}

#[derive(Debug, Deserialize)]
pub struct AddUserForm {
    pub username: String,
}

pub async fn add_user(
    State(state): State<WebState>,
    headers: HeaderMap,
    Form(form): Form<AddUserForm>,
) -> Response {
    let session = session(&state, &headers);
    let login = state.with_client(&session.id, |c| c.client.login.clone());
    let username = form.username.trim().to_string();
    let created = state
        .blocking(move |s| {
            create_add_user_link(s.auth(), &login, s.base(), &username, default_user_expire())
        })
        .await
        .and_then(|created| created)
        .map_err(|e| e.to_string());
    record_link(&state, &session, created);
    session.respond(Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
pub struct ShareForm {
    pub project: String,
    pub variant_group: String,
}

pub async fn share_product_view(
    State(state): State<WebState>,
    headers: HeaderMap,
    Form(form): Form<ShareForm>,
) -> Response {
    let session = session(&state, &headers);
    let login = state.with_client(&session.id, |c| c.client.login.clone());
    let project = form.project.trim().to_string();
    let variant_group = form.variant_group.trim().to_string();
    let created = state
        .blocking(move |s| {
            variant_group_dir(s, &project, &variant_group).map_err(page_error_text)?;
            create_product_view_link(
                s.auth(),
                &login,
                s.base(),
                &project,
                &variant_group,
                default_product_view_expire(),
            )
            .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| e.to_string())
        .and_then(|created| created);
    record_link(&state, &session, created);
    session.respond(Redirect::to("/"))
}

fn page_error_text(e: PageError) -> String {
    match e {
        PageError::Forbidden(text) | PageError::NotFound(text) | PageError::Failed(text) => text,
    }
}

// ─────────────────────────────────────────────────────────────────
// Product view
// ─────────────────────────────────────────────────────────────────

/// Directory of a known variant group
fn variant_group_dir(
    state: &WebState,
    project: &str,
    variant_group: &str,
) -> std::result::Result<PathBuf, PageError> {
    let workspace = state.workspace();
    if !workspace.project_ids()?.iter().any(|p| p == project) {
        return Err(PageError::NotFound(format!("Project '{}' not available", project)));
    }
    if !workspace
        .variant_groups(project)?
        .iter()
        .any(|g| g == variant_group)
    {
        return Err(PageError::NotFound(format!(
            "Variant group '{}' not available",
            variant_group
        )));
    }
    Ok(workspace.variant_group_path(project, variant_group)?)
}

/// Ids of a product view route, decoded
struct ViewTarget {
    project: String,
    variant_group: String,
    id: String,
    dir: PathBuf,
}

impl ViewTarget {
    /// Check the link id, then the project and variant group
    async fn open(
        state: &WebState,
        project: &str,
        variant_group: &str,
        id: &str,
    ) -> std::result::Result<Self, PageError> {
        let project = decode_id(project);
        let variant_group = decode_id(variant_group);
        let id = id.to_string();
        state
            .blocking(move |s| {
                let result = check_product_view_link(s.auth(), &project, &variant_group, &id);
                if !result.is_valid() {
                    debug!("Product view link rejected: {:?}", result);
                    return Err(PageError::Forbidden(result.message().to_string()));
                }
                let dir = variant_group_dir(s, &project, &variant_group)?;
                Ok(Self {
                    project,
                    variant_group,
                    id,
                    dir,
                })
            })
            .await?
    }

    fn page_path(&self) -> String {
        productview_path(&self.project, &self.variant_group, &self.id)
    }

    async fn load(
        &self,
        state: &WebState,
        group: Option<String>,
        rescan: bool,
    ) -> std::result::Result<ProductViewState, PageError> {
        let request = ScanRequest {
            production_path: self.dir.join(PRODUCTION_FILE),
            variant_group: self.dir.clone(),
            group_id: group.filter(|g| !g.is_empty()),
            rescan,
        };
        let scan = CachedScan.load(request).await?;
        Ok(ProductViewState::new(&self.dir, scan, state.layout_config()))
    }

    /// URL of an artefact file below the variant group
    fn file_href(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.dir).ok()?;
        let segments: Vec<String> = rel
            .components()
            .map(|c| utf8_percent_encode(&c.as_os_str().to_string_lossy(), FILE_SEGMENT).to_string())
            .collect();
        Some(format!("{}/files/{}", self.page_path(), segments.join("/")))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub group: Option<String>,
    pub rescan: Option<String>,
}

pub async fn product_view(
    State(state): State<WebState>,
    UrlPath((project, variant_group, id)): UrlPath<(String, String, String)>,
    Query(query): Query<ViewQuery>,
    headers: HeaderMap,
) -> Response {
    let session = session(&state, &headers);
    state.with_client(&session.id, |_| ());
    let response = render_product_view(&state, &project, &variant_group, &id, query).await;
    session.respond(response)
}

async fn render_product_view(
    state: &WebState,
    project: &str,
    variant_group: &str,
    id: &str,
    query: ViewQuery,
) -> std::result::Result<Html<String>, PageError> {
    let target = ViewTarget::open(state, project, variant_group, id).await?;
    let rescan = query.rescan.as_deref().is_some_and(|r| r == "1" || r == "true");
    let view = target.load(state, query.group, rescan).await?;
    let layout = view.layout()?;
    let page_path = target.page_path();
    let title = format!("{} · {}", target.project, target.variant_group);
    let body = ProductViewHtml::new(&view, &page_path, |p: &Path| target.file_href(p))
        .fragment(&title, layout.as_ref());
    Ok(Html(pages::document(&title, &body)))
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub path: String,
    pub category: String,
    #[serde(default)]
    pub group: String,
}

fn find_category_path(node: &LayoutNode, key: &str) -> Option<CategoryPath> {
    match node {
        LayoutNode::Row { blocks, .. } => blocks
            .iter()
            .flat_map(|b| b.columns.iter())
            .filter_map(|c| c.content.as_ref())
            .find_map(|n| find_category_path(n, key)),
        LayoutNode::Column(nodes) => nodes.iter().find_map(|n| find_category_path(n, key)),
        LayoutNode::Artefact(ArtefactCell::Present { category_path, .. }) => {
            (category_path.key() == key).then(|| category_path.clone())
        }
        LayoutNode::Artefact(ArtefactCell::Missing) => None,
    }
}

/// Step an artefact's category to its next choice
pub async fn cycle_category(
    State(state): State<WebState>,
    UrlPath((project, variant_group, id)): UrlPath<(String, String, String)>,
    headers: HeaderMap,
    Form(form): Form<CategoryForm>,
) -> Response {
    let session = session(&state, &headers);
    let response = apply_category(&state, &project, &variant_group, &id, form).await;
    session.respond(response)
}

async fn apply_category(
    state: &WebState,
    project: &str,
    variant_group: &str,
    id: &str,
    form: CategoryForm,
) -> std::result::Result<Redirect, PageError> {
    let target = ViewTarget::open(state, project, variant_group, id).await?;
    let mut view = target.load(state, Some(form.group.clone()), false).await?;
    let layout = view.layout()?;
    let path = layout
        .as_ref()
        .and_then(|node| find_category_path(node, &form.path))
        .ok_or_else(|| PageError::NotFound("Artefact not found".to_string()))?;
    let value = view.cycle_category(&path, &form.category)?;
    debug!("Category {} of {} set to {}", form.category, form.path, value);
    Ok(Redirect::to(&format!(
        "{}?group={}",
        target.page_path(),
        utf8_percent_encode(view.group_id(), FILE_SEGMENT)
    )))
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "json" => "application/json",
        "txt" | "log" => "text/plain; charset=utf-8",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// Serve an artefact file below a shared variant group
pub async fn artefact_file(
    State(state): State<WebState>,
    UrlPath((project, variant_group, id, file)): UrlPath<(String, String, String, String)>,
) -> std::result::Result<Response, PageError> {
    let target = ViewTarget::open(&state, &project, &variant_group, &id).await?;
    let not_found = || PageError::NotFound("Artefact not found".to_string());
    let root = dunce::canonicalize(&target.dir).map_err(|_| not_found())?;
    let path = dunce::canonicalize(target.dir.join(&file)).map_err(|_| not_found())?;
    if !path.starts_with(&root) || !path.is_file() {
        warn!("Refused artefact request for {}", file);
        return Err(not_found());
    }
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| PageError::Failed(format!("Reading {} failed: {}", file, e)))?;
    Ok(([(CONTENT_TYPE, content_type(&path))], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{sign, COOKIE_NAME};
    use crate::state::tests::{test_state, SECRET};
    use artdeck_app::auth::{ADMIN_RIGHT, DEFAULT_RIGHT};
    use artdeck_app::routes::path_segments;
    use artdeck_daemon::test_utils::touch;
    use axum::body::to_bytes;
    use axum::http::header::{COOKIE, LOCATION};
    use axum::http::HeaderValue;

    fn cookie(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("{}={}", COOKIE_NAME, sign(SECRET, id));
        headers.insert(COOKIE, HeaderValue::from_str(&value).unwrap());
        headers
    }

    async fn body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers().get(LOCATION).unwrap().to_str().unwrap()
    }

    fn add_users(state: &WebState) {
        state
            .auth()
            .add_user("root", "secret", false, None, &[DEFAULT_RIGHT.into(), ADMIN_RIGHT.into()])
            .unwrap();
    }

    async fn log_in(state: &WebState, session: &str) {
        let form = LoginForm {
            username: "root".into(),
            password: "secret".into(),
        };
        let response = login(State(state.clone()), cookie(session), Form(form)).await;
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_overview_without_users_is_public() {
        let (_temp, state) = test_state();
        let response = overview(State(state.clone()), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_some());
        let html = body(response).await;
        assert!(html.contains("User: public"));
        assert!(html.contains("<li>demo/p1 (vg1)</li>"));
    }

    #[tokio::test]
    async fn test_overview_redirects_to_login() {
        let (_temp, state) = test_state();
        add_users(&state);
        let response = overview(State(state), cookie("s1")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let (_temp, state) = test_state();
        add_users(&state);
        let form = LoginForm {
            username: "root".into(),
            password: "wrong".into(),
        };
        let response = login(State(state), cookie("s1"), Form(form)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body(response).await.contains("Invalid username or password"));
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let (_temp, state) = test_state();
        add_users(&state);
        log_in(&state, "s1").await;

        let html = body(overview(State(state.clone()), cookie("s1")).await).await;
        assert!(html.contains("User: root"));
        assert!(html.contains("/admin/users"));

        let response = logout(State(state.clone()), cookie("s1")).await;
        assert_eq!(location(&response), "/login");
        assert_eq!(state.client_count(), 0);
        let response = overview(State(state), cookie("s1")).await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_login_does_not_block_other_sessions() {
        let (_temp, state) = test_state();
        add_users(&state);

        let started = std::time::Instant::now();
        log_in(&state, "warmup").await;
        let login_time = started.elapsed();

        let pending = tokio::spawn({
            let state = state.clone();
            async move { log_in(&state, "s1").await }
        });
        let mut slowest = std::time::Duration::ZERO;
        while !pending.is_finished() {
            let started = std::time::Instant::now();
            let response = ping(State(state.clone()), cookie("s2")).await;
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
            slowest = slowest.max(started.elapsed());
            tokio::task::yield_now().await;
        }
        pending.await.unwrap();

        assert!(
            slowest < login_time / 4,
            "ping took {:?} while a login took {:?}",
            slowest,
            login_time
        );
    }

    #[tokio::test]
    async fn test_add_user_link_flow() {
        let (_temp, state) = test_state();
        add_users(&state);
        log_in(&state, "admin").await;

        let form = AddUserForm {
            username: "anna".into(),
        };
        add_user(State(state.clone()), cookie("admin"), Form(form)).await;
        let link = state
            .with_client("admin", |c| c.created_link.clone())
            .expect("link created");
        let segments = path_segments(&url::Url::parse(&link).unwrap());
        let id = segments[2].clone();

        // the link opens once; the session keeps the grant
        let response = reset_form(
            State(state.clone()),
            UrlPath(("anna".to_string(), id.clone())),
            cookie("anna"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = reset_form(
            State(state.clone()),
            UrlPath(("anna".to_string(), id.clone())),
            cookie("other"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let short = ResetForm {
            password: "abc".into(),
            confirm: "abc".into(),
        };
        let response = reset_password(
            State(state.clone()),
            UrlPath(("anna".to_string(), id.clone())),
            cookie("anna"),
            Form(short),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body(response).await.contains("at least 6 characters"));

        let good = ResetForm {
            password: "newpass".into(),
            confirm: "newpass".into(),
        };
        let response = reset_password(
            State(state.clone()),
            UrlPath(("anna".to_string(), id)),
            cookie("anna"),
            Form(good),
        )
        .await;
        assert_eq!(location(&response), "/login");
        assert!(state.auth().test_username_password("anna", "newpass").is_valid());
    }

    #[tokio::test]
    async fn test_reset_without_grant_is_forbidden() {
        let (_temp, state) = test_state();
        add_users(&state);
        let form = ResetForm {
            password: "newpass".into(),
            confirm: "newpass".into(),
        };
        let response = reset_password(
            State(state.clone()),
            UrlPath(("root".to_string(), "nope".to_string())),
            cookie("s1"),
            Form(form),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(state.auth().test_username_password("root", "secret").is_valid());
    }

    async fn shared_view(state: &WebState) -> String {
        log_in(state, "admin").await;
        let form = ShareForm {
            project: "demo/p1".into(),
            variant_group: "vg1".into(),
        };
        share_product_view(State(state.clone()), cookie("admin"), Form(form)).await;
        let link = state
            .with_client("admin", |c| c.created_link.clone())
            .expect("link created");
        path_segments(&url::Url::parse(&link).unwrap())[3].clone()
    }

    fn touch_frames(state: &WebState) -> PathBuf {
        let vg = state.workspace().variant_group_path("demo/p1", "vg1").unwrap();
        for trial in ["t1", "t2"] {
            touch(&vg.join(format!("production/{}/cam_a/Frame_1.png", trial)));
        }
        vg
    }

    #[tokio::test]
    async fn test_share_unknown_group_notifies() {
        let (_temp, state) = test_state();
        add_users(&state);
        log_in(&state, "admin").await;
        let form = ShareForm {
            project: "demo/p1".into(),
            variant_group: "nope".into(),
        };
        share_product_view(State(state.clone()), cookie("admin"), Form(form)).await;
        let html = body(overview(State(state), cookie("admin")).await).await;
        assert!(html.contains("Variant group &#39;nope&#39; not available"));
    }

    #[tokio::test]
    async fn test_product_view_page() {
        let (_temp, state) = test_state();
        add_users(&state);
        touch_frames(&state);
        let id = shared_view(&state).await;

        // a public link needs no login
        let response = product_view(
            State(state.clone()),
            UrlPath(("demo+p1".to_string(), "vg1".to_string(), id.clone())),
            Query(ViewQuery::default()),
            cookie("guest"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body(response).await;
        assert_eq!(html.matches("<img src=").count(), 2);
        assert!(html.contains(&format!("/productview/demo+p1/vg1/{}/files/production/t1/cam_a/Frame_1.png", id)));
    }

    #[tokio::test]
    async fn test_product_view_rejects_bad_links() {
        let (_temp, state) = test_state();
        add_users(&state);
        let id = shared_view(&state).await;

        let response = product_view(
            State(state.clone()),
            UrlPath(("demo+p1".to_string(), "vg1".to_string(), "wrong".to_string())),
            Query(ViewQuery::default()),
            cookie("guest"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = product_view(
            State(state),
            UrlPath(("demo+p1".to_string(), "vg2".to_string(), id)),
            Query(ViewQuery::default()),
            cookie("guest"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_artefact_file_stays_inside_variant_group() {
        let (_temp, state) = test_state();
        add_users(&state);
        let vg = touch_frames(&state);
        std::fs::write(vg.join("production/t1/cam_a/Frame_1.png"), b"png").unwrap();
        let id = shared_view(&state).await;

        let response = artefact_file(
            State(state.clone()),
            UrlPath((
                "demo+p1".to_string(),
                "vg1".to_string(),
                id.clone(),
                "production/t1/cam_a/Frame_1.png".to_string(),
            )),
        )
        .await
        .unwrap();
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "image/png");
        assert_eq!(body(response).await, "png");

        let escaped = artefact_file(
            State(state),
            UrlPath((
                "demo+p1".to_string(),
                "vg1".to_string(),
                id,
                "../../../../../etc/passwd".to_string(),
            )),
        )
        .await;
        assert!(matches!(escaped, Err(PageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cycle_category_persists() {
        let (_temp, state) = test_state();
        add_users(&state);
        touch_frames(&state);
        let id = shared_view(&state).await;

        let target = ViewTarget::open(&state, "demo+p1", "vg1", &id).await.unwrap();
        let view = target.load(&state, None, false).await.unwrap();
        let layout = view.layout().unwrap().unwrap();
        let key = match find_first_cell(&layout) {
            Some(path) => path.key(),
            None => panic!("no artefact cell"),
        };

        let form = CategoryForm {
            path: key,
            category: "quality".into(),
            group: view.group_id().to_string(),
        };
        let response = cycle_category(
            State(state.clone()),
            UrlPath(("demo+p1".to_string(), "vg1".to_string(), id.clone())),
            cookie("guest"),
            Form(form),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).ends_with("?group=main"));

        let html = body(
            product_view(
                State(state),
                UrlPath(("demo+p1".to_string(), "vg1".to_string(), id)),
                Query(ViewQuery::default()),
                cookie("guest"),
            )
            .await,
        )
        .await;
        assert_eq!(html.matches(">bad</button>").count(), 1);
        assert_eq!(html.matches(">good</button>").count(), 1);
    }

    fn find_first_cell(node: &LayoutNode) -> Option<CategoryPath> {
        match node {
            LayoutNode::Row { blocks, .. } => blocks
                .iter()
                .flat_map(|b| b.columns.iter())
                .filter_map(|c| c.content.as_ref())
                .find_map(find_first_cell),
            LayoutNode::Column(nodes) => nodes.iter().find_map(find_first_cell),
            LayoutNode::Artefact(ArtefactCell::Present { category_path, .. }) => Some(category_path.clone()),
            LayoutNode::Artefact(ArtefactCell::Missing) => None,
        }
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a/b.PNG")), "image/png");
        assert_eq!(content_type(Path::new("a/b.exr")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_ping_keeps_session() {
        let (_temp, state) = test_state();
        let response = ping(State(state.clone()), cookie("s1")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.client_count(), 1);
    }
}
