//! HTML pages
//!
//! Pages are assembled from small fragments so each can be checked on its
//! own. Every page carries a heartbeat script that keeps its session
//! connected while the page is open.

use std::fmt::Write as _;
use std::path::Path;

use artdeck_app::product_view::ProductViewState;
use artdeck_core::view_dim::ArtefactCell;
use artdeck_core::LayoutNode;

use crate::state::HEARTBEAT_SECS;

const STYLE: &str = "\
body{font-family:sans-serif;background:#101418;color:#e0e4e8;margin:0;padding:1.5em}\
a{color:#6cb6ff}\
.card{background:#1a2027;border:1px solid #2c343d;border-radius:6px;padding:1em;margin-bottom:1em}\
.error{color:#ff6b6b}\
.row{border-left:3px solid #2c343d;padding-left:.5em;margin:.5em 0}\
.shade-1{background:#151a20}.shade-2{background:#1c222a}\
.cell{display:inline-block;margin:.25em;vertical-align:top}\
.cell img{max-width:240px;display:block}\
.missing{color:#7d8590;font-style:italic}\
.badge{font-size:.8em;margin-left:.5em}\
.positive,.green{color:#3fb950}.negative,.red{color:#ff6b6b}.warning,.orange,.yellow{color:#d29922}\
table{border-collapse:collapse}th{text-align:left;padding:.25em .5em}td{vertical-align:top}";

/// Escape text for element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Complete page around a body fragment
pub fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title} - Artdeck</title>\n\
         <style>{STYLE}</style>\n\
         <script>setInterval(function(){{fetch('/ping',{{credentials:'same-origin'}})}},{ms});</script>\n\
         </head>\n<body>\n{body}</body>\n</html>\n",
        title = escape(title),
        ms = HEARTBEAT_SECS * 1000,
    )
}

fn error_line(error: Option<&str>) -> String {
    match error {
        Some(text) => format!("<p class=\"error\">{}</p>\n", escape(text)),
        None => String::new(),
    }
}

pub fn message_fragment(title: &str, text: &str) -> String {
    format!(
        "<div class=\"card\">\n<h2>{}</h2>\n<p>{}</p>\n<p><a href=\"/\">Back</a></p>\n</div>\n",
        escape(title),
        escape(text)
    )
}

pub fn message_page(title: &str, text: &str) -> String {
    document(title, &message_fragment(title, text))
}

pub fn login_fragment(error: Option<&str>) -> String {
    format!(
        "<div class=\"card\">\n<h2>Login</h2>\n{}<form method=\"post\" action=\"/login\">\n\
         <p><input name=\"username\" placeholder=\"Username\" autofocus></p>\n\
         <p><input name=\"password\" type=\"password\" placeholder=\"Password\"></p>\n\
         <p><button type=\"submit\">Log in</button></p>\n</form>\n</div>\n",
        error_line(error)
    )
}

pub fn login_page(error: Option<&str>) -> String {
    document("Login", &login_fragment(error))
}

/// Form setting a new password, posted back to `action`
pub fn reset_fragment(user: &str, action: &str, error: Option<&str>) -> String {
    format!(
        "<div class=\"card\">\n<h2>Set password for {}</h2>\n{}<form method=\"post\" action=\"{}\">\n\
         <p><input name=\"password\" type=\"password\" placeholder=\"New password\" autofocus></p>\n\
         <p><input name=\"confirm\" type=\"password\" placeholder=\"Repeat password\"></p>\n\
         <p><button type=\"submit\">Set password</button></p>\n</form>\n</div>\n",
        escape(user),
        error_line(error),
        escape(action)
    )
}

pub fn reset_page(user: &str, action: &str, error: Option<&str>) -> String {
    document("Set password", &reset_fragment(user, action, error))
}

/// A project and its variant groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    pub id: String,
    pub variant_groups: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Overview<'a> {
    pub workspace: &'a str,
    pub user: &'a str,
    pub is_admin: bool,
    pub can_logout: bool,
    pub projects: &'a [ProjectEntry],
    /// Link created by the last admin action
    pub link: Option<&'a str>,
    pub error: Option<&'a str>,
}

pub fn overview_fragment(overview: &Overview<'_>) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<div class=\"card\">\n<h2>{}</h2>\n<p>User: {}",
        escape(overview.workspace),
        escape(overview.user)
    );
    if overview.can_logout {
        out.push_str(" <a href=\"/logout\">Log out</a>");
    }
    out.push_str("</p>\n");
    out.push_str(&error_line(overview.error));
    if let Some(link) = overview.link {
        let _ = writeln!(
            out,
            "<p>Link: <a href=\"{0}\">{0}</a></p>",
            escape(link)
        );
    }
    out.push_str("</div>\n");

    out.push_str("<div class=\"card\">\n<h3>Projects</h3>\n");
    if overview.projects.is_empty() {
        out.push_str("<p>No projects found</p>\n");
    } else {
        out.push_str("<ul>\n");
        for project in overview.projects {
            let _ = write!(out, "<li>{}", escape(&project.id));
            if !project.variant_groups.is_empty() {
                let groups: Vec<String> = project.variant_groups.iter().map(|g| escape(g)).collect();
                let _ = write!(out, " ({})", groups.join(", "));
            }
            out.push_str("</li>\n");
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</div>\n");

    if overview.is_admin {
        out.push_str(
            "<div class=\"card\">\n<h3>Add user</h3>\n<form method=\"post\" action=\"/admin/users\">\n\
             <input name=\"username\" placeholder=\"Username\">\n\
             <button type=\"submit\">Create link</button>\n</form>\n</div>\n",
        );
    }
    if overview.can_logout {
        out.push_str(
            "<div class=\"card\">\n<h3>Share product view</h3>\n<form method=\"post\" action=\"/admin/productview\">\n\
             <input name=\"project\" placeholder=\"Project\">\n\
             <input name=\"variant_group\" placeholder=\"Variant group\">\n\
             <button type=\"submit\">Create link</button>\n</form>\n</div>\n",
        );
    }
    out
}

pub fn overview_page(overview: &Overview<'_>) -> String {
    document("Workspace", &overview_fragment(overview))
}

// ─────────────────────────────────────────────────────────────────
// Product view
// ─────────────────────────────────────────────────────────────────

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp"];

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Renders a layout tree; `href` maps artefact files to URLs
pub struct ProductViewHtml<'a, F> {
    view: &'a ProductViewState,
    /// Path of the page itself, forms post below it
    page_path: &'a str,
    href: F,
}

impl<'a, F> ProductViewHtml<'a, F>
where
    F: Fn(&Path) -> Option<String>,
{
    pub fn new(view: &'a ProductViewState, page_path: &'a str, href: F) -> Self {
        Self {
            view,
            page_path,
            href,
        }
    }

    /// Header card and the layout below it
    pub fn fragment(&self, title: &str, layout: Option<&LayoutNode>) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "<div class=\"card\">\n<h2>{}</h2>\n<p>Group {} · cached {}",
            escape(title),
            escape(self.view.group_id()),
            escape(&self.view.cache_date())
        );
        if self.view.is_stale() {
            out.push_str(" · <span class=\"error\">stale</span>");
        }
        let _ = writeln!(
            out,
            " · <a href=\"{}?group={}&amp;rescan=1\">Rescan</a></p>",
            escape(self.page_path),
            escape(self.view.group_id())
        );
        if self.view.group_ids().len() > 1 {
            out.push_str("<p>Groups:");
            for id in self.view.group_ids() {
                let _ = write!(
                    out,
                    " <a href=\"{}?group={}\">{}</a>",
                    escape(self.page_path),
                    escape(id),
                    escape(id)
                );
            }
            out.push_str("</p>\n");
        }
        out.push_str("</div>\n");

        match layout {
            Some(node) => self.node(node, &mut out),
            None => out.push_str("<p class=\"missing\">No artefacts to show</p>\n"),
        }
        out
    }

    fn node(&self, node: &LayoutNode, out: &mut String) {
        match node {
            LayoutNode::Row {
                dim_label,
                shade,
                blocks,
                ..
            } => {
                let _ = writeln!(
                    out,
                    "<div class=\"row shade-{}\">\n<div>{}</div>",
                    shade,
                    escape(dim_label)
                );
                for block in blocks {
                    if let Some(title) = &block.title {
                        let _ = writeln!(out, "<div>{}</div>", escape(title));
                    }
                    out.push_str("<table>\n<tr>");
                    for column in &block.columns {
                        let _ = write!(out, "<th>{}</th>", escape(&column.label));
                    }
                    out.push_str("</tr>\n<tr>");
                    for column in &block.columns {
                        out.push_str("<td>");
                        if let Some(content) = &column.content {
                            self.node(content, out);
                        }
                        out.push_str("</td>");
                    }
                    out.push_str("</tr>\n</table>\n");
                }
                out.push_str("</div>\n");
            }
            LayoutNode::Column(nodes) => {
                out.push_str("<div>\n");
                for node in nodes {
                    self.node(node, out);
                }
                out.push_str("</div>\n");
            }
            LayoutNode::Artefact(cell) => self.cell(cell, out),
        }
    }

    fn cell(&self, cell: &ArtefactCell, out: &mut String) {
        let ArtefactCell::Present {
            path,
            category_path,
            ..
        } = cell
        else {
            out.push_str("<div class=\"cell missing\">missing</div>\n");
            return;
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        out.push_str("<div class=\"cell\">");
        match (self.href)(path) {
            Some(href) if is_image(path) => {
                let _ = write!(
                    out,
                    "<a href=\"{0}\"><img src=\"{0}\" alt=\"{1}\" loading=\"lazy\"></a>",
                    escape(&href),
                    escape(&name)
                );
            }
            Some(href) => {
                let _ = write!(out, "<a href=\"{}\">{}</a>", escape(&href), escape(&name));
            }
            None => out.push_str(&escape(&name)),
        }

        for (id, def) in self.view.category_defs() {
            let Some(value) = self.view.category(category_path, id) else {
                continue;
            };
            let Some(choice) = def.choices.get(value) else {
                continue;
            };
            let text = if choice.description.is_empty() {
                &def.name
            } else {
                &choice.description
            };
            let _ = write!(
                out,
                "<form method=\"post\" action=\"{}/category\" style=\"display:inline\">\
                 <input type=\"hidden\" name=\"path\" value=\"{}\">\
                 <input type=\"hidden\" name=\"category\" value=\"{}\">\
                 <input type=\"hidden\" name=\"group\" value=\"{}\">\
                 <button class=\"badge {}\" title=\"{}\">{}</button></form>",
                escape(self.page_path),
                escape(&category_path.key()),
                escape(id),
                escape(self.view.group_id()),
                escape(def.color_of(value)),
                escape(&def.name),
                escape(text)
            );
        }
        out.push_str("</div>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artdeck_app::product_view::{load_or_scan, ScanRequest};
    use artdeck_core::LayoutConfig;
    use artdeck_daemon::test_utils::{sample_workspace, touch};
    use artdeck_daemon::WorkspaceApi;
    use tempfile::TempDir;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&'</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_document_has_heartbeat() {
        let page = document("T<1>", "<p>body</p>\n");
        assert!(page.contains("<title>T&lt;1&gt; - Artdeck</title>"));
        assert!(page.contains("fetch('/ping'"));
        assert!(page.contains(",5000);"));
        assert!(page.contains("<p>body</p>"));
    }

    #[test]
    fn test_login_fragment() {
        insta::assert_snapshot!(login_fragment(Some("Invalid username or password")), @r#"
        <div class="card">
        <h2>Login</h2>
        <p class="error">Invalid username or password</p>
        <form method="post" action="/login">
        <p><input name="username" placeholder="Username" autofocus></p>
        <p><input name="password" type="password" placeholder="Password"></p>
        <p><button type="submit">Log in</button></p>
        </form>
        </div>
        "#);
    }

    #[test]
    fn test_message_fragment() {
        insta::assert_snapshot!(message_fragment("Product view", "Project 'x' not available"), @r#"
        <div class="card">
        <h2>Product view</h2>
        <p>Project &#39;x&#39; not available</p>
        <p><a href="/">Back</a></p>
        </div>
        "#);
    }

    #[test]
    fn test_overview_for_admin() {
        let projects = vec![ProjectEntry {
            id: "demo/p1".into(),
            variant_groups: vec!["vg1".into()],
        }];
        let html = overview_fragment(&Overview {
            workspace: "ws",
            user: "root",
            is_admin: true,
            can_logout: true,
            projects: &projects,
            link: Some("http://localhost:8080/resetpw/anna/abc"),
            error: None,
        });
        assert!(html.contains("<li>demo/p1 (vg1)</li>"));
        assert!(html.contains("action=\"/admin/users\""));
        assert!(html.contains("action=\"/admin/productview\""));
        assert!(html.contains("href=\"http://localhost:8080/resetpw/anna/abc\""));
        assert!(html.contains("<a href=\"/logout\">"));
    }

    #[test]
    fn test_overview_for_public_user() {
        let html = overview_fragment(&Overview {
            workspace: "ws",
            user: "public",
            ..Default::default()
        });
        assert!(html.contains("No projects found"));
        assert!(!html.contains("/admin/"));
        assert!(!html.contains("/logout"));
    }

    #[test]
    fn test_product_view_cells() {
        let temp = TempDir::new().unwrap();
        let ws = sample_workspace(temp.path());
        let vg = ws.variant_group_path("demo/p1", "vg1").unwrap();
        for trial in ["t1", "t2"] {
            touch(&vg.join(format!("production/{}/cam_a/Frame_1.png", trial)));
        }
        let request = ScanRequest {
            production_path: vg.join("production.json"),
            variant_group: vg.clone(),
            group_id: None,
            rescan: false,
        };
        let view = ProductViewState::new(&vg, load_or_scan(&request).unwrap(), LayoutConfig::default());
        let layout = view.layout().unwrap();

        let html = ProductViewHtml::new(&view, "/productview/demo+p1/vg1/abc", |p: &Path| {
            p.strip_prefix(&vg)
                .ok()
                .map(|rel| format!("/files/{}", rel.display()))
        })
        .fragment("demo/p1 · vg1", layout.as_ref());

        assert_eq!(html.matches("<img src=").count(), 2);
        assert!(html.contains("src=\"/files/production/t1/cam_a/Frame_1.png\""));
        assert_eq!(html.matches("action=\"/productview/demo+p1/vg1/abc/category\"").count(), 2);
        assert!(html.contains("value=\"quality\""));
        assert!(html.contains("Group main"));
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("a/Frame_1.PNG")));
        assert!(!is_image(Path::new("a/log.txt")));
        assert!(!is_image(Path::new("a/noext")));
    }
}
