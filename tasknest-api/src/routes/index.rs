/// Landing page
///
/// ```text
/// GET /
/// ```
///
/// Renders the configured README as HTML. When the file can't be read the
/// page is a plain welcome heading.

use axum::{extract::State, response::Html};
use pulldown_cmark::{html, Options, Parser};
use tracing::debug;

use crate::app::AppState;

/// Served when the README is missing or unreadable
pub const FALLBACK_PAGE: &str = "<h1>Welcome to task-manager API!</h1>";

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let path = &state.config.api.readme_path;

    match tokio::fs::read_to_string(path).await {
        Ok(markdown) => Html(render_markdown(&markdown)),
        Err(e) => {
            debug!(path = %path, error = %e, "README unavailable, serving fallback page");
            Html(FALLBACK_PAGE.to_string())
        }
    }
}

/// Converts CommonMark (with tables and strikethrough) to HTML
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}
