pub mod api;
pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod doctors;
pub mod patients;
pub mod records;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use crate::routes::auth::Keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

/// A one-shot message shown at the top of a screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

/// Query string of every list screen: the filter plus a sealed notice carried
/// over from the redirect that led here.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub q: String,
    pub notice: Option<String>,
}

impl ListParams {
    pub fn notice(&self, keys: &Keys) -> Option<Notice> {
        let token = self.notice.as_deref().filter(|t| !t.is_empty())?;
        keys.open_notice(token)
    }
}

/// Redirects to `path` with the notice sealed into the query string.
pub fn redirect_with(keys: &Keys, path: &str, notice: Notice) -> Redirect {
    let query = keys.seal_notice(&notice).ok().and_then(|token| {
        serde_urlencoded::to_string([("notice", token)])
            .map_err(|e| tracing::error!("Failed to encode notice: {:?}", e))
            .ok()
    });
    match query {
        Some(query) => Redirect::to(&format!("{path}?{query}")),
        None => Redirect::to(path),
    }
}

pub fn render<T: Template>(template: T) -> Response {
    render_with(StatusCode::OK, template)
}

pub fn render_with<T: Template>(status: StatusCode, template: T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render template: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
