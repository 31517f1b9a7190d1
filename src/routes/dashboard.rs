use askama::Template;
use axum::{extract::State, response::Response};
use chrono::Utc;
use tracing::instrument;

use crate::{
    routes::{Notice, auth::PageSession, render},
    services::dashboard::Stats,
    startup::AppState,
    store::Backend,
};

pub const STATS_FAILED: &str = "Failed to fetch statistics";

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    email: String,
    notice: Option<Notice>,
    /// `None` when any of the counts failed.
    stats: Option<Stats>,
}

#[instrument(name = "Web: Dashboard", skip(state, session))]
pub async fn dashboard_handler<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession, // Authenticated user
) -> Response {
    let today = Utc::now().date_naive();
    let (stats, notice) = match state.dashboard().stats(&session, today).await {
        Ok(stats) => (Some(stats), None),
        Err(e) => (None, Some(Notice::error(e.notice(STATS_FAILED)))),
    };

    render(DashboardTemplate {
        email: session.email,
        notice,
        stats,
    })
}
