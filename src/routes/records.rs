//! Route pieces shared by the patient, doctor and appointment screens.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::StoreError,
    models::{Record, Resource, form::ValidationError, user::Session},
    routes::{
        ListParams, Notice,
        auth::{Keys, PageSession},
        redirect_with, render,
    },
    services::{
        records::{self, Confirmation, Deletion},
        search::Listing,
    },
    startup::AppState,
    store::{Backend, RecordStore},
};

#[derive(Template)]
#[template(path = "confirm_delete.html")]
struct ConfirmDeleteTemplate {
    email: String,
    notice: Option<Notice>,
    title: &'static str,
    plural: &'static str,
    summary: String,
    action: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub confirm: String,
}

impl DeleteForm {
    pub fn confirmation(&self) -> Confirmation {
        Confirmation::from(self.confirm == "yes")
    }
}

pub fn list_path<R: Resource>() -> String {
    format!("/{}", R::PLURAL)
}

/// Rows for a list screen. A failed read leaves the screen usable with an
/// empty listing and an error notice.
pub async fn listing<R, B>(
    state: &AppState<B>,
    session: &Session,
    params: &ListParams,
) -> (Listing<R::Row>, Option<Notice>)
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    match state.records::<R>().list(session, &params.q).await {
        Ok(listing) => (listing, params.notice(&state.keys)),
        Err(e) => {
            tracing::error!("Failed to fetch {}: {}", R::PLURAL, e);
            (
                Listing::empty(params.q.clone()),
                Some(Notice::error(e.notice(&records::fetch_failed::<R>()))),
            )
        }
    }
}

/// The row behind an edit screen, or a redirect back to the list.
pub async fn editing<R, B>(
    state: &AppState<B>,
    session: &Session,
    id: Uuid,
) -> Result<R::Row, Redirect>
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    state.records::<R>().fetch(session, id).await.map_err(|e| {
        tracing::warn!("Cannot edit {} {}: {}", R::NOUN, id, e);
        redirect_with(
            &state.keys,
            &list_path::<R>(),
            Notice::error(e.notice(&records::fetch_failed::<R>())),
        )
    })
}

/// A form submission that did not save: the notice to show on the
/// re-rendered form and the status to answer with.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub notice: Notice,
    pub status: StatusCode,
}

/// Saves parsed form details. Success redirects to the list with a notice.
pub async fn submit<R, B>(
    state: &AppState<B>,
    session: &Session,
    id: Option<Uuid>,
    parsed: Result<R::Details, ValidationError>,
) -> Result<Redirect, Rejected>
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    let details = parsed.map_err(|e| Rejected {
        notice: Notice::error(e.to_string()),
        status: StatusCode::UNPROCESSABLE_ENTITY,
    })?;

    match state.records::<R>().save(session, id, details).await {
        Ok(saved) => Ok(redirect_with(
            &state.keys,
            &list_path::<R>(),
            Notice::success(saved.message::<R>()),
        )),
        Err(e) => Err(Rejected {
            notice: Notice::error(e.notice(&records::save_failed::<R>())),
            status: e.status(),
        }),
    }
}

#[instrument(name = "Web: Confirm delete", skip(state, session), fields(resource = R::PLURAL))]
pub async fn confirm_delete<R, B>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Path(id): Path<Uuid>,
) -> Response
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    match state.records::<R>().fetch(&session, id).await {
        Ok(row) => render(ConfirmDeleteTemplate {
            email: session.email,
            notice: None,
            title: R::TITLE,
            plural: R::PLURAL,
            summary: row.summary(),
            action: format!("/{}/{}/delete", R::PLURAL, row.id()),
        }),
        Err(e) => redirect_with(
            &state.keys,
            &list_path::<R>(),
            Notice::error(e.notice(&records::fetch_failed::<R>())),
        )
        .into_response(),
    }
}

#[instrument(name = "Web: Delete record", skip(state, session, form), fields(resource = R::PLURAL))]
pub async fn delete<R, B>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Path(id): Path<Uuid>,
    Form(form): Form<DeleteForm>,
) -> Redirect
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    match state
        .records::<R>()
        .delete(&session, id, form.confirmation())
        .await
    {
        Ok(Deletion::Deleted) => redirect_with(
            &state.keys,
            &list_path::<R>(),
            Notice::success(records::deleted_message::<R>()),
        ),
        Ok(Deletion::Cancelled) => Redirect::to(&list_path::<R>()),
        Err(e) => delete_failed::<R>(&state.keys, e),
    }
}

fn delete_failed<R: Resource>(keys: &Keys, e: StoreError) -> Redirect {
    tracing::error!("Failed to delete {}: {}", R::NOUN, e);
    redirect_with(
        keys,
        &list_path::<R>(),
        Notice::error(e.notice(&records::delete_failed::<R>())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::patient::Patients;

    #[test]
    fn only_an_explicit_yes_confirms() {
        let form = |confirm: &str| DeleteForm {
            confirm: confirm.into(),
        };
        assert_eq!(form("yes").confirmation(), Confirmation::Confirmed);
        assert_eq!(form("").confirmation(), Confirmation::Unconfirmed);
        assert_eq!(form("YES ").confirmation(), Confirmation::Unconfirmed);
        assert_eq!(form("no").confirmation(), Confirmation::Unconfirmed);
    }

    #[test]
    fn list_path_is_the_plural() {
        assert_eq!(list_path::<Patients>(), "/patients");
    }
}
