//! JSON surface over the record and dashboard services.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::ApiError,
    models::{Resource, user::Session},
    services::{
        dashboard::Stats,
        records::{Confirmation, Deletion},
    },
    startup::AppState,
    store::{Backend, RecordStore},
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub confirm: bool,
}

#[instrument(name = "API: List records", skip(state, session), fields(resource = R::PLURAL))]
pub async fn list<R, B>(
    State(state): State<AppState<B>>,
    session: Session,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<R::Row>>, ApiError>
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    let listing = state.records::<R>().list(&session, &params.q).await?;
    Ok(Json(listing.into_visible()))
}

pub async fn fetch<R, B>(
    State(state): State<AppState<B>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<R::Row>, ApiError>
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    Ok(Json(state.records::<R>().fetch(&session, id).await?))
}

#[instrument(name = "API: Create record", skip(state, session, details), fields(resource = R::PLURAL))]
pub async fn create<R, B>(
    State(state): State<AppState<B>>,
    session: Session,
    Json(details): Json<R::Details>,
) -> Result<(StatusCode, Json<R::Row>), ApiError>
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    let saved = state.records::<R>().save(&session, None, details).await?;
    Ok((StatusCode::CREATED, Json(saved.row)))
}

#[instrument(name = "API: Update record", skip(state, session, details), fields(resource = R::PLURAL))]
pub async fn update<R, B>(
    State(state): State<AppState<B>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(details): Json<R::Details>,
) -> Result<Json<R::Row>, ApiError>
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    let saved = state
        .records::<R>()
        .save(&session, Some(id), details)
        .await?;
    Ok(Json(saved.row))
}

/// Deletes only with `?confirm=true`; otherwise answers 409 without touching
/// the store.
#[instrument(name = "API: Delete record", skip(state, session), fields(resource = R::PLURAL))]
pub async fn delete<R, B>(
    State(state): State<AppState<B>>,
    session: Session,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiError>
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    match state
        .records::<R>()
        .delete(&session, id, Confirmation::from(params.confirm))
        .await?
    {
        Deletion::Deleted => Ok(StatusCode::NO_CONTENT),
        Deletion::Cancelled => Err(ApiError::ConfirmationRequired),
    }
}

pub async fn dashboard<B: Backend>(
    State(state): State<AppState<B>>,
    session: Session,
) -> Result<Json<Stats>, ApiError> {
    let stats = state
        .dashboard()
        .stats(&session, Utc::now().date_naive())
        .await?;
    Ok(Json(stats))
}
