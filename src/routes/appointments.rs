use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    models::{
        appointment::{
            Appointment, AppointmentChoices, AppointmentDetails, AppointmentForm,
            AppointmentStatus, Appointments,
        },
        user::Session,
    },
    routes::{
        ListParams, Notice,
        auth::PageSession,
        records::{editing, listing, submit},
        render, render_with,
    },
    services::records::appointment_choices,
    startup::AppState,
    store::Backend,
};

#[derive(Template)]
#[template(path = "appointments.html")]
struct AppointmentsTemplate {
    email: String,
    notice: Option<Notice>,
    query: String,
    appointments: Vec<Appointment>,
}

#[derive(Template)]
#[template(path = "appointment_form.html")]
struct AppointmentFormTemplate {
    email: String,
    notice: Option<Notice>,
    id: Option<Uuid>,
    form: AppointmentForm,
    choices: AppointmentChoices,
    statuses: &'static [AppointmentStatus],
}

impl AppointmentFormTemplate {
    fn action(&self) -> String {
        match self.id {
            Some(id) => format!("/appointments/{id}"),
            None => "/appointments".to_string(),
        }
    }
}

#[instrument(name = "Web: Appointments list", skip(state, session))]
pub async fn list_page<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Query(params): Query<ListParams>,
) -> Response {
    let (listing, notice) = listing::<Appointments, B>(&state, &session, &params).await;
    render(AppointmentsTemplate {
        email: session.email,
        notice,
        query: listing.query().to_string(),
        appointments: listing.into_visible(),
    })
}

/// Renders the form with the owner's patients and doctors to pick from.
/// A failed lookup still shows the form, with empty drop-downs and a notice.
async fn form_screen<B: Backend>(
    state: &AppState<B>,
    session: Session,
    id: Option<Uuid>,
    form: AppointmentForm,
    mut notice: Option<Notice>,
    status: StatusCode,
) -> Response {
    let choices = match appointment_choices(&state.store, &session).await {
        Ok(choices) => choices,
        Err(e) => {
            tracing::error!("Failed to load appointment choices: {}", e);
            notice.get_or_insert_with(|| Notice::error(e.notice("Failed to fetch data")));
            AppointmentChoices::default()
        }
    };
    render_with(
        status,
        AppointmentFormTemplate {
            email: session.email,
            notice,
            id,
            form,
            choices,
            statuses: &AppointmentStatus::ALL,
        },
    )
}

pub async fn new_page<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
) -> Response {
    form_screen(
        &state,
        session,
        None,
        AppointmentForm::blank(),
        None,
        StatusCode::OK,
    )
    .await
}

pub async fn edit_page<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Path(id): Path<Uuid>,
) -> Response {
    match editing::<Appointments, B>(&state, &session, id).await {
        Ok(appointment) => {
            let form = AppointmentForm::from(&appointment.details);
            form_screen(&state, session, Some(id), form, None, StatusCode::OK).await
        }
        Err(redirect) => redirect.into_response(),
    }
}

#[instrument(name = "Web: Schedule appointment", skip(state, session, form))]
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Form(form): Form<AppointmentForm>,
) -> Response {
    save(state, session, None, form).await
}

#[instrument(name = "Web: Update appointment", skip(state, session, form))]
pub async fn update<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Path(id): Path<Uuid>,
    Form(form): Form<AppointmentForm>,
) -> Response {
    save(state, session, Some(id), form).await
}

async fn save<B: Backend>(
    state: AppState<B>,
    session: Session,
    id: Option<Uuid>,
    form: AppointmentForm,
) -> Response {
    let parsed = AppointmentDetails::try_from(form.clone());
    match submit::<Appointments, B>(&state, &session, id, parsed).await {
        Ok(redirect) => redirect.into_response(),
        Err(rejected) => {
            form_screen(
                &state,
                session,
                id,
                form,
                Some(rejected.notice),
                rejected.status,
            )
            .await
        }
    }
}
