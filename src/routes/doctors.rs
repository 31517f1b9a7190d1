use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    models::{
        doctor::{Doctor, DoctorDetails, DoctorForm, Doctors},
        user::Session,
    },
    routes::{
        ListParams, Notice,
        auth::PageSession,
        records::{editing, listing, submit},
        render, render_with,
    },
    startup::AppState,
    store::Backend,
};

#[derive(Template)]
#[template(path = "doctors.html")]
struct DoctorsTemplate {
    email: String,
    notice: Option<Notice>,
    query: String,
    doctors: Vec<Doctor>,
}

#[derive(Template)]
#[template(path = "doctor_form.html")]
struct DoctorFormTemplate {
    email: String,
    notice: Option<Notice>,
    id: Option<Uuid>,
    form: DoctorForm,
}

impl DoctorFormTemplate {
    fn action(&self) -> String {
        match self.id {
            Some(id) => format!("/doctors/{id}"),
            None => "/doctors".to_string(),
        }
    }
}

#[instrument(name = "Web: Doctors list", skip(state, session))]
pub async fn list_page<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Query(params): Query<ListParams>,
) -> Response {
    let (listing, notice) = listing::<Doctors, B>(&state, &session, &params).await;
    render(DoctorsTemplate {
        email: session.email,
        notice,
        query: listing.query().to_string(),
        doctors: listing.into_visible(),
    })
}

pub async fn new_page(PageSession(session): PageSession) -> Response {
    render(DoctorFormTemplate {
        email: session.email,
        notice: None,
        id: None,
        form: DoctorForm::default(),
    })
}

pub async fn edit_page<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Path(id): Path<Uuid>,
) -> Response {
    match editing::<Doctors, B>(&state, &session, id).await {
        Ok(doctor) => render(DoctorFormTemplate {
            email: session.email,
            notice: None,
            id: Some(id),
            form: DoctorForm::from(&doctor.details),
        }),
        Err(redirect) => redirect.into_response(),
    }
}

#[instrument(name = "Web: Create doctor", skip(state, session, form))]
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Form(form): Form<DoctorForm>,
) -> Response {
    save(state, session, None, form).await
}

#[instrument(name = "Web: Update doctor", skip(state, session, form))]
pub async fn update<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Path(id): Path<Uuid>,
    Form(form): Form<DoctorForm>,
) -> Response {
    save(state, session, Some(id), form).await
}

async fn save<B: Backend>(
    state: AppState<B>,
    session: Session,
    id: Option<Uuid>,
    form: DoctorForm,
) -> Response {
    let parsed = DoctorDetails::try_from(form.clone());
    match submit::<Doctors, B>(&state, &session, id, parsed).await {
        Ok(redirect) => redirect.into_response(),
        Err(rejected) => render_with(
            rejected.status,
            DoctorFormTemplate {
                email: session.email,
                notice: Some(rejected.notice),
                id,
                form,
            },
        ),
    }
}
