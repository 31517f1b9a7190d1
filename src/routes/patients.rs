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
        patient::{BloodGroup, Gender, Patient, PatientDetails, PatientForm, Patients},
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
#[template(path = "patients.html")]
struct PatientsTemplate {
    email: String,
    notice: Option<Notice>,
    query: String,
    patients: Vec<Patient>,
}

#[derive(Template)]
#[template(path = "patient_form.html")]
struct PatientFormTemplate {
    email: String,
    notice: Option<Notice>,
    /// `None` while creating.
    id: Option<Uuid>,
    form: PatientForm,
    genders: &'static [Gender],
    blood_groups: &'static [BloodGroup],
}

impl PatientFormTemplate {
    fn new(email: String, id: Option<Uuid>, form: PatientForm, notice: Option<Notice>) -> Self {
        Self {
            email,
            notice,
            id,
            form,
            genders: &Gender::ALL,
            blood_groups: &BloodGroup::ALL,
        }
    }

    fn action(&self) -> String {
        match self.id {
            Some(id) => format!("/patients/{id}"),
            None => "/patients".to_string(),
        }
    }
}

#[instrument(name = "Web: Patients list", skip(state, session))]
pub async fn list_page<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Query(params): Query<ListParams>,
) -> Response {
    let (listing, notice) = listing::<Patients, B>(&state, &session, &params).await;
    render(PatientsTemplate {
        email: session.email,
        notice,
        query: listing.query().to_string(),
        patients: listing.into_visible(),
    })
}

pub async fn new_page(PageSession(session): PageSession) -> Response {
    render(PatientFormTemplate::new(
        session.email,
        None,
        PatientForm::blank(),
        None,
    ))
}

pub async fn edit_page<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Path(id): Path<Uuid>,
) -> Response {
    match editing::<Patients, B>(&state, &session, id).await {
        Ok(patient) => render(PatientFormTemplate::new(
            session.email,
            Some(id),
            PatientForm::from(&patient.details),
            None,
        )),
        Err(redirect) => redirect.into_response(),
    }
}

#[instrument(name = "Web: Create patient", skip(state, session, form))]
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Form(form): Form<PatientForm>,
) -> Response {
    save(state, session, None, form).await
}

#[instrument(name = "Web: Update patient", skip(state, session, form))]
pub async fn update<B: Backend>(
    State(state): State<AppState<B>>,
    PageSession(session): PageSession,
    Path(id): Path<Uuid>,
    Form(form): Form<PatientForm>,
) -> Response {
    save(state, session, Some(id), form).await
}

async fn save<B: Backend>(
    state: AppState<B>,
    session: Session,
    id: Option<Uuid>,
    form: PatientForm,
) -> Response {
    let parsed = PatientDetails::try_from(form.clone());
    match submit::<Patients, B>(&state, &session, id, parsed).await {
        Ok(redirect) => redirect.into_response(),
        Err(rejected) => render_with(
            rejected.status,
            PatientFormTemplate::new(session.email, id, form, Some(rejected.notice)),
        ),
    }
}
