use std::time::Duration;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use secrecy::ExposeSecret;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    configuration::{DatabaseSettings, Settings},
    models::{
        Resource, appointment::Appointments, doctor::Doctors, patient::Patients,
    },
    routes::{
        api, appointments,
        auth::{
            Keys, authorize_handler, login_page, login_post, logout_handler, register_handler,
            signup_page, signup_post,
        },
        dashboard::dashboard_handler,
        doctors, patients, records,
    },
    services::{auth::AuthService, dashboard::DashboardService, records::RecordService},
    store::{Backend, PgStore, RecordStore},
};

#[derive(Clone, Debug)]
pub struct AppState<B> {
    pub store: B,
    pub auth_service: AuthService<B>,
    pub keys: Keys,
}

impl<B: Backend> AppState<B> {
    pub fn new(store: B, keys: Keys) -> Self {
        Self {
            auth_service: AuthService::new(store.clone()),
            store,
            keys,
        }
    }

    pub fn records<R>(&self) -> RecordService<R, B>
    where
        R: Resource,
        B: RecordStore<R>,
    {
        RecordService::new(self.store.clone())
    }

    pub fn dashboard(&self) -> DashboardService<B> {
        DashboardService::new(self.store.clone())
    }
}

/// HTML screens and delete confirmation for one record kind.
fn screens<R, B>(
    list: axum::routing::MethodRouter<AppState<B>>,
    new: axum::routing::MethodRouter<AppState<B>>,
    edit: axum::routing::MethodRouter<AppState<B>>,
    update: axum::routing::MethodRouter<AppState<B>>,
) -> Router<AppState<B>>
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    let base = format!("/{}", R::PLURAL);
    Router::new()
        .route(&base, list)
        .route(&format!("{base}/new"), new)
        .route(&format!("{base}/{{id}}"), update)
        .route(&format!("{base}/{{id}}/edit"), edit)
        .route(
            &format!("{base}/{{id}}/delete"),
            get(records::confirm_delete::<R, B>).post(records::delete::<R, B>),
        )
}

/// JSON CRUD for one record kind under `/api`.
fn api_routes<R, B>() -> Router<AppState<B>>
where
    R: Resource,
    B: Backend + RecordStore<R>,
{
    let base = format!("/api/{}", R::PLURAL);
    Router::new()
        .route(&base, get(api::list::<R, B>).post(api::create::<R, B>))
        .route(
            &format!("{base}/{{id}}"),
            get(api::fetch::<R, B>)
                .put(api::update::<R, B>)
                .delete(api::delete::<R, B>),
        )
}

pub fn router<B: Backend>(state: AppState<B>, assets_dir: &str) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/dashboard", get(dashboard_handler::<B>))
        .route("/login", get(login_page).post(login_post::<B>))
        .route("/signup", get(signup_page).post(signup_post::<B>))
        .route("/logout", post(logout_handler))
        .route("/register", post(register_handler::<B>))
        .route("/authorize", post(authorize_handler::<B>))
        .route("/api/dashboard", get(api::dashboard::<B>))
        .merge(screens::<Patients, B>(
            get(patients::list_page::<B>).post(patients::create::<B>),
            get(patients::new_page),
            get(patients::edit_page::<B>),
            post(patients::update::<B>),
        ))
        .merge(screens::<Doctors, B>(
            get(doctors::list_page::<B>).post(doctors::create::<B>),
            get(doctors::new_page),
            get(doctors::edit_page::<B>),
            post(doctors::update::<B>),
        ))
        .merge(screens::<Appointments, B>(
            get(appointments::list_page::<B>).post(appointments::create::<B>),
            get(appointments::new_page::<B>),
            get(appointments::edit_page::<B>),
            post(appointments::update::<B>),
        ))
        .merge(api_routes::<Patients, B>())
        .merge(api_routes::<Doctors, B>())
        .merge(api_routes::<Appointments, B>())
        .nest_service("/assets", ServeDir::new(assets_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn get_connection_pool(settings: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect_lazy_with(settings.connect_options())
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    app: Router,
}

impl Application {
    /// Connects the pool, applies pending migrations and binds the listener.
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let pool = get_connection_pool(&settings.database);
        sqlx::migrate!("./migrations").run(&pool).await?;

        let keys = Keys::new(
            settings.application.jwt_secret.expose_secret().as_bytes(),
            chrono::Duration::hours(settings.application.session_hours),
        );
        let state = AppState::new(PgStore::new(pool), keys);
        let app = router(state, &settings.application.assets_dir);

        let address = format!(
            "{}:{}",
            settings.application.host, settings.application.port
        );
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();
        tracing::info!("Listening on {}", address);

        Ok(Self {
            port,
            listener,
            app,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
    }
    tracing::info!("Shutting down");
}
