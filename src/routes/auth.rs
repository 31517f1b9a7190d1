use std::fmt;

use askama::Template;
use axum::{
    Form, Json, RequestPartsExt,
    extract::{FromRef, FromRequestParts, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    extract::{
        CookieJar, TypedHeader,
        cookie::{Cookie, SameSite},
    },
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::AuthError,
    models::user::Session,
    routes::{Level, ListParams, Notice, redirect_with, render, render_with},
    startup::AppState,
    store::Backend,
};

pub const SESSION_COOKIE: &str = "jwt";

/// How long a notice carried through a redirect stays readable.
const NOTICE_TTL_MINUTES: i64 = 5;

#[derive(Template)]
#[template(path = "signup.html")]
struct SignupTemplate {
    /// Session user shown in the header; always empty here.
    email: String,
    entered_email: String,
    notice: Option<Notice>,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    /// Session user shown in the header; always empty here.
    email: String,
    entered_email: String,
    notice: Option<Notice>,
}

/// Signing material for session tokens.
#[derive(Clone)]
pub struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl Keys {
    pub fn new(secret: &[u8], ttl: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, session: &Session) -> Result<String, AuthError> {
        let claims = Claims {
            sub: session.user_id.to_string(),
            email: session.email.clone(),
            exp: (chrono::Utc::now() + self.ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            tracing::error!("JWT Encoding failed: {:?}", e);
            AuthError::TokenCreation
        })
    }

    pub fn verify(&self, token: &str) -> Result<Session, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
                tracing::warn!("JWT decoding failed: {:?}", e);
                AuthError::InvalidToken
            })?;
        let user_id = Uuid::parse_str(&token_data.claims.sub).map_err(|_| {
            tracing::warn!("JWT subject is not a user id");
            AuthError::InvalidToken
        })?;
        Ok(Session {
            user_id,
            email: token_data.claims.email,
        })
    }
}

impl Keys {
    /// Signs a notice so it can ride in a redirect query string.
    pub fn seal_notice(&self, notice: &Notice) -> Result<String, AuthError> {
        let claims = NoticeClaims {
            level: notice.level,
            message: notice.message.clone(),
            exp: (chrono::Utc::now() + chrono::Duration::minutes(NOTICE_TTL_MINUTES)).timestamp()
                as usize,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            tracing::error!("Notice encoding failed: {:?}", e);
            AuthError::TokenCreation
        })
    }

    /// The notice behind a sealed token. Forged or stale tokens yield nothing.
    pub fn open_notice(&self, token: &str) -> Option<Notice> {
        decode::<NoticeClaims>(token, &self.decoding, &Validation::default())
            .map_err(|e| tracing::warn!("Discarding notice: {:?}", e))
            .ok()
            .map(|data| Notice {
                level: data.claims.level,
                message: data.claims.message,
            })
            .filter(|notice| !notice.message.is_empty())
    }
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<B: Clone> FromRef<AppState<B>> for Keys {
    fn from_ref(state: &AppState<B>) -> Self {
        state.keys.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct NoticeClaims {
    level: Level,
    message: String,
    exp: usize,
}

#[derive(Debug, Serialize)]
pub struct AuthBody {
    access_token: String,
    token_type: String,
}

impl AuthBody {
    fn new(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub async fn signup_page(State(keys): State<Keys>, Query(params): Query<ListParams>) -> Response {
    render(SignupTemplate {
        email: String::new(),
        entered_email: String::new(),
        notice: params.notice(&keys),
    })
}

pub async fn login_page(State(keys): State<Keys>, Query(params): Query<ListParams>) -> Response {
    render(LoginTemplate {
        email: String::new(),
        entered_email: String::new(),
        notice: params.notice(&keys),
    })
}

#[instrument(name = "Web: Login POST", skip(state, jar, payload))]
pub async fn login_post<B: Backend>(
    State(state): State<AppState<B>>,
    jar: CookieJar,
    Form(payload): Form<AuthPayload>,
) -> Response {
    tracing::info!("Request to login user received");
    // 1. Verify credentials via service, 2. sign the session token
    let token = match state
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .and_then(|session| state.keys.issue(&session))
    {
        Ok(token) => token,
        Err(e) => {
            let (status, _) = e.status_and_message();
            return render_with(
                status,
                LoginTemplate {
                    email: String::new(),
                    entered_email: payload.email,
                    notice: Some(Notice::error(e.notice())),
                },
            );
        }
    };

    // 3. Set HttpOnly Cookie and Redirect to Dashboard
    (jar.add(session_cookie(token)), Redirect::to("/dashboard")).into_response()
}

#[instrument(name = "Web: Signup POST", skip(state, payload))]
pub async fn signup_post<B: Backend>(
    State(state): State<AppState<B>>,
    Form(payload): Form<AuthPayload>,
) -> Response {
    match state
        .auth_service
        .register(&payload.email, &payload.password)
        .await
    {
        Ok(_) => redirect_with(
            &state.keys,
            "/login",
            Notice::success("Account created successfully. Please log in."),
        )
        .into_response(),
        Err(e) => {
            let (status, _) = e.status_and_message();
            render_with(
                status,
                SignupTemplate {
                    email: String::new(),
                    entered_email: payload.email,
                    notice: Some(Notice::error(e.notice())),
                },
            )
        }
    }
}

#[instrument(name = "Web: Logout POST", skip(jar))]
pub async fn logout_handler(jar: CookieJar) -> impl IntoResponse {
    let updated_jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (updated_jar, Redirect::to("/login"))
}

#[instrument(name = "register new user", skip(state, payload))]
pub async fn register_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Json(payload): Json<AuthPayload>,
) -> Result<impl IntoResponse, AuthError> {
    let session = state
        .auth_service
        .register(&payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "user_id": session.user_id })),
    ))
}

#[instrument(
    name = "HTTP: Authorize Handler",
    skip(state, payload),
    fields(user_email = %payload.email)
)]
pub async fn authorize_handler<B: Backend>(
    State(state): State<AppState<B>>,
    Json(payload): Json<AuthPayload>,
) -> Result<Json<AuthBody>, AuthError> {
    tracing::info!("Received login request");

    let session = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            tracing::error!("Authorization failed: {:?}", e);
            e
        })?;

    let token = state.keys.issue(&session)?;

    tracing::info!("JWT issued for user");
    Ok(Json(AuthBody::new(token)))
}

/// Reads the session token from the `jwt` cookie, falling back to a bearer
/// header for API clients.
async fn session_from_parts(parts: &mut Parts, keys: &Keys) -> Result<Session, AuthError> {
    // 1. Try to get token from Cookies (for Browser/Dashboard)
    let cookie_token = parts
        .extract::<CookieJar>()
        .await
        .ok()
        .and_then(|jar| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()));

    // 2. If no cookie, try to get from Authorization Header (for API/Curl)
    let token = if let Some(t) = cookie_token {
        t
    } else {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| {
                tracing::warn!("No JWT found in cookies or headers");
                AuthError::InvalidToken
            })?;
        bearer.token().to_string()
    };

    // 3. Decode the token
    keys.verify(&token)
}

impl<S> FromRequestParts<S> for Session
where
    Keys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    #[instrument(name = "Extracting session", skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Keys::from_ref(state);
        session_from_parts(parts, &keys).await
    }
}

/// Session for HTML screens: a missing or expired session sends the browser
/// to the login page instead of answering 401.
#[derive(Debug, Clone)]
pub struct PageSession(pub Session);

impl<S> FromRequestParts<S> for PageSession
where
    Keys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Keys::from_ref(state);
        session_from_parts(parts, &keys)
            .await
            .map(PageSession)
            .map_err(|_| Redirect::to("/login"))
    }
}
