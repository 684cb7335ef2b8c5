//! Authentication route handlers.
//!
//! Email + password accounts. Failures redirect back to the form with an
//! `?error=` code; the page maps the code to a message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, clear_current_user, set_current_user};
use crate::models::session::{CurrentUser, keys};
use crate::models::user::User;
use crate::routes::layout::Layout;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub error: Option<&'static str>,
}

/// Message for an `?error=` code on the auth pages.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Incorrect email or password",
        "session" => "We couldn't sign you in, please try again",
        "password_mismatch" => "Passwords do not match",
        "password_too_short" => "Password must be at least 8 characters",
        "password_too_long" => "Password must be at most 128 characters",
        "invalid_email" => "Please enter a valid email address",
        "email_taken" => "An account with this email already exists",
        _ => "Something went wrong, please try again",
    }
}

/// Message for a `?success=` code on the login page.
fn success_message(code: &str) -> Option<&'static str> {
    match code {
        "logged_out" => Some("You have been signed out"),
        _ => None,
    }
}

/// Error code for a failed registration.
fn register_error_code(error: &AuthError) -> &'static str {
    match error {
        AuthError::InvalidEmail(_) => "invalid_email",
        AuthError::UserAlreadyExists => "email_taken",
        AuthError::WeakPassword(msg) if msg.contains("at most") => "password_too_long",
        AuthError::WeakPassword(_) => "password_too_short",
        _ => "failed",
    }
}

/// Where to send the user after signing in.
///
/// Only same-site paths are honored; anything else goes to the account page.
fn safe_return_path(stored: Option<String>) -> String {
    stored
        .filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
        .filter(|p| !p.starts_with("/auth/"))
        .unwrap_or_else(|| "/account".to_owned())
}

/// Put the user in the session and redirect to where they were going.
async fn sign_in(session: &Session, user: &User) -> Response {
    let return_to = session
        .remove::<String>(keys::RETURN_TO)
        .await
        .ok()
        .flatten();

    let current_user = CurrentUser {
        id: user.id,
        email: user.email.clone(),
    };
    if let Err(e) = set_current_user(session, &current_user).await {
        tracing::error!("Failed to set session: {e}");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Redirect::to(&safe_return_path(return_to)).into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/account").into_response();
    }

    LoginTemplate {
        layout: Layout::load(&state, None, nonce).await,
        error: query.error.as_deref().map(error_message),
        success: query.success.as_deref().and_then(success_message),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match AuthService::new(state.pool())
        .login_with_password(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User signed in");
            sign_in(&session, &user).await
        }
        Err(AuthError::InvalidCredentials) => {
            Redirect::to("/auth/login?error=credentials").into_response()
        }
        Err(e) => {
            tracing::error!("Login failed: {e}");
            Redirect::to("/auth/login?error=failed").into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/account").into_response();
    }

    RegisterTemplate {
        layout: Layout::load(&state, None, nonce).await,
        error: query.error.as_deref().map(error_message),
    }
    .into_response()
}

/// Handle registration form submission. New accounts are signed in
/// immediately.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form.password != form.password_confirm {
        return Redirect::to("/auth/register?error=password_mismatch").into_response();
    }

    match AuthService::new(state.pool())
        .register_with_password(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User registered");
            sign_in(&session, &user).await
        }
        Err(e) => {
            let code = register_error_code(&e);
            if code == "failed" {
                tracing::error!("Registration failed: {e}");
            } else {
                tracing::info!("Registration refused: {e}");
            }
            Redirect::to(&format!("/auth/register?error={code}")).into_response()
        }
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    clear_sentry_user();

    Redirect::to("/auth/login?success=logged_out").into_response()
}
