//! Authentication extractors.
//!
//! The logged-in shopper is a [`CurrentUser`] stored in the session under
//! [`keys::CURRENT_USER`].

use axum::{
    extract::FromRequestParts,
    http::{Method, StatusCode, request::Parts},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::session::{CurrentUser, keys};

/// Extractor that requires a logged-in user.
///
/// Page requests are redirected to the login page; HTMX and `/api/`
/// requests get a 401 (HTMX requests also get an `HX-Redirect` so the
/// browser navigates instead of swapping a login page into a fragment).
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin,
    /// 401 plus `HX-Redirect` (for HTMX requests).
    HtmxRedirect,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl AuthRejection {
    fn for_request(parts: &Parts) -> Self {
        if parts.uri.path().starts_with("/api/") {
            Self::Unauthorized
        } else if parts.headers.contains_key("hx-request") {
            Self::HtmxRedirect
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::HtmxRedirect => (
                StatusCode::UNAUTHORIZED,
                AppendHeaders([("HX-Redirect", "/auth/login")]),
            )
                .into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: Option<CurrentUser> = session.get(keys::CURRENT_USER).await.ok().flatten();
        if let Some(user) = user {
            return Ok(Self(user));
        }

        let rejection = AuthRejection::for_request(parts);
        if rejection == AuthRejection::RedirectToLogin && parts.method == Method::GET {
            let target = parts
                .uri
                .path_and_query()
                .map_or_else(|| parts.uri.path().to_owned(), ToString::to_string);
            if let Err(e) = session.insert(keys::RETURN_TO, target).await {
                tracing::warn!("Failed to remember return path: {e}");
            }
        }
        Err(rejection)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is
/// logged in. Catalog pages use it to personalize wishlist state.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the logged-in user in the session.
///
/// The session ID is cycled first so a pre-login session ID can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
