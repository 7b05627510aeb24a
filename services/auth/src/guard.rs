//! Access guard: bearer token → validated, unbanned user attached to the request.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use sentinel_auth_types::bearer::bearer_token;
use sentinel_auth_types::token::TokenCodec;

use crate::domain::repository::{BanRepository, UserRepository};
use crate::domain::types::User;
use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::token::{ValidateTokenUseCase, ValidateUserUseCase};

/// Identity resolved by the guard, available to handlers as an extractor.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub user: User,
}

/// Identity when the optional guard ran; `None` for anonymous callers.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

/// Run `ValidateToken` then `ValidateUser` for the request's bearer token.
///
/// Business failures collapse into `Unauthorized` carrying the underlying reason;
/// infrastructure failures pass through unchanged.
pub async fn resolve_identity<U, B>(
    headers: &HeaderMap,
    users: U,
    bans: B,
    codec: &TokenCodec,
) -> Result<AuthenticatedUser, AuthServiceError>
where
    U: UserRepository + Clone,
    B: BanRepository,
{
    let token =
        bearer_token(headers).map_err(|e| AuthServiceError::Unauthorized(e.to_string()))?;

    let resolved = async {
        let user = ValidateTokenUseCase {
            users: users.clone(),
            codec: codec.clone(),
        }
        .execute(token)
        .await?;
        ValidateUserUseCase { users, bans }.execute(user.id).await
    }
    .await;

    match resolved {
        Ok(user) => Ok(AuthenticatedUser {
            user_id: user.id,
            user,
        }),
        Err(
            e @ (AuthServiceError::StoreUnavailable(_)
            | AuthServiceError::Internal(_)
            | AuthServiceError::Cancelled
            | AuthServiceError::DeadlineExceeded),
        ) => Err(e),
        Err(e) => Err(AuthServiceError::Unauthorized(e.to_string())),
    }
}

/// Mandatory guard: rejects the request unless the caller resolves.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthServiceError> {
    let headers = req.headers().clone();
    let identity = state
        .request_context()
        .run(resolve_identity(
            &headers,
            state.user_repo(),
            state.ban_repo(),
            &state.codec,
        ))
        .await?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Optional guard: attaches the identity when it resolves, otherwise proceeds anonymously.
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let headers = req.headers().clone();
    let resolved = state
        .request_context()
        .run(resolve_identity(
            &headers,
            state.user_repo(),
            state.ban_repo(),
            &state.codec,
        ))
        .await;
    match resolved {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
        }
        Err(e) => tracing::debug!(kind = e.kind(), "proceeding unauthenticated"),
    }
    next.run(req).await
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthServiceError;

    // Extract synchronously and return a 'static future; see axum-core's
    // `fn -> impl Future + Send` signature.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = parts.extensions.get::<AuthenticatedUser>().cloned();
        async move {
            identity.ok_or_else(|| AuthServiceError::Unauthorized("not authenticated".to_owned()))
        }
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = parts.extensions.get::<AuthenticatedUser>().cloned();
        async move { Ok(MaybeUser(identity)) }
    }
}
