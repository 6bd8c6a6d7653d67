use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::models::User;
use crate::util::extract_bearer_token;

/// The authenticated caller, inserted into request extensions by [`user_auth`].
#[derive(Clone)]
pub struct UserContext {
    pub user: User,
}

impl UserContext {
    pub fn require_admin(&self) -> Result<()> {
        if self.user.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(msg::ADMIN_REQUIRED.into()))
        }
    }

    /// Owner of the resource, or an admin.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.user.id == owner_id || self.user.is_admin()
    }
}

fn authenticate(state: &AppState, request: &Request) -> Result<User> {
    let token = extract_bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let user_id = state.sessions.verify(token)?;

    let conn = state.db.get()?;
    // A valid token for a user that no longer exists is still unauthenticated
    queries::get_user_by_id(&conn, &user_id)?.ok_or(AppError::Unauthorized)
}

pub async fn user_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = authenticate(&state, &request)?;

    request.extensions_mut().insert(UserContext { user });
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let context = UserContext {
        user: authenticate(&state, &request)?,
    };
    context.require_admin()?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}
