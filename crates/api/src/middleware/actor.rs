//! Acting-user extractor.
//!
//! Authentication is done by an upstream gateway, which forwards the
//! resolved identity as `x-user-id` / `x-user-role` headers. Requests
//! without them act anonymously.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use vstack_core::actor::Actor;
use vstack_core::error::CoreError;
use vstack_core::types::DbId;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The [`Actor`] behind the current request.
///
/// ```ignore
/// async fn my_handler(CurrentActor(actor): CurrentActor) -> AppResult<Json<()>> {
///     tracing::info!(user_id = ?actor.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)
            .map(|raw| {
                raw.parse::<DbId>().map_err(|_| {
                    AppError::Core(CoreError::Unauthorized(format!(
                        "Invalid {USER_ID_HEADER} header"
                    )))
                })
            })
            .transpose()?;

        Ok(CurrentActor(Actor {
            user_id,
            role: header(parts, USER_ROLE_HEADER).map(str::to_string),
        }))
    }
}
