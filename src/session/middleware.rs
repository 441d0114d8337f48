use std::convert::Infallible;

use warp::{
    reject::{self, Rejection},
    Filter,
};

use crate::error::Error;

use super::jwt::{verify_session, SessionData};

/// Requires an authenticated identity; rejects with a 401-equivalent when
/// the session cookie is absent or invalid.
pub fn with_session() -> impl Filter<Extract = (SessionData,), Error = Rejection> + Copy {
    warp::cookie::optional::<String>("session").and_then(|session: Option<String>| async move {
        let token = match session {
            Some(token) => token,
            None => {
                return Err(reject::custom(Error::Unauthorized(String::from(
                    "Authentication required",
                ))))
            }
        };

        match verify_session(token) {
            Ok(data) => Ok(SessionData::from(data)),
            Err(e) => Err(reject::custom(e)),
        }
    })
}

/// Anonymous requests pass through with `None`.
pub fn with_possible_session(
) -> impl Filter<Extract = (Option<SessionData>,), Error = Infallible> + Copy {
    warp::cookie::optional::<String>("session").map(|session: Option<String>| {
        session
            .and_then(|token| verify_session(token).ok())
            .map(SessionData::from)
    })
}
