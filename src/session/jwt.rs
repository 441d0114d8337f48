use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::SESSION_KEY;
use crate::error::Error;
use crate::schema::{User, Uuid};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Uuid, username: String) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(1)).timestamp();

        Self {
            user_id: id,
            username,
            iat,
            exp,
        }
    }
}

/// Identity handle passed into the core actions. Everything beyond the pair
/// of fields here belongs to the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
}

impl From<JwtSessionData> for SessionData {
    fn from(data: JwtSessionData) -> Self {
        Self {
            user_id: data.user_id,
            username: data.username,
        }
    }
}

pub fn generate_session(user: &User) -> String {
    let key: Hmac<Sha256> = Hmac::new_from_slice(SESSION_KEY).unwrap();
    let claims = JwtSessionData::new(user.id, user.username.to_owned());

    claims.sign_with_key(&key).unwrap()
}

pub fn verify_session(token: String) -> Result<JwtSessionData, Error> {
    let key: Hmac<Sha256> = Hmac::new_from_slice(SESSION_KEY).unwrap();

    token
        .verify_with_key(&key)
        .map_err(|_| Error::Unauthorized(String::from("Invalid session; invalid token")))
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(Error::Unauthorized(String::from(
                    "Invalid session; token expired",
                )));
            }
            Ok(session)
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: String::from("Home"),
            last_name: String::from("Cook"),
        }
    }

    #[test]
    fn session_round_trips() {
        let token = generate_session(&user());
        let session = verify_session(token).unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "cook");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let mut token = generate_session(&user());
        token.push('x');
        assert!(matches!(
            verify_session(token),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let key: Hmac<Sha256> = Hmac::new_from_slice(SESSION_KEY).unwrap();
        let claims = JwtSessionData {
            user_id: 7,
            username: String::from("cook"),
            iat: 0,
            exp: 1,
        };
        let token = claims.sign_with_key(&key).unwrap();
        assert!(matches!(
            verify_session(token),
            Err(Error::Unauthorized(_))
        ));
    }
}
