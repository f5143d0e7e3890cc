//! Minting and verifying the bearer tokens that identify a logged in user.

use std::fmt::Debug;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// How long a token is valid for when not configured otherwise.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::hours(24);

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// The user the token was issued to.
    pub user_id: UserID,
    /// The time the token was issued as a Unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a Unix timestamp.
    pub exp: i64,
}

/// The keys for signing and checking tokens, created once at start up from the server secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    duration: Duration,
}

impl TokenKeys {
    /// Create signing keys from a `secret` string. Tokens minted with these keys expire after
    /// `duration`.
    pub fn new(secret: &str, duration: Duration) -> Self {
        let hash = Sha512::digest(secret);

        Self {
            encoding_key: EncodingKey::from_secret(&hash),
            decoding_key: DecodingKey::from_secret(&hash),
            duration,
        }
    }

    /// Create a signed token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::TokenCreation] if the token could not be signed.
    pub fn mint(&self, user_id: UserID) -> Result<String, Error> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            user_id,
            iat: now.unix_timestamp(),
            exp: (now + self.duration).unix_timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|error| Error::TokenCreation(error.to_string()))
    }

    /// Check that `token` was signed with these keys and has not expired, and return the user
    /// it was issued to.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Unauthorized] if the token is malformed, has a bad signature or has
    /// expired.
    pub fn verify(&self, token: &str) -> Result<UserID, Error> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|token_data| token_data.claims.user_id)
            .map_err(|error| {
                tracing::debug!("Rejected token: {error}");
                Error::Unauthorized
            })
    }
}

impl Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use crate::{Error, auth::UserID};

    use super::{DEFAULT_TOKEN_DURATION, TokenKeys};

    #[test]
    fn verify_returns_the_user_the_token_was_minted_for() {
        let keys = TokenKeys::new("foobar", DEFAULT_TOKEN_DURATION);
        let token = keys.mint(UserID::new(7)).unwrap();

        assert_eq!(keys.verify(&token), Ok(UserID::new(7)));
    }

    #[test]
    fn verify_rejects_token_signed_with_another_secret() {
        let keys = TokenKeys::new("foobar", DEFAULT_TOKEN_DURATION);
        let other_keys = TokenKeys::new("barfoo", DEFAULT_TOKEN_DURATION);
        let token = other_keys.mint(UserID::new(7)).unwrap();

        assert_eq!(keys.verify(&token), Err(Error::Unauthorized));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = TokenKeys::new("foobar", Duration::minutes(-10));
        let token = keys.mint(UserID::new(7)).unwrap();

        assert_eq!(keys.verify(&token), Err(Error::Unauthorized));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = TokenKeys::new("foobar", DEFAULT_TOKEN_DURATION);

        assert_eq!(keys.verify("not.a.token"), Err(Error::Unauthorized));
        assert_eq!(keys.verify(""), Err(Error::Unauthorized));
    }

    #[test]
    fn debug_output_does_not_leak_keys() {
        let keys = TokenKeys::new("foobar", DEFAULT_TOKEN_DURATION);

        assert!(!format!("{keys:?}").contains("foobar"));
    }
}
