use chrono::{Duration, NaiveDateTime};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Configuration;
use crate::core::library::{LibraryError, LibraryResult, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TokenKind {
    Access,
    Refresh,
}

// Claims carried by both token kinds. `jti` keeps two tokens minted in the same
// second for the same user distinct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub sub: String,
    pub role: Role,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

// TokenSigner mints and verifies HS256 tokens. Expiry is checked against the caller's
// clock instead of the system time.
pub(crate) struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    pub(crate) fn new(config: &Configuration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: Duration::seconds(config.access_token_ttl_secs),
            refresh_ttl: Duration::seconds(config.refresh_token_ttl_secs),
        }
    }

    pub(crate) fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    pub(crate) fn issue(&self, user_id: &str, role: Role, kind: TokenKind, now: NaiveDateTime) -> LibraryResult<String> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            typ: kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub(crate) fn verify(&self, token: &str, kind: TokenKind, now: NaiveDateTime) -> LibraryResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)?.claims;
        if claims.typ != kind {
            return Err(LibraryError::unauthorized("unexpected token type"));
        }
        if claims.exp <= now.timestamp() {
            return Err(LibraryError::unauthorized("token expired"));
        }
        Ok(claims)
    }
}

impl From<jsonwebtoken::errors::Error> for LibraryError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        LibraryError::unauthorized(format!("invalid token {:?}", err.kind()).as_str())
    }
}
