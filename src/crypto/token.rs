use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes in a confirmation token
const TOKEN_BYTES: usize = 32;

/// How many hours a pending subscription may be confirmed for
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token is of invalid format")]
    InvalidFormat,
}

/// An opaque, single-use confirmation token: 32 random bytes, hex encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionToken(String);

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SubscriptionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for SubscriptionToken {
    type Err = TokenError;

    fn from_str(token: &str) -> Result<Self, TokenError> {
        let token = token.trim();
        if token.len() != TOKEN_BYTES * 2 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TokenError::InvalidFormat);
        }
        Ok(Self(token.to_lowercase()))
    }
}

/// A freshly issued token along with the moment it stops being accepted
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: SubscriptionToken,
    pub expires_at: DateTime<Utc>,
}

/// Issues confirmation tokens from the operating system's CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenIssuer;

impl TokenIssuer {
    pub fn issue(&self) -> IssuedToken {
        self.issue_at(Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, now: DateTime<Utc>) -> IssuedToken {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);

        IssuedToken {
            token: SubscriptionToken(hex::encode(bytes)),
            expires_at: now + Duration::hours(TOKEN_TTL_HOURS),
        }
    }
}
