mod token;

pub use token::{IssuedToken, SubscriptionToken, TokenError, TokenIssuer, TOKEN_TTL_HOURS};
