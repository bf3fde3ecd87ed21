use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::auth::claims::{Claims, Identity, Principal, RoleSet};
use crate::auth::codec::{TokenCodec, TokenError};
use crate::config::AuthConfig;

/// Errors surfaced to callers of the token lifecycle.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Refresh was attempted with a token that fails validation, or with
    /// a subject the role source no longer knows.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Time source for token issuance and validation.
///
/// Production uses [`SystemClock`]; tests inject a manual clock so
/// expiry behavior can be exercised without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Supplies the current role set for a subject at refresh time.
///
/// Refresh tokens carry no role claims, so roles for the re-issued
/// access token are always re-fetched from the identity store instead
/// of being copied from the presented token.
#[async_trait]
pub trait RoleSource: Send + Sync {
    /// `None` when the subject is unknown (e.g. the account was deleted
    /// after the refresh token was issued).
    async fn roles_for(&self, subject: &str) -> Option<RoleSet>;
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of the access token, epoch seconds
    pub access_expires_at: i64,
}

/// Issues and validates the platform's signed tokens.
///
/// Owns the signing-key material and claim semantics. The secret and
/// TTLs are fixed at startup; the service is shared read-only across
/// all request tasks.
pub struct TokenService {
    codec: TokenCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec: TokenCodec::new(&config.token_secret),
            access_ttl: Duration::hours(config.access_token_ttl_hours),
            refresh_ttl: Duration::days(config.refresh_token_ttl_days),
            clock,
        }
    }

    /// Issue a short-lived access token carrying subject and roles.
    pub fn issue_access_token(&self, identity: &Identity) -> Result<String, TokenError> {
        if identity.roles.is_empty() {
            return Err(TokenError::Encoding(
                "access token requires a non-empty role set".to_string(),
            ));
        }

        let now = self.clock.now();
        let claims = Claims {
            sub: identity.subject.clone(),
            roles: identity.roles.clone(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        self.codec.sign(&claims)
    }

    /// Issue a long-lived refresh token carrying only the subject.
    pub fn issue_refresh_token(&self, subject: &str) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: subject.to_string(),
            roles: RoleSet::new(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        self.codec.sign(&claims)
    }

    /// Issue the access/refresh pair for a just-authenticated identity.
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let access_token = self.issue_access_token(identity)?;
        let refresh_token = self.issue_refresh_token(&identity.subject)?;
        let access_expires_at = (self.clock.now() + self.access_ttl).timestamp();
        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
        })
    }

    /// True iff the token verifies against the shared secret and has not
    /// expired. Never returns an error; the reason is logged for
    /// diagnostics only.
    pub fn validate(&self, token: &str) -> bool {
        match self.codec.verify(token, self.clock.now()) {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "token validation failed");
                false
            }
        }
    }

    /// Validate a token and extract its principal in one atomic step.
    ///
    /// Claims are only reachable through the returned [`Principal`], so
    /// there is no way to read subject or roles from a token that did
    /// not verify. A verified token with an empty role set (a refresh
    /// token presented as a bearer credential) yields no principal.
    pub fn authenticate(&self, token: &str) -> Option<Principal> {
        match self.codec.verify(token, self.clock.now()) {
            Ok(claims) => {
                let principal = Principal::from_claims(claims);
                if principal.is_none() {
                    debug!("verified token carries no roles, refusing principal");
                }
                principal
            }
            Err(e) => {
                debug!(error = %e, "token rejected");
                None
            }
        }
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// Roles for the new access token are re-fetched from `roles`; both
    /// a failed validation and an unknown subject collapse to
    /// [`AuthError::InvalidRefreshToken`] so the caller can return a
    /// single unauthorized response.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        roles: &dyn RoleSource,
    ) -> Result<TokenPair, AuthError> {
        let claims = self
            .codec
            .verify(refresh_token, self.clock.now())
            .map_err(|e| {
                debug!(error = %e, "refresh token rejected");
                AuthError::InvalidRefreshToken
            })?;

        let roles = roles.roles_for(&claims.sub).await.ok_or_else(|| {
            debug!(subject = %claims.sub, "refresh subject unknown to role source");
            AuthError::InvalidRefreshToken
        })?;

        let identity = Identity {
            subject: claims.sub,
            roles,
        };
        Ok(self.issue_pair(&identity)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Manually advanced clock for expiry tests.
    struct ManualClock(AtomicI64);

    impl ManualClock {
        fn starting_at(epoch: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(epoch)))
        }

        fn advance(&self, secs: i64) {
            self.0.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            chrono::TimeZone::timestamp_opt(&Utc, self.0.load(Ordering::SeqCst), 0).unwrap()
        }
    }

    struct FixedRoles(Option<RoleSet>);

    #[async_trait]
    impl RoleSource for FixedRoles {
        async fn roles_for(&self, _subject: &str) -> Option<RoleSet> {
            self.0.clone()
        }
    }

    fn config() -> AuthConfig {
        AuthConfig {
            token_secret: "unit-test-secret".to_string(),
            access_token_ttl_hours: 1,
            refresh_token_ttl_days: 30,
        }
    }

    fn customer() -> Identity {
        Identity {
            subject: "a@b.com".to_string(),
            roles: RoleSet::from([Role::Customer]),
        }
    }

    #[test]
    fn test_access_token_expires_after_ttl() {
        let clock = ManualClock::starting_at(1_700_000_000);
        let service = TokenService::with_clock(&config(), clock.clone());

        let token = service.issue_access_token(&customer()).unwrap();
        assert!(service.validate(&token));

        // One hour and one second later the token is expired.
        clock.advance(3_601);
        assert!(!service.validate(&token));
    }

    #[test]
    fn test_authenticate_extracts_principal() {
        let service = TokenService::new(&config());
        let token = service.issue_access_token(&customer()).unwrap();

        let principal = service.authenticate(&token).unwrap();
        assert_eq!(principal.subject(), "a@b.com");
        assert!(principal.has_role(Role::Customer));
    }

    #[test]
    fn test_refresh_token_is_not_a_bearer_credential() {
        let service = TokenService::new(&config());
        let refresh = service.issue_refresh_token("a@b.com").unwrap();

        // Signature and expiry are fine, but the empty role set means no
        // principal is attached.
        assert!(service.validate(&refresh));
        assert!(service.authenticate(&refresh).is_none());
    }

    #[test]
    fn test_access_token_requires_roles() {
        let service = TokenService::new(&config());
        let identity = Identity {
            subject: "a@b.com".to_string(),
            roles: RoleSet::new(),
        };
        assert!(matches!(
            service.issue_access_token(&identity),
            Err(TokenError::Encoding(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_reissues_with_fresh_roles() {
        let service = TokenService::new(&config());
        let refresh = service.issue_refresh_token("a@b.com").unwrap();

        let roles = FixedRoles(Some(RoleSet::from([Role::Customer, Role::Admin])));
        let pair = service.refresh(&refresh, &roles).await.unwrap();

        let principal = service.authenticate(&pair.access_token).unwrap();
        assert_eq!(principal.subject(), "a@b.com");
        assert!(principal.has_role(Role::Admin));
        assert!(service.validate(&pair.refresh_token));
    }

    #[tokio::test]
    async fn test_refresh_rejects_invalid_token() {
        let service = TokenService::new(&config());
        let roles = FixedRoles(Some(RoleSet::from([Role::Customer])));

        let result = service.refresh("garbage.token.here", &roles).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_token() {
        let clock = ManualClock::starting_at(1_700_000_000);
        let service = TokenService::with_clock(&config(), clock.clone());
        let refresh = service.issue_refresh_token("a@b.com").unwrap();

        clock.advance(31 * 86_400);
        let roles = FixedRoles(Some(RoleSet::from([Role::Customer])));
        let result = service.refresh(&refresh, &roles).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_unknown_subject() {
        let service = TokenService::new(&config());
        let refresh = service.issue_refresh_token("gone@b.com").unwrap();

        let result = service.refresh(&refresh, &FixedRoles(None)).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }
}
