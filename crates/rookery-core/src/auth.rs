use crate::{CoreError, Endpoint, Result, Rookery};
use rookery_crypto::password::{hash_password, verify_password};
use rookery_crypto::time::{deadline_ms, now_ms};
use rookery_crypto::token::{mint_token, token_digest};
use rookery_store::{StoreError, User};
use serde::Serialize;

const MAX_EMAIL_LEN: usize = 254;
const MAX_PASSWORD_CHARS: usize = 128;

/// Bearer token returned by a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at_ms: i64,
}

/// Lowercase and trim an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a normalized email address.
///
/// Accepts `local@domain.tld` with no whitespace, a single `@`, and a
/// domain made of non-empty dot-separated labels.
pub fn validate_email(email: &str) -> std::result::Result<(), String> {
    if email.is_empty() {
        return Err("email cannot be empty".to_string());
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(format!("email must be {MAX_EMAIL_LEN} characters or less"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err("email cannot contain whitespace".to_string());
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err("email must contain @".to_string());
    };
    if local.is_empty() || domain.contains('@') {
        return Err("email must have exactly one @ and a local part".to_string());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err("email domain is invalid".to_string());
    }
    Ok(())
}

/// Any password is accepted up to [`MAX_PASSWORD_CHARS`], which bounds
/// the hashing cost.
pub fn validate_password(password: &str) -> std::result::Result<(), String> {
    if password.chars().count() > MAX_PASSWORD_CHARS {
        return Err(format!(
            "password must be {MAX_PASSWORD_CHARS} characters or less"
        ));
    }
    Ok(())
}

impl Rookery {
    pub fn create_user(&self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        validate_email(&email).map_err(CoreError::InvalidInput)?;
        validate_password(password).map_err(CoreError::InvalidInput)?;

        let hash = hash_password(password)?;
        let user = self
            .store()
            .insert_user(&email, &hash)
            .map_err(|e| match e {
                StoreError::Conflict => CoreError::EmailTaken,
                other => other.into(),
            })?;
        tracing::info!(user_id = user.id, "user created");
        Ok(user)
    }

    /// Exchange credentials for a bearer token.
    ///
    /// Admission is checked per normalized email before any lookup, so a
    /// locked-out address is rejected whether or not it exists.
    pub fn login(&self, email: &str, password: &str) -> Result<AccessToken> {
        let email = normalize_email(email);
        self.admit(&email, Endpoint::Login)?;

        let Some((user_id, hash)) = self.store().credentials(&email)? else {
            return Err(CoreError::InvalidCredentials);
        };
        if !verify_password(password, &hash)? {
            tracing::debug!(user_id, "login rejected: wrong password");
            return Err(CoreError::InvalidCredentials);
        }

        let token = mint_token();
        let expires_at_ms = deadline_ms(self.settings().token_ttl_secs);
        self.store()
            .insert_session(&token_digest(&token), user_id, expires_at_ms)?;
        tracing::info!(user_id, "login");

        Ok(AccessToken {
            access_token: token,
            token_type: "bearer",
            expires_at_ms,
        })
    }

    /// Revoke a token. Unknown tokens are fine.
    pub fn logout(&self, token: &str) -> Result<()> {
        if self.store().delete_session(&token_digest(token))? {
            tracing::debug!("session revoked");
        }
        Ok(())
    }

    /// Resolve a bearer token to its user id.
    pub fn authenticate(&self, token: &str) -> Result<i64> {
        let digest = token_digest(token);
        let Some(session) = self.store().get_session(&digest)? else {
            return Err(CoreError::Unauthenticated);
        };
        let now = now_ms();
        if session.expires_at_ms <= now {
            self.store().delete_session(&digest)?;
            self.store()
                .delete_expired_sessions(session.user_id, now)?;
            return Err(CoreError::Unauthenticated);
        }
        Ok(session.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_emails() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+tag@mail.example.org").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        for bad in [
            "",
            "alice",
            "@example.com",
            "alice@",
            "alice@example",
            "alice@@example.com",
            "alice@exa mple.com",
            "alice@example..com",
            "alice@.com",
        ] {
            assert!(validate_email(bad).is_err(), "accepted {bad:?}");
        }
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("pass1").is_ok());
        assert!(validate_password("").is_ok());
        assert!(validate_password(&"p".repeat(128)).is_ok());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }
}
