//! HTTP Basic authentication against Argon2-hashed user passwords.

use std::{collections::HashMap, sync::Arc};

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;
use tracing::{debug, warn};
use weather_core::Config;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
}

/// Hash a password into a PHC string suitable for the config file.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))
}

/// `false` for a wrong password and for an unparseable stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            warn!(error = %e, "stored password hash is not a valid PHC string");
            false
        }
    }
}

/// Password behind the decoy hash verified for unknown usernames.
const DECOY_PASSWORD: &str = "weather-decoy-password";

/// Username to password hash, loaded from the `[users]` config table.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    users: HashMap<String, String>,
    /// Hash verified when the username is unknown, so that lookups of unknown
    /// and known users cost the same Argon2 work.
    decoy: Option<String>,
}

impl Credentials {
    pub fn from_config(config: &Config) -> Self {
        let users = config
            .users
            .iter()
            .map(|(name, user)| (name.clone(), user.password_hash.clone()))
            .collect();

        let decoy = hash_password(DECOY_PASSWORD)
            .inspect_err(|e| warn!(error = %e, "cannot prepare decoy password hash"))
            .ok();

        Self { users, decoy }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(hash) => verify_password(password, hash),
            None => {
                if let Some(decoy) = &self.decoy {
                    verify_password(password, decoy);
                }
                false
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum BasicAuth {
    Missing,
    NoCredentials,
    ContainsSpaces,
    NotBase64,
    Present { username: String, password: String },
}

fn parse_authorization(header: Option<&str>) -> BasicAuth {
    let Some(header) = header else {
        return BasicAuth::Missing;
    };

    let mut parts = header.split_whitespace();
    match parts.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case("basic") => {}
        _ => return BasicAuth::Missing,
    }
    let Some(encoded) = parts.next() else {
        return BasicAuth::NoCredentials;
    };
    if parts.next().is_some() {
        return BasicAuth::ContainsSpaces;
    }

    let Some(decoded) =
        STANDARD.decode(encoded).ok().and_then(|raw| String::from_utf8(raw).ok())
    else {
        return BasicAuth::NotBase64;
    };

    // No colon means a username with an empty password.
    let (username, password) = decoded.split_once(':').unwrap_or((decoded.as_str(), ""));
    BasicAuth::Present { username: username.to_string(), password: password.to_string() }
}

/// Middleware rejecting requests without valid Basic credentials.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let header = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let (username, password) = match parse_authorization(header) {
        BasicAuth::Present { username, password } => (username, password),
        BasicAuth::Missing => {
            return ApiError::Unauthorized("Authentication credentials were not provided.")
                .into_response();
        }
        BasicAuth::NoCredentials => {
            return ApiError::Unauthorized("Invalid basic header. No credentials provided.")
                .into_response();
        }
        BasicAuth::ContainsSpaces => {
            return ApiError::Unauthorized(
                "Invalid basic header. Credentials string should not contain spaces.",
            )
            .into_response();
        }
        BasicAuth::NotBase64 => {
            return ApiError::Unauthorized(
                "Invalid basic header. Credentials not correctly base64 encoded.",
            )
            .into_response();
        }
    };

    // Argon2 verification is CPU-bound.
    let credentials = Arc::clone(&state.credentials);
    let user = username.clone();
    let verified = tokio::task::spawn_blocking(move || credentials.verify(&user, &password))
        .await
        .unwrap_or(false);

    if !verified {
        debug!(%username, "rejected credentials");
        return ApiError::Unauthorized("Invalid username/password.").into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("123").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("123", &hash));
        assert!(!verify_password("1234", &hash));
    }

    #[test]
    fn invalid_stored_hash_never_verifies() {
        assert!(!verify_password("123", "plaintext"));
    }

    #[test]
    fn credentials_from_config() {
        let mut config = Config::default();
        config.upsert_user("tester", hash_password("123").expect("hash"));

        let credentials = Credentials::from_config(&config);
        assert!(!credentials.is_empty());
        assert!(credentials.verify("tester", "123"));
        assert!(!credentials.verify("tester", "wrong"));
        assert!(!credentials.verify("nobody", "123"));
    }

    #[test]
    fn parses_basic_header() {
        assert_eq!(
            parse_authorization(Some(&header("tester:12:3"))),
            BasicAuth::Present { username: "tester".into(), password: "12:3".into() }
        );
        assert_eq!(
            parse_authorization(Some(&format!("basic {}", STANDARD.encode("a:b")))),
            BasicAuth::Present { username: "a".into(), password: "b".into() }
        );
    }

    #[test]
    fn missing_or_foreign_scheme() {
        assert_eq!(parse_authorization(None), BasicAuth::Missing);
        assert_eq!(parse_authorization(Some("Bearer abc")), BasicAuth::Missing);
    }

    #[test]
    fn malformed_headers() {
        assert_eq!(parse_authorization(Some("Basic")), BasicAuth::NoCredentials);
        assert_eq!(parse_authorization(Some("Basic  ")), BasicAuth::NoCredentials);
        assert_eq!(parse_authorization(Some("Basic abc def")), BasicAuth::ContainsSpaces);
        assert_eq!(parse_authorization(Some("Basic !!!")), BasicAuth::NotBase64);
    }

    #[test]
    fn header_without_colon_is_username_only() {
        assert_eq!(
            parse_authorization(Some(&header("no-colon"))),
            BasicAuth::Present { username: "no-colon".into(), password: String::new() }
        );
    }

    #[test]
    fn unknown_user_is_checked_against_decoy() {
        let credentials = Credentials::from_config(&Config::default());

        let decoy = credentials.decoy.as_deref().expect("decoy hash");
        assert!(decoy.starts_with("$argon2"));
        assert!(!credentials.verify("nobody", "123"));
        assert!(!credentials.verify("nobody", DECOY_PASSWORD));
    }
}
