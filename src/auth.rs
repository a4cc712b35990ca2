use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Source of bearer tokens. Asked once per request so rotated tokens are picked up.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.trim().is_empty()).then(|| token.trim().to_string()),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Reads the token file on every call; the identity provider's tooling rewrites it on rotation.
#[derive(Clone, Debug)]
pub struct TokenFileProvider {
    path: PathBuf,
}

impl TokenFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenProvider for TokenFileProvider {
    async fn token(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => {
                let token = raw.trim().to_string();
                (!token.is_empty()).then_some(token)
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "token file unreadable");
                None
            }
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("invalid identity provider key: {0}")]
    InvalidKey(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PublicMetadata {
    #[serde(default)]
    pub role: Option<String>,
}

/// Claims carried by identity-provider session tokens.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IdentityClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, rename = "publicMetadata", alias = "public_metadata")]
    pub public_metadata: Option<PublicMetadata>,
}

impl IdentityClaims {
    pub fn role(&self) -> Role {
        let raw = self
            .public_metadata
            .as_ref()
            .and_then(|m| m.role.as_deref())
            .or(self.role.as_deref());
        Role::from_claim(raw)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    pub fn from_claim(raw: Option<&str>) -> Self {
        match raw {
            Some("admin") => Role::Admin,
            _ => Role::Student,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UserIdentity {
    pub subject: String,
    pub display_name: Option<String>,
    pub role: Role,
}

impl UserIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<IdentityClaims> for UserIdentity {
    fn from(claims: IdentityClaims) -> Self {
        let role = claims.role();
        Self {
            subject: claims.sub,
            display_name: claims.name.or(claims.email),
            role,
        }
    }
}

/// Where the signed-in user currently stands, as seen by the views.
#[derive(Clone, Debug, PartialEq)]
pub enum IdentityState {
    Loading,
    SignedOut,
    SignedIn(UserIdentity),
}

/// Verifies RS256 session tokens against the identity provider's public key.
#[derive(Clone)]
pub struct IdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn from_pem(public_key_pem: &str) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|err| AuthError::InvalidKey(err.to_string()))?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_aud = false;
        Ok(Self { key, validation })
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        decode::<IdentityClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))
    }

    /// Resolves the identity behind whatever token the provider currently holds.
    pub async fn resolve<P: TokenProvider + ?Sized>(&self, provider: &P) -> IdentityState {
        let Some(token) = provider.token().await else {
            return IdentityState::SignedOut;
        };
        match self.verify(&token) {
            Ok(claims) => IdentityState::SignedIn(claims.into()),
            Err(err) => {
                warn!(error = %err, "session token rejected");
                IdentityState::SignedOut
            }
        }
    }
}
