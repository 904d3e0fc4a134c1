//! Sign-in
//!
//! The identity provider is reached only through `AuthSession`, so the flow
//! can be exercised without a real SDK. Order is fixed: identify, attempt a
//! first factor, activate the session, redirect.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConsoleError, ConsoleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Password,
    EmailCode,
    Sso,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstFactor {
    Password(String),
    EmailCode(String),
    Sso { provider: String, return_url: String },
}

impl FirstFactor {
    pub fn kind(&self) -> FactorKind {
        match self {
            FirstFactor::Password(_) => FactorKind::Password,
            FirstFactor::EmailCode(_) => FactorKind::EmailCode,
            FirstFactor::Sso { .. } => FactorKind::Sso,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInAttempt {
    pub id: String,
    pub supported_factors: Vec<FactorKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    Complete { session_id: String },
    NeedsVerification,
    /// SSO: continue at the provider.
    Redirect(String),
}

#[async_trait]
pub trait AuthSession: Send + Sync {
    async fn identify(&self, identifier: &str) -> ConsoleResult<SignInAttempt>;
    async fn attempt_factor(&self, attempt: &SignInAttempt, factor: &FirstFactor) -> ConsoleResult<AttemptStatus>;
    async fn activate(&self, session_id: &str) -> ConsoleResult<()>;
    async fn sign_out(&self) -> ConsoleResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn { session_id: String, redirect: String },
    NeedsVerification,
    ProviderRedirect(String),
}

pub struct SignInFlow<'a> {
    session: &'a dyn AuthSession,
    after_sign_in: String,
}

impl<'a> SignInFlow<'a> {
    pub fn new(session: &'a dyn AuthSession, after_sign_in: impl Into<String>) -> Self {
        Self { session, after_sign_in: after_sign_in.into() }
    }

    pub async fn run(&self, identifier: &str, factor: &FirstFactor) -> ConsoleResult<SignInOutcome> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ConsoleError::validation("identifier", "Email address is required"));
        }
        if let FirstFactor::Password(p) | FirstFactor::EmailCode(p) = factor {
            if p.is_empty() {
                return Err(ConsoleError::validation("factor", "This field is required"));
            }
        }

        let attempt = self.session.identify(identifier).await?;
        if !attempt.supported_factors.contains(&factor.kind()) {
            return Err(ConsoleError::Auth(format!(
                "{:?} sign-in is not enabled for this account",
                factor.kind()
            )));
        }
        debug!("Sign-in attempt {} identified", attempt.id);

        match self.session.attempt_factor(&attempt, factor).await? {
            AttemptStatus::Complete { session_id } => {
                self.session.activate(&session_id).await?;
                info!("Session {} activated", session_id);
                Ok(SignInOutcome::SignedIn { session_id, redirect: self.after_sign_in.clone() })
            }
            AttemptStatus::NeedsVerification => Ok(SignInOutcome::NeedsVerification),
            AttemptStatus::Redirect(url) => Ok(SignInOutcome::ProviderRedirect(url)),
        }
    }

    pub async fn sign_out(&self) -> ConsoleResult<()> {
        self.session.sign_out().await
    }
}
