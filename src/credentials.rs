use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// CredentialVerifier
///
/// The single capability the gate needs from an identity source: does this
/// candidate password grant admin access? Async so that a hashed-credential
/// lookup or an external identity provider can implement it without changing
/// the gate.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, candidate: &str) -> bool;
}

/// StaticSecretVerifier
///
/// Compares the candidate against one configured secret by plain equality.
/// The secret stays wrapped in `SecretString` so it never reaches a `Debug`
/// or log line.
#[derive(Debug, Clone)]
pub struct StaticSecretVerifier {
    secret: SecretString,
}

impl StaticSecretVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }
}

#[async_trait]
impl CredentialVerifier for StaticSecretVerifier {
    async fn verify(&self, candidate: &str) -> bool {
        let secret = self.secret.expose_secret();
        // An unset secret must never match the empty password.
        !secret.is_empty() && candidate == secret
    }
}

/// VerifierState
///
/// The concrete type used to share the verifier across all gates.
pub type VerifierState = Arc<dyn CredentialVerifier>;
