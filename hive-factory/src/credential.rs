//! Provider secrets.
//!
//! A [`Credential`] can only be read through [`Credential::with_secret`] and is
//! zeroed on drop. Sources resolve a variable name (`OPENAI_API_KEY`, ...) to a
//! credential; the factory asks only on a cache miss.

use async_trait::async_trait;
use std::collections::HashMap;
use zeroize::Zeroizing;

/// An opaque secret. No `Clone`, no `Display`, redacted `Debug`.
pub struct Credential {
    inner: Zeroizing<String>,
}

impl Credential {
    /// Wrap a secret. The string is moved, not copied.
    pub fn new(secret: String) -> Self {
        Self {
            inner: Zeroizing::new(secret),
        }
    }

    /// Scoped exposure. The secret is only visible inside the closure.
    pub fn with_secret<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.inner)
    }

    /// Whether the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Resolves credential variable names to secrets.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Look up `var`. `None` when the variable is not available.
    async fn resolve(&self, var: &str) -> Option<Credential>;
}

/// Reads credentials from the process environment.
///
/// Empty variables count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

#[async_trait]
impl CredentialSource for EnvCredentials {
    async fn resolve(&self, var: &str) -> Option<Credential> {
        match std::env::var(var) {
            Ok(value) if !value.is_empty() => Some(Credential::new(value)),
            _ => None,
        }
    }
}

/// A fixed set of credentials, for tests and embedded setups.
#[derive(Default)]
pub struct StaticCredentials {
    values: HashMap<String, Zeroizing<String>>,
}

impl StaticCredentials {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential.
    pub fn with(mut self, var: impl Into<String>, secret: impl Into<String>) -> Self {
        self.values.insert(var.into(), Zeroizing::new(secret.into()));
        self
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut vars: Vec<&String> = self.values.keys().collect();
        vars.sort();
        f.debug_struct("StaticCredentials")
            .field("vars", &vars)
            .finish()
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn resolve(&self, var: &str) -> Option<Credential> {
        self.values
            .get(var)
            .map(|secret| Credential::new(secret.as_str().to_owned()))
    }
}
