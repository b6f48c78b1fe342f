//! API key handling and session-scoped storage.
//!
//! The key is supplied by the user once per session and lives only in
//! memory. It is passed around through an injectable [`CredentialStore`]
//! rather than a global so the orchestrator can be driven by a fake store
//! in tests.

use std::fmt;

/// An opaque API key for the generation service.
///
/// Surrounding whitespace is trimmed on construction. `Debug` never prints
/// the key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw key, for placing in a request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Key-value storage for the session credential.
pub trait CredentialStore: Send {
    fn get(&self) -> Option<Credential>;
    fn set(&mut self, credential: Credential);
    fn clear(&mut self);
}

/// In-memory store whose lifetime is the session. Nothing touches disk.
#[derive(Debug, Default)]
pub struct SessionCredentialStore {
    credential: Option<Credential>,
}

impl SessionCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with a key, e.g. from `GEMINI_API_KEY`.
    ///
    /// An empty key leaves the store empty.
    pub fn with_credential(credential: impl Into<Credential>) -> Self {
        let mut store = Self::new();
        let credential = credential.into();
        if !credential.is_empty() {
            store.set(credential);
        }
        store
    }
}

impl CredentialStore for SessionCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.credential.clone()
    }

    fn set(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    fn clear(&mut self) {
        self.credential = None;
    }
}
