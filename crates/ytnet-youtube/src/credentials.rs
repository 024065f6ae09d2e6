//! Multi-key credential pool with quota-driven rotation.
//!
//! Keys are tried in insertion order. When the API reports quota exhaustion
//! for the active key it is marked exhausted for the rest of the run and the
//! pool advances cyclically to the next key that is still usable. Once every
//! key is exhausted [`CredentialPool::acquire_key`] fails with
//! [`YoutubeError::PoolExhausted`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use ytnet_core::ApiCredential;

use crate::error::YoutubeError;

/// A single API key owned by the [`CredentialPool`].
#[derive(Clone)]
pub struct ApiKey {
    id: String,
    secret: String,
    exhausted: bool,
    last_used: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Builds a key from its secret. Without a label the id is a short
    /// sha256 fingerprint, so audit records never carry key material.
    #[must_use]
    pub fn new(label: Option<&str>, secret: &str) -> Self {
        let id = label.map_or_else(|| fingerprint(secret), str::to_owned);
        Self {
            id,
            secret: secret.to_owned(),
            exhausted: false,
            last_used: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    #[must_use]
    pub fn last_used(&self) -> Option<DateTime<Utc>> {
        self.last_used
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("id", &self.id)
            .field("secret", &"[redacted]")
            .field("exhausted", &self.exhausted)
            .field("last_used", &self.last_used)
            .finish()
    }
}

fn fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    let hex: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("key-{hex}")
}

/// Ordered pool of API keys with a single active cursor.
#[derive(Debug)]
pub struct CredentialPool {
    keys: Vec<ApiKey>,
    active: usize,
}

impl CredentialPool {
    /// Ids repeated within `keys` (a reused label, or the same secret listed
    /// twice) get a `#<n>` suffix so every key stays individually addressable.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::NoCredentials`] when `keys` is empty.
    pub fn new(mut keys: Vec<ApiKey>) -> Result<Self, YoutubeError> {
        if keys.is_empty() {
            return Err(YoutubeError::NoCredentials);
        }
        let mut seen: HashMap<String, usize> = HashMap::new();
        for key in &mut keys {
            let count = seen.entry(key.id.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                tracing::warn!(key_id = %key.id, "duplicate API key id, disambiguating");
                key.id = format!("{}#{count}", key.id);
            }
        }
        Ok(Self { keys, active: 0 })
    }

    /// Builds a pool from configured credentials, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::NoCredentials`] when `credentials` is empty.
    pub fn from_credentials(credentials: &[ApiCredential]) -> Result<Self, YoutubeError> {
        let keys = credentials
            .iter()
            .map(|c| ApiKey::new(c.label.as_deref(), &c.secret))
            .collect();
        Self::new(keys)
    }

    /// Returns the active key and stamps its last-used time.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::PoolExhausted`] when every key is exhausted.
    pub fn acquire_key(&mut self) -> Result<&ApiKey, YoutubeError> {
        if self.keys[self.active].exhausted {
            return Err(YoutubeError::PoolExhausted {
                keys: self.keys.len(),
            });
        }
        self.keys[self.active].last_used = Some(Utc::now());
        Ok(&self.keys[self.active])
    }

    /// Marks `key_id` exhausted. If it was the active key, advances to the
    /// next unexhausted key in cyclic insertion order; when none remains the
    /// active key stays exhausted and the next [`Self::acquire_key`] fails.
    pub fn report_quota_exceeded(&mut self, key_id: &str) {
        let idx = if self.keys[self.active].id == key_id {
            Some(self.active)
        } else {
            self.keys.iter().position(|k| k.id == key_id)
        };
        let Some(idx) = idx else {
            tracing::warn!(key_id, "quota reported for a key that is not in the pool");
            return;
        };
        self.keys[idx].exhausted = true;
        tracing::warn!(
            key_id,
            remaining = self.remaining(),
            "API key quota exhausted"
        );
        if idx != self.active {
            return;
        }
        let n = self.keys.len();
        if let Some(next) = (1..n)
            .map(|step| (self.active + step) % n)
            .find(|&i| !self.keys[i].exhausted)
        {
            self.active = next;
            tracing::info!(key_id = %self.keys[next].id, "rotated to next API key");
        }
    }

    /// Number of keys that are still usable.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.keys.iter().filter(|k| !k.exhausted).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(ids: &[&str]) -> CredentialPool {
        let keys = ids
            .iter()
            .map(|&id| ApiKey::new(Some(id), &format!("secret-{id}")))
            .collect();
        CredentialPool::new(keys).unwrap()
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(matches!(
            CredentialPool::new(Vec::new()),
            Err(YoutubeError::NoCredentials)
        ));
    }

    #[test]
    fn acquire_returns_first_key_and_stamps_last_used() {
        let mut p = pool(&["A", "B"]);
        let key = p.acquire_key().unwrap();
        assert_eq!(key.id(), "A");
        assert!(key.last_used().is_some());
    }

    #[test]
    fn rotates_deterministically_and_then_exhausts() {
        let mut p = pool(&["A", "B", "C"]);
        p.report_quota_exceeded("A");
        assert_eq!(p.acquire_key().unwrap().id(), "B");
        p.report_quota_exceeded("B");
        assert_eq!(p.acquire_key().unwrap().id(), "C");
        p.report_quota_exceeded("C");
        assert!(matches!(
            p.acquire_key(),
            Err(YoutubeError::PoolExhausted { keys: 3 })
        ));
        assert_eq!(p.remaining(), 0);
    }

    #[test]
    fn rotation_wraps_around_without_revisiting_exhausted_keys() {
        let mut p = pool(&["A", "B", "C"]);
        // B is reported while A is active: only B is marked.
        p.report_quota_exceeded("B");
        assert_eq!(p.acquire_key().unwrap().id(), "A");
        p.report_quota_exceeded("A");
        assert_eq!(p.acquire_key().unwrap().id(), "C");
    }

    #[test]
    fn unknown_key_report_is_ignored() {
        let mut p = pool(&["A"]);
        p.report_quota_exceeded("Z");
        assert_eq!(p.acquire_key().unwrap().id(), "A");
    }

    #[test]
    fn unlabeled_key_gets_fingerprint_id() {
        let key = ApiKey::new(None, "AIzaSyExample");
        assert!(key.id().starts_with("key-"));
        assert_eq!(key.id().len(), "key-".len() + 8);
        assert!(!key.id().contains("AIza"));
        assert_eq!(key.id(), ApiKey::new(None, "AIzaSyExample").id());
    }

    #[test]
    fn shared_ids_still_exhaust_every_key() {
        let keys = vec![
            ApiKey::new(Some("main"), "K1"),
            ApiKey::new(Some("main"), "K2"),
            ApiKey::new(None, "K3"),
            ApiKey::new(None, "K3"),
        ];
        let mut p = CredentialPool::new(keys).unwrap();
        let mut served = Vec::new();
        for _ in 0..4 {
            let key = p.acquire_key().unwrap();
            served.push(key.secret().to_owned());
            let id = key.id().to_owned();
            p.report_quota_exceeded(&id);
        }
        assert_eq!(served, ["K1", "K2", "K3", "K3"]);
        assert!(matches!(
            p.acquire_key(),
            Err(YoutubeError::PoolExhausted { keys: 4 })
        ));
    }

    #[test]
    fn duplicate_ids_get_numbered_suffix() {
        let keys = vec![ApiKey::new(Some("main"), "K1"), ApiKey::new(Some("main"), "K2")];
        let mut p = CredentialPool::new(keys).unwrap();
        assert_eq!(p.acquire_key().unwrap().id(), "main");
        p.report_quota_exceeded("main");
        assert_eq!(p.acquire_key().unwrap().id(), "main#2");
    }

    #[test]
    fn debug_redacts_secret() {
        let key = ApiKey::new(Some("main"), "very-secret");
        assert!(!format!("{key:?}").contains("very-secret"));
    }

    #[test]
    fn from_credentials_preserves_order() {
        let creds = vec![
            ApiCredential {
                label: Some("first".to_owned()),
                secret: "s1".to_owned(),
            },
            ApiCredential {
                label: Some("second".to_owned()),
                secret: "s2".to_owned(),
            },
        ];
        let mut p = CredentialPool::from_credentials(&creds).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.acquire_key().unwrap().secret(), "s1");
    }
}
