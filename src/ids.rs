//! Identifier mint: alphabet `ABCDEFGHKMNPQRSTUVWXYZ123456789` (no I, L, O, 0),
//! prefixed with the current UTC year, checked against a used-id set under a
//! read-write lock and retried until unique.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::RwLock;

const ALPHABET: &[u8] = b"ABCDEFGHKMNPQRSTUVWXYZ123456789";

/// Generates opaque identifiers, unique for the lifetime of the mint.
#[derive(Clone)]
pub struct IdentifierMint {
    used: Arc<RwLock<HashSet<String>>>,
}

impl Default for IdentifierMint {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierMint {
    pub fn new() -> Self {
        Self {
            used: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Mint an identifier of `length` random characters, prefixed by the
    /// current 4-digit UTC year. Retries until the candidate is not already
    /// present in the used-id set, then commits it.
    pub async fn mint(&self, length: usize) -> String {
        loop {
            let candidate = Self::generate(length);
            {
                let used = self.used.read().await;
                if used.contains(&candidate) {
                    continue;
                }
            }
            let mut used = self.used.write().await;
            if used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    fn generate(length: usize) -> String {
        let year = Utc::now().year();
        let mut rng = OsRng;
        let mut s = format!("{year:04}");
        for _ in 0..length {
            let idx = (rng.next_u32() as usize) % ALPHABET.len();
            s.push(ALPHABET[idx] as char);
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet as StdHashSet;

    #[tokio::test]
    async fn mints_are_unique_and_well_formed() {
        let mint = IdentifierMint::new();
        let mut seen = StdHashSet::new();
        let re = regex::Regex::new(r"^\d{4}[A-HK-NP-Z1-9]{6}$").unwrap();
        for _ in 0..2000 {
            let id = mint.mint(6).await;
            assert!(re.is_match(&id), "id {id} did not match expected pattern");
            assert!(seen.insert(id), "duplicate identifier minted");
        }
    }

    #[tokio::test]
    async fn mints_concurrently_are_unique() {
        let mint = IdentifierMint::new();
        let mut handles = Vec::new();
        for _ in 0..10_000 {
            let mint = mint.clone();
            handles.push(tokio::spawn(async move { mint.mint(6).await }));
        }
        let mut seen = StdHashSet::new();
        for handle in handles {
            let id = handle.await.unwrap();
            assert!(seen.insert(id), "duplicate identifier minted under concurrency");
        }
    }
}
