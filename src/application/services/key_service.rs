//! Time-bucketed key derivation and one-shot slug exchange

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::application::cache::ExpiringMap;

/// Keys are stable inside a 48-hour bucket
const KEY_PERIOD_SECS: u64 = 60 * 60 * 48;

/// Slugs are valid for five minutes and a single redemption
const SLUG_TTL: Duration = Duration::from_secs(300);
const SLUG_LEN: usize = 7;
const SLUG_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub struct KeyService {
    slugs: ExpiringMap<String, String>,
}

impl KeyService {
    pub fn new() -> Self {
        Self {
            slugs: ExpiringMap::new(SLUG_TTL),
        }
    }

    /// Derive the key for an HWID in the current 48-hour bucket
    pub fn generate_key(&self, hwid: &str) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        key_for_bucket(hwid, now / KEY_PERIOD_SECS)
    }

    /// Mint a short-lived slug bound to an HWID
    pub fn create_slug(&self, hwid: &str) -> String {
        let mut rng = rand::thread_rng();
        let slug: String = (0..SLUG_LEN)
            .map(|_| SLUG_CHARSET[rng.gen_range(0..SLUG_CHARSET.len())] as char)
            .collect();
        self.slugs.insert(slug.clone(), hwid.to_string());
        slug
    }

    /// Redeem a slug for its key. Consumes the slug.
    pub fn redeem_slug(&self, slug: &str) -> Option<String> {
        let hwid = self.slugs.take(&slug.to_string())?;
        Some(self.generate_key(&hwid))
    }

    pub fn validate_key(&self, hwid: &str, key: &str) -> bool {
        self.generate_key(hwid) == key
    }

    /// Drop expired slugs (periodic cleanup task)
    pub fn purge(&self) -> usize {
        self.slugs.purge_expired()
    }
}

impl Default for KeyService {
    fn default() -> Self {
        Self::new()
    }
}

fn key_for_bucket(hwid: &str, bucket: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}{}", hwid, bucket));
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}
