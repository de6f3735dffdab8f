// src/cache.rs
use sha2::{Digest, Sha256};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, PoisonError, RwLock,
};
use tracing::{debug, info};

use crate::error::Result;
use crate::panel::{Panel, PanelBuilder};

/// Identity of one build: file content, file name and pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub sha256: String,
    pub name: String,
    pub config: String,
}

impl CacheKey {
    pub fn new(name: &str, bytes: &[u8], builder: &PanelBuilder) -> Result<Self> {
        Ok(Self {
            sha256: compute_sha256(bytes),
            name: name.to_string(),
            config: builder.config().fingerprint()?,
        })
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Single-slot memo of the most recent panel.
///
/// Owned by whoever hosts the pipeline (one per user session); supplying a
/// different file replaces the slot. Safe to share across threads.
#[derive(Default)]
pub struct PanelCache {
    slot: RwLock<Option<(CacheKey, Arc<Panel>)>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PanelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached panel for this file, building (and caching) it on a miss.
    /// Failed builds leave the previous entry in place.
    pub fn get_or_build(
        &self,
        name: &str,
        bytes: &[u8],
        builder: &PanelBuilder,
    ) -> Result<Arc<Panel>> {
        let key = CacheKey::new(name, bytes, builder)?;

        // 1) fast path under the read lock
        {
            let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((cached, panel)) = slot.as_ref() {
                if *cached == key {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(file = name, sha256 = %key.sha256, "panel cache hit");
                    return Ok(Arc::clone(panel));
                }
            }
        }

        // 2) build outside any lock, then swap in
        self.misses.fetch_add(1, Ordering::Relaxed);
        info!(file = name, sha256 = %key.sha256, "panel cache miss, building");
        let panel = Arc::new(builder.build(name, bytes)?);

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some((key, Arc::clone(&panel)));
        Ok(panel)
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            debug!("panel cache invalidated");
        }
    }

    pub fn current_key(&self) -> Option<CacheKey> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(k, _)| k.clone())
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
