use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::errors::LookupError;
use crate::traits::PackageLookup;

struct CacheEntry {
    packages: HashSet<String>,
    fetched_at: Instant,
}

/// TTL cache in front of a [`PackageLookup`].
///
/// Only successful lookups are stored; failures always reach the caller.
pub struct CachedLookup<L> {
    inner: L,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl<L: PackageLookup> CachedLookup<L> {
    pub fn new(inner: L, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// 指定ユーザーのキャッシュを破棄
    pub async fn invalidate(&self, username: &str) {
        self.entries.write().await.remove(username);
    }

    /// すべてのキャッシュを破棄
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn cached(&self, username: &str) -> Option<HashSet<String>> {
        let entries = self.entries.read().await;
        entries
            .get(username)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.packages.clone())
    }
}

impl<L: PackageLookup> PackageLookup for CachedLookup<L> {
    async fn packages_of_user(&self, username: &str) -> Result<HashSet<String>, LookupError> {
        if let Some(packages) = self.cached(username).await {
            tracing::trace!("package cache hit for '{}'", username);
            return Ok(packages);
        }

        tracing::trace!("package cache miss for '{}'", username);
        let packages = self.inner.packages_of_user(username).await?;

        let mut entries = self.entries.write().await;
        // 期限切れのエントリは書き込みのたびに掃除する
        entries.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        entries.insert(
            username.to_string(),
            CacheEntry {
                packages: packages.clone(),
                fetched_at: Instant::now(),
            },
        );
        drop(entries);

        Ok(packages)
    }
}
