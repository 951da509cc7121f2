//! Fragment listing cache with single-flight population.
//!
//! Enumerating fragments can mean remote I/O against the external system,
//! and every segment of a scan asks for the same listing at roughly the
//! same time. The cache guarantees at most one populator invocation per
//! key is in flight: concurrent same-key callers block until the first
//! caller's result (or failure) is available and then all receive the
//! identical `Arc<FragmentList>` (or the identical error). Failures are
//! not cached; the next call with that key retries population.
//!
//! The cache is constructed once at gateway startup and passed by
//! reference to the services that need it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use fedgate_common::config::FragmentCacheConfig;
use fedgate_error::{FedgateError, Result};

use crate::model::{Fragment, FragmentKey, FragmentList};

pub struct FragmentCache {
    inner: Cache<FragmentKey, Arc<FragmentList>>,
}

impl FragmentCache {
    pub fn new(config: &FragmentCacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(Duration::from_secs(config.ttl_seconds))
            .build();
        Self { inner }
    }

    /// Return the cached listing for `key`, populating it via `populate`
    /// on first access.
    ///
    /// `populate` typically calls into a connector's
    /// [`crate::sources::Fragmenter`] and may block on remote I/O; it runs
    /// at most once per key at a time. Fragment indices are assigned here,
    /// after a successful population: consecutive fragments sharing a
    /// source string are numbered from zero, so a connector can return
    /// several physical sources under one logical path and have each one's
    /// fragments independently zero-based.
    pub async fn get_or_populate<F>(
        &self,
        key: FragmentKey,
        populate: F,
    ) -> Result<Arc<FragmentList>>
    where
        F: Future<Output = Result<Vec<Fragment>>>,
    {
        let init = async move {
            let fragments = populate.await?;
            let list = FragmentList::new(assign_indices(fragments));
            debug!(
                target: "fragment_cache",
                fragments = list.len(),
                "Populated fragment listing"
            );
            Ok(Arc::new(list))
        };

        self.inner
            .try_get_with(key, init)
            .await
            .map_err(|e: Arc<FedgateError>| (*e).clone())
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

/// Group consecutive fragments by source and number each group from zero.
fn assign_indices(mut fragments: Vec<Fragment>) -> Vec<Fragment> {
    let mut counter = 0u32;
    for i in 0..fragments.len() {
        if i > 0 && fragments[i].source == fragments[i - 1].source {
            counter += 1;
        } else {
            counter = 0;
        }
        fragments[i].index = counter;
    }
    fragments
}
