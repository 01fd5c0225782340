//! Cached content gateway
//!
//! Every read of upstream content goes through [`ContentGateway`], which keeps
//! the last good response per request in memory and decides on each call
//! whether to serve it, serve it while refreshing it in the background, or
//! fetch synchronously. When a fetch fails and any earlier response exists,
//! that response is served instead of the error.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::cache::{
    CacheEntry, CacheKey, CacheStore, Clock, Freshness, FreshnessPolicy, SystemClock,
};
use crate::data::{ContentSource, FetchError, Params};

/// Errors surfaced by the gateway
///
/// Only raised when the upstream fetch fails and nothing is cached for the
/// request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("content API unavailable for {key}: {source}")]
    UpstreamUnavailable {
        key: CacheKey,
        #[source]
        source: FetchError,
    },
}

/// How a value was produced by [`ContentGateway::lookup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeStatus {
    /// Cached and inside the fresh window
    Fresh,
    /// Cached and past the fresh window; a background refresh may be running
    Stale,
    /// Fetched from upstream during this call
    Fetched,
    /// Upstream failed; an older cached value was served instead
    Degraded,
}

/// A value returned by the gateway together with how it was served
#[derive(Debug)]
pub struct Served {
    pub value: Arc<Value>,
    pub status: ServeStatus,
    /// When the served value was fetched from upstream
    pub stored_at: DateTime<Utc>,
    /// Background refresh spawned by this call, if any
    ///
    /// Dropping the handle detaches the task; it still runs to completion.
    pub revalidation: Option<JoinHandle<()>>,
}

/// Stale-while-revalidate cache in front of a [`ContentSource`]
///
/// Cheap to clone; clones share the same store and source.
pub struct ContentGateway<S> {
    shared: Arc<Shared<S>>,
}

struct Shared<S> {
    source: S,
    store: CacheStore,
    policy: FreshnessPolicy,
    clock: Arc<dyn Clock>,
    revalidating: Arc<Mutex<HashSet<CacheKey>>>,
}

impl<S> Clone for ContentGateway<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: ContentSource> ContentGateway<S> {
    /// Creates a gateway with an empty cache and the system clock
    pub fn new(source: S, policy: FreshnessPolicy) -> Self {
        Self::with_clock(source, policy, Arc::new(SystemClock))
    }

    /// Creates a gateway reading time from `clock`
    pub fn with_clock(source: S, policy: FreshnessPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                store: CacheStore::new(),
                policy,
                clock,
                revalidating: Arc::new(Mutex::new(HashSet::new())),
            }),
        }
    }

    /// The upstream this gateway reads from
    pub fn source(&self) -> &S {
        &self.shared.source
    }

    /// The cache backing this gateway, shared by all clones
    pub fn store(&self) -> &CacheStore {
        &self.shared.store
    }

    /// The fresh and stale windows in use
    pub fn policy(&self) -> FreshnessPolicy {
        self.shared.policy
    }

    /// Reads `endpoint` with `params`, through the cache
    ///
    /// Fails only when upstream is unreachable and nothing has ever been
    /// cached for this request.
    pub async fn get(&self, endpoint: &str, params: &Params) -> Result<Arc<Value>, GatewayError> {
        self.lookup(endpoint, params).await.map(|served| served.value)
    }

    /// Like [`get`](Self::get), but reports how the value was served
    pub async fn lookup(&self, endpoint: &str, params: &Params) -> Result<Served, GatewayError> {
        let key = CacheKey::new(endpoint, params);
        let cached = self.shared.store.get(&key);

        if let Some(entry) = &cached {
            match self.shared.policy.classify(self.shared.clock.now(), entry.stored_at) {
                Freshness::Fresh => {
                    tracing::debug!(%key, "fresh cache hit");
                    return Ok(Served {
                        value: Arc::clone(&entry.value),
                        status: ServeStatus::Fresh,
                        stored_at: entry.stored_at,
                        revalidation: None,
                    });
                }
                Freshness::Stale => {
                    tracing::debug!(%key, "stale cache hit, revalidating in background");
                    let revalidation = self.spawn_revalidation(key, endpoint, params);
                    return Ok(Served {
                        value: Arc::clone(&entry.value),
                        status: ServeStatus::Stale,
                        stored_at: entry.stored_at,
                        revalidation,
                    });
                }
                Freshness::Expired => {
                    tracing::debug!(%key, "cache entry expired, fetching");
                }
            }
        } else {
            tracing::debug!(%key, "cache miss, fetching");
        }

        match self.shared.source.fetch(endpoint, params).await {
            Ok(value) => {
                let entry = CacheEntry::new(value, self.shared.clock.now());
                self.shared.store.insert(key, entry.clone());
                Ok(Served {
                    value: entry.value,
                    status: ServeStatus::Fetched,
                    stored_at: entry.stored_at,
                    revalidation: None,
                })
            }
            Err(err) => match cached {
                Some(entry) => {
                    tracing::warn!(
                        %key,
                        error = %err,
                        stored_at = %entry.stored_at,
                        "upstream failed, serving cached value"
                    );
                    Ok(Served {
                        value: entry.value,
                        status: ServeStatus::Degraded,
                        stored_at: entry.stored_at,
                        revalidation: None,
                    })
                }
                None => Err(GatewayError::UpstreamUnavailable { key, source: err }),
            },
        }
    }

    /// Whether a background refresh for this request is currently running
    pub fn is_revalidating(&self, endpoint: &str, params: &Params) -> bool {
        self.shared
            .revalidating
            .lock()
            .contains(&CacheKey::new(endpoint, params))
    }

    /// Spawns a detached refresh of `key`, unless one is already running
    ///
    /// Outside a Tokio runtime nothing is spawned and the stale value is
    /// served as is.
    fn spawn_revalidation(
        &self,
        key: CacheKey,
        endpoint: &str,
        params: &Params,
    ) -> Option<JoinHandle<()>> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::warn!(%key, error = %err, "no async runtime, skipping revalidation");
                return None;
            }
        };
        let guard = InFlight::acquire(&self.shared.revalidating, key)?;
        let shared = Arc::clone(&self.shared);
        let endpoint = endpoint.to_string();
        let params = params.clone();

        Some(runtime.spawn(async move {
            let key = guard.key();
            match shared.source.fetch(&endpoint, &params).await {
                Ok(value) => {
                    shared
                        .store
                        .insert(key.clone(), CacheEntry::new(value, shared.clock.now()));
                    tracing::debug!(%key, "background revalidation complete");
                }
                Err(err) => {
                    tracing::warn!(
                        %key,
                        error = %err,
                        "background revalidation failed, keeping cached value"
                    );
                }
            }
            drop(guard);
        }))
    }
}

/// Marks a key as being refreshed; unmarks it on drop
struct InFlight {
    keys: Arc<Mutex<HashSet<CacheKey>>>,
    key: CacheKey,
}

impl InFlight {
    fn acquire(keys: &Arc<Mutex<HashSet<CacheKey>>>, key: CacheKey) -> Option<Self> {
        if !keys.lock().insert(key.clone()) {
            tracing::debug!(%key, "revalidation already in flight");
            return None;
        }
        Some(Self {
            keys: Arc::clone(keys),
            key,
        })
    }

    fn key(&self) -> &CacheKey {
        &self.key
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.keys.lock().remove(&self.key);
    }
}
