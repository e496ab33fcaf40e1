//! Chargement unique et partagé de l'index des frontières.
//!
//! Les appelants concurrents partagent le même chargement en cours ; un échec
//! remet l'état en attente de nouvel essai au lieu de le figer.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use super::index::{load_world_boundary_index, BoundaryIndex};
use crate::guard::HttpFetch;
use crate::types::{Limits, ReferenceSources, SecurityPolicy};
use crate::GeoIngestError;

type LoadResult = Result<Arc<BoundaryIndex>, Arc<GeoIngestError>>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

/// Fabrique d'un chargement complet de l'index
pub type BoundaryLoader =
    Arc<dyn Fn() -> BoxFuture<'static, Result<BoundaryIndex, GeoIngestError>> + Send + Sync>;

enum LoadState {
    Unloaded,
    Loading(SharedLoad),
    Loaded(Arc<BoundaryIndex>),
    Failed(Arc<GeoIngestError>),
}

/// Cache de session de l'index des frontières
pub struct BoundaryCache {
    state: Mutex<LoadState>,
    loader: BoundaryLoader,
}

impl std::fmt::Debug for BoundaryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.lock() {
            LoadState::Unloaded => "unloaded",
            LoadState::Loading(_) => "loading",
            LoadState::Loaded(_) => "loaded",
            LoadState::Failed(_) => "failed",
        };
        f.debug_struct("BoundaryCache").field("state", &state).finish()
    }
}

impl BoundaryCache {
    /// Cache alimenté par les sources de référence configurées
    pub fn new(
        sources: ReferenceSources,
        fetcher: Arc<dyn HttpFetch>,
        limits: Limits,
        policy: SecurityPolicy,
    ) -> Self {
        let loader: BoundaryLoader = Arc::new(move || {
            let sources = sources.clone();
            let fetcher = Arc::clone(&fetcher);
            let limits = limits.clone();
            let policy = policy.clone();
            async move { load_world_boundary_index(&sources, fetcher.as_ref(), &limits, &policy).await }
                .boxed()
        });
        Self::with_loader(loader)
    }

    pub fn with_loader(loader: BoundaryLoader) -> Self {
        Self {
            state: Mutex::new(LoadState::Unloaded),
            loader,
        }
    }

    /// Cache déjà rempli (pas de chargement)
    pub fn preloaded(index: BoundaryIndex) -> Self {
        let cache = Self::with_loader(Arc::new(|| {
            async { Err::<BoundaryIndex, _>(GeoIngestError::MissingReferenceSource("world boundaries")) }
                .boxed()
        }));
        *cache.lock() = LoadState::Loaded(Arc::new(index));
        cache
    }

    fn lock(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Index si déjà chargé, sans déclencher de chargement
    pub fn peek(&self) -> Option<Arc<BoundaryIndex>> {
        match &*self.lock() {
            LoadState::Loaded(index) => Some(Arc::clone(index)),
            _ => None,
        }
    }

    /// Dernière erreur de chargement, tant qu'aucun nouvel essai n'a eu lieu
    pub fn last_error(&self) -> Option<Arc<GeoIngestError>> {
        match &*self.lock() {
            LoadState::Failed(e) => Some(Arc::clone(e)),
            _ => None,
        }
    }

    /// Retourne l'index, en le chargeant au premier appel.
    ///
    /// Un appel concurrent pendant un chargement attend ce même chargement.
    /// Après un échec, l'appel suivant relance un chargement.
    pub async fn get(&self) -> Result<Arc<BoundaryIndex>, GeoIngestError> {
        let pending = {
            let mut state = self.lock();
            if let LoadState::Loaded(index) = &*state {
                return Ok(Arc::clone(index));
            }
            if let LoadState::Loading(pending) = &*state {
                debug!("Joining in-flight boundary index load");
                pending.clone()
            } else {
                debug!("Starting boundary index load");
                let pending = self.start_load();
                *state = LoadState::Loading(pending.clone());
                pending
            }
        };

        let result = pending.clone().await;

        {
            let mut state = self.lock();
            let still_current = matches!(&*state, LoadState::Loading(current) if current.ptr_eq(&pending));
            if still_current {
                *state = match &result {
                    Ok(index) => LoadState::Loaded(Arc::clone(index)),
                    Err(e) => {
                        warn!(error = %e, "Boundary index load failed, will retry on next request");
                        LoadState::Failed(Arc::clone(e))
                    }
                };
            }
        }

        result.map_err(GeoIngestError::ReferenceData)
    }

    fn start_load(&self) -> SharedLoad {
        let load = (self.loader)();
        async move { load.await.map(Arc::new).map_err(Arc::new) }
            .boxed()
            .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::index::tests::{boundary_json, metadata_json};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingLoader {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    fn counting_cache(fail: bool) -> (Arc<CountingLoader>, BoundaryCache) {
        let counter = Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(fail),
        });
        let shared = Arc::clone(&counter);
        let loader: BoundaryLoader = Arc::new(move || {
            let counter = Arc::clone(&shared);
            async move {
                counter.calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                if counter.fail.load(Ordering::SeqCst) {
                    Err(GeoIngestError::InvalidMetadata("top-level value is not an array".into()))
                } else {
                    BoundaryIndex::build(&boundary_json(), &metadata_json())
                }
            }
            .boxed()
        });
        (counter, BoundaryCache::with_loader(loader))
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let (counter, cache) = counting_cache(false);

        let (a, b, c) = tokio::join!(cache.get(), cache.get(), cache.get());
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));

        // Mémoïsé
        let d = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&a, &d));
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
        assert!(cache.peek().is_some());
    }

    #[tokio::test]
    async fn test_failure_is_retried() {
        let (counter, cache) = counting_cache(true);

        let (a, b) = tokio::join!(cache.get(), cache.get());
        assert!(matches!(a, Err(GeoIngestError::ReferenceData(_))));
        assert!(b.is_err());
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
        assert!(cache.last_error().is_some());
        assert!(cache.peek().is_none());

        counter.fail.store(false, Ordering::SeqCst);
        let index = cache.get().await.unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
        assert!(cache.last_error().is_none());
    }

    #[tokio::test]
    async fn test_preloaded_never_loads() {
        let index = BoundaryIndex::build(&boundary_json(), &metadata_json()).unwrap();
        let cache = BoundaryCache::preloaded(index);
        assert_eq!(cache.get().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_spawned_callers_share_one_load() {
        let (counter, cache) = counting_cache(false);
        let cache = Arc::new(cache);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get().await.map(|i| i.len()) })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 4);
        }
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }
}
