//! Per-key handle cache.
//!
//! Each key owns a `OnceCell`, so concurrent first requests for one key
//! serialize on that cell and build at most one resource, while requests for
//! different keys proceed independently. Successfully built handles are also
//! recorded in a live list under the cache lock; teardown drains that list,
//! which is what guarantees every handle is closed exactly once.
//!
//! The bookkeeping lock is synchronous and never held across an await, so a
//! built handle reaches the live list before the caller can be dropped.

use crate::error::FactoryError;
use hive_core::{Handle, ResourceKey};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

/// Why a lookup produced no handle.
pub(crate) enum CacheError<T: ?Sized> {
    /// The cache was drained. `orphan` is a handle this caller built after
    /// the drain; nobody else will close it.
    Closed { orphan: Option<Handle<T>> },
    /// Construction failed. Nothing was cached.
    Init(FactoryError),
}

struct CacheState<T: ?Sized> {
    slots: HashMap<ResourceKey, Arc<OnceCell<Handle<T>>>>,
    live: Vec<Handle<T>>,
    closed: bool,
}

pub(crate) struct HandleCache<T: ?Sized> {
    state: Mutex<CacheState<T>>,
}

impl<T: ?Sized> HandleCache<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(CacheState {
                slots: HashMap::new(),
                live: Vec::new(),
                closed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the handle cached under `key`, building it with `init` on a
    /// miss. The flag is `true` when this call built the handle.
    pub(crate) async fn get_or_try_init<F, Fut>(
        &self,
        key: &ResourceKey,
        init: F,
    ) -> Result<(Handle<T>, bool), CacheError<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Handle<T>, FactoryError>>,
    {
        let cell = {
            let mut state = self.lock();
            if state.closed {
                return Err(CacheError::Closed { orphan: None });
            }
            Arc::clone(state.slots.entry(key.clone()).or_default())
        };

        let mut built = false;
        let mut orphan = None;
        let (built_flag, orphan_slot) = (&mut built, &mut orphan);
        let result = cell
            .get_or_try_init(|| async move {
                if self.lock().closed {
                    return Err(FactoryError::Closed);
                }
                *built_flag = true;
                let handle = init().await?;
                let mut state = self.lock();
                if state.closed {
                    *orphan_slot = Some(handle);
                    return Err(FactoryError::Closed);
                }
                state.live.push(handle.clone());
                Ok(handle)
            })
            .await;

        match result {
            // A waiter woken after a drain must not see the drained handle.
            Ok(_) if self.lock().closed => Err(CacheError::Closed { orphan: None }),
            Ok(handle) => Ok((handle.clone(), built)),
            Err(FactoryError::Closed) => Err(CacheError::Closed { orphan }),
            Err(err) => Err(CacheError::Init(err)),
        }
    }

    /// Mark the cache closed and take every live handle. A second drain
    /// returns nothing.
    pub(crate) fn drain(&self) -> Vec<Handle<T>> {
        let mut state = self.lock();
        state.closed = true;
        state.slots.clear();
        std::mem::take(&mut state.live)
    }

    /// Keys of live handles, in construction order.
    pub(crate) fn keys(&self) -> Vec<ResourceKey> {
        let state = self.lock();
        state.live.iter().map(|h| h.key().clone()).collect()
    }
}
