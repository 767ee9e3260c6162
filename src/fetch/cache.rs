//! Stale-while-revalidate cache in front of a [`FetchPage`].
//!
//! A page is fresh for `stale_after`. Past that, callers still get the old page straight away
//! (flagged with `is_refetching`) while one background fetch replaces it. Only one fetch per query
//! is ever in flight; everyone asking for that query in the meantime waits on the same one.
//! A failed first fetch is never stored, so the next request tries again. A failed background
//! refresh is kept next to the stale page instead, and no further refresh starts until
//! [`QueryCache::refetch`] is called.

use crate::{
    data::{list_query::ListQuery, page::Page, student::Student},
    fetch::{FetchError, FetchPage},
};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::time::Instant;

type FetchResult = Result<Arc<Page<Student>>, FetchError>;
type InFlight = Shared<BoxFuture<'static, FetchResult>>;

#[derive(Default)]
struct Entry {
    value: Option<(Arc<Page<Student>>, Instant)>,
    in_flight: Option<InFlight>,
    ///why the last refresh of `value` failed
    last_error: Option<FetchError>,
}

struct Inner<F> {
    fetcher: F,
    entries: Mutex<HashMap<ListQuery, Entry>>,
    stale_after: Duration,
    retain_for: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
    pub page: Arc<Page<Student>>,
    ///the page is stale and a newer one is on its way
    pub is_refetching: bool,
    ///refreshing the (stale) page failed - it stays as it is until a manual refetch
    pub error: Option<FetchError>,
}

impl CachedPage {
    const fn fresh(page: Arc<Page<Student>>) -> Self {
        Self {
            page,
            is_refetching: false,
            error: None,
        }
    }
}

pub struct QueryCache<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for QueryCache<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F> std::fmt::Debug for QueryCache<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("stale_after", &self.inner.stale_after)
            .field("retain_for", &self.inner.retain_for)
            .finish_non_exhaustive()
    }
}

impl<F: FetchPage + 'static> QueryCache<F> {
    pub fn new(fetcher: F, stale_after: Duration, retain_for: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                entries: Mutex::new(HashMap::new()),
                stale_after,
                retain_for,
            }),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ListQuery, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn get(&self, query: &ListQuery) -> Result<CachedPage, FetchError> {
        let pending = {
            let mut entries = self.entries();
            let now = Instant::now();
            self.evict_expired(&mut entries, now);

            let entry = entries.entry(query.clone()).or_default();
            if let Some((page, fetched_at)) = &entry.value {
                let page = Arc::clone(page);
                if now.duration_since(*fetched_at) < self.inner.stale_after {
                    return Ok(CachedPage::fresh(page));
                }

                if let Some(error) = entry.last_error {
                    return Ok(CachedPage {
                        page,
                        is_refetching: false,
                        error: Some(error),
                    });
                }

                if entry.in_flight.is_none() {
                    debug!(%query, "Page is stale, refreshing in the background");
                    entry.in_flight = Some(self.start_fetch(query.clone()));
                }
                return Ok(CachedPage {
                    page,
                    is_refetching: true,
                    error: None,
                });
            }

            entry
                .in_flight
                .get_or_insert_with(|| self.start_fetch(query.clone()))
                .clone()
        };

        pending.await.map(CachedPage::fresh)
    }

    ///fetches again no matter how fresh the cached page is - joins a fetch that is already running
    ///
    ///if this fails too and there is an older page, that page comes back alongside the error
    pub async fn refetch(&self, query: &ListQuery) -> Result<CachedPage, FetchError> {
        let pending = {
            let mut entries = self.entries();
            let entry = entries.entry(query.clone()).or_default();
            entry.last_error = None;
            entry
                .in_flight
                .get_or_insert_with(|| self.start_fetch(query.clone()))
                .clone()
        };

        match pending.await {
            Ok(page) => Ok(CachedPage::fresh(page)),
            Err(error) => {
                let stale = self
                    .entries()
                    .get(query)
                    .and_then(|entry| entry.value.as_ref())
                    .map(|(page, _)| Arc::clone(page));
                stale.map_or(Err(error), |page| {
                    Ok(CachedPage {
                        page,
                        is_refetching: false,
                        error: Some(error),
                    })
                })
            }
        }
    }

    ///spawns the fetch so it finishes even if whoever asked for it goes away
    fn start_fetch(&self, query: ListQuery) -> InFlight {
        let inner = Arc::clone(&self.inner);
        let fetch = async move {
            let result = inner.fetcher.fetch(&query).await.map(Arc::new);

            let mut entries = inner
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let entry = entries.entry(query.clone()).or_default();
            entry.in_flight = None;
            match &result {
                Ok(page) => {
                    entry.value = Some((Arc::clone(page), Instant::now()));
                    entry.last_error = None;
                }
                //with nothing to show, the next request just tries again
                Err(error) if entry.value.is_some() => {
                    warn!(%query, "Refreshing stale page failed, keeping it until a retry");
                    entry.last_error = Some(*error);
                }
                Err(_) => {}
            }

            result
        }
        .boxed()
        .shared();

        tokio::spawn(fetch.clone());
        fetch
    }

    fn evict_expired(&self, entries: &mut HashMap<ListQuery, Entry>, now: Instant) {
        let keep_for = self.inner.stale_after + self.inner.retain_for;
        entries.retain(|_, entry| {
            entry.in_flight.is_some()
                || entry
                    .value
                    .as_ref()
                    .is_some_and(|(_, fetched_at)| now.duration_since(*fetched_at) < keep_for)
        });
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries().len()
    }
}
