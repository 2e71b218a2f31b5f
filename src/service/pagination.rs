//! Cursor pages over the report collections and the per-dashboard list that
//! accumulates them.
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::Store;
use crate::models::{
    cursor::ReportCursor,
    reportmodel::{CrimeReport, RoadReport},
};

pub const MAX_PAGE_SIZE: u32 = 100;

const LOAD_FAILED: &str = "Gagal memuat laporan. Coba muat ulang.";

/// A report collection that can be scanned newest first.
pub trait ReportRecord: Clone + Serialize + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn cursor(&self) -> ReportCursor;

    fn fetch_page(
        store: &dyn Store,
        limit: i64,
        after: Option<ReportCursor>,
    ) -> BoxFuture<'_, Result<Vec<Self>, sqlx::Error>>;

    fn fetch_all(store: &dyn Store) -> BoxFuture<'_, Result<Vec<Self>, sqlx::Error>>;
}

impl ReportRecord for CrimeReport {
    const COLLECTION: &'static str = "crime";

    fn cursor(&self) -> ReportCursor {
        ReportCursor::new(self.created_at, self.id)
    }

    fn fetch_page(
        store: &dyn Store,
        limit: i64,
        after: Option<ReportCursor>,
    ) -> BoxFuture<'_, Result<Vec<Self>, sqlx::Error>> {
        store.get_crime_reports_page(limit, after)
    }

    fn fetch_all(store: &dyn Store) -> BoxFuture<'_, Result<Vec<Self>, sqlx::Error>> {
        store.get_all_crime_reports()
    }
}

impl ReportRecord for RoadReport {
    const COLLECTION: &'static str = "road";

    fn cursor(&self) -> ReportCursor {
        ReportCursor::new(self.created_at, self.id)
    }

    fn fetch_page(
        store: &dyn Store,
        limit: i64,
        after: Option<ReportCursor>,
    ) -> BoxFuture<'_, Result<Vec<Self>, sqlx::Error>> {
        store.get_road_reports_page(limit, after)
    }

    fn fetch_all(store: &dyn Store) -> BoxFuture<'_, Result<Vec<Self>, sqlx::Error>> {
        store.get_all_road_reports()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<R> {
    pub records: Vec<R>,
    pub next_cursor: Option<String>,
    /// A full page means there may be more. The last page is only detected
    /// when it comes back short, so an exact multiple costs one empty fetch.
    pub has_more: bool,
}

pub async fn fetch_page<R: ReportRecord>(
    store: &dyn Store,
    page_size: u32,
    after: Option<ReportCursor>,
) -> Result<Page<R>, sqlx::Error> {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let records = R::fetch_page(store, page_size as i64, after).await?;

    Ok(Page {
        has_more: records.len() == page_size as usize,
        next_cursor: records.last().map(|r| r.cursor().encode()),
        records,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded,
    /// The query failed; the error is on the snapshot.
    Failed,
    /// Another fetch was already in flight, or there is nothing more to load.
    Skipped,
    /// The dashboard was closed while the fetch was running.
    Discarded,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagerSnapshot<R> {
    pub records: Vec<R>,
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

struct PagerState<R> {
    records: Vec<R>,
    cursor: Option<ReportCursor>,
    page: u32,
    has_more: bool,
    error: Option<String>,
    generation: u64,
    closed: bool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The report list of one open dashboard.
///
/// At most one fetch runs at a time; overlapping `refresh`/`load_more` calls
/// return [`LoadOutcome::Skipped`] without touching the store.
pub struct ReportPager<R> {
    store: Arc<dyn Store>,
    page_size: u32,
    in_flight: AtomicBool,
    state: Mutex<PagerState<R>>,
}

impl<R: ReportRecord> ReportPager<R> {
    pub fn new(store: Arc<dyn Store>, page_size: u32) -> Self {
        ReportPager {
            store,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            in_flight: AtomicBool::new(false),
            state: Mutex::new(PagerState {
                records: Vec::new(),
                cursor: None,
                page: 0,
                has_more: false,
                error: None,
                generation: 0,
                closed: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PagerState<R>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    /// Loads page 1 and replaces whatever the list held.
    pub async fn refresh(&self) -> LoadOutcome {
        let Some(_flight) = self.begin() else {
            return LoadOutcome::Skipped;
        };

        let generation = {
            let state = self.state();
            if state.closed {
                return LoadOutcome::Discarded;
            }
            state.generation
        };

        let result = fetch_page::<R>(self.store.as_ref(), self.page_size, None).await;

        let mut state = self.state();
        if state.closed || state.generation != generation {
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(page) => {
                state.cursor = page.records.last().map(|r| r.cursor());
                state.records = page.records;
                state.page = 1;
                state.has_more = page.has_more;
                state.error = None;
                LoadOutcome::Loaded
            }
            Err(e) => {
                tracing::error!("Failed to load first {} page: {}", R::COLLECTION, e);
                state.records.clear();
                state.cursor = None;
                state.page = 0;
                state.has_more = false;
                state.error = Some(LOAD_FAILED.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Loads the page after the last one and appends it. On a list that was
    /// never loaded this is the first page.
    pub async fn load_more(&self) -> LoadOutcome {
        let next = {
            let state = self.state();
            if state.closed {
                return LoadOutcome::Discarded;
            }
            if state.page == 0 {
                None
            } else if !state.has_more {
                return LoadOutcome::Skipped;
            } else {
                Some((state.generation, state.cursor))
            }
        };

        let Some((generation, after)) = next else {
            return self.refresh().await;
        };

        let Some(_flight) = self.begin() else {
            return LoadOutcome::Skipped;
        };

        let result = fetch_page::<R>(self.store.as_ref(), self.page_size, after).await;

        let mut state = self.state();
        if state.closed || state.generation != generation {
            return LoadOutcome::Discarded;
        }
        // A refresh finished between reading the cursor and taking the flight.
        if state.cursor != after {
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(page) => {
                if let Some(last) = page.records.last() {
                    state.cursor = Some(last.cursor());
                }
                state.records.extend(page.records);
                state.page += 1;
                state.has_more = page.has_more;
                state.error = None;
                LoadOutcome::Loaded
            }
            Err(e) => {
                tracing::error!(
                    "Failed to load {} page {}: {}",
                    R::COLLECTION,
                    state.page + 1,
                    e
                );
                state.error = Some(LOAD_FAILED.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Ends this dashboard instance. Fetches still running are discarded
    /// when they resolve.
    pub fn close(&self) {
        let mut state = self.state();
        state.closed = true;
        state.generation += 1;
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn snapshot(&self) -> PagerSnapshot<R> {
        let state = self.state();
        PagerSnapshot {
            records: state.records.clone(),
            page: state.page,
            has_more: state.has_more,
            loading: self.in_flight.load(Ordering::Acquire),
            error: state.error.clone(),
        }
    }
}

struct RegistryEntry<R> {
    pager: Arc<ReportPager<R>>,
    last_touched: Instant,
}

/// One dashboard list per signed-in user. Lists nobody has opened or paged
/// for `idle_ttl` are closed and dropped.
pub struct PagerRegistry<R> {
    store: Arc<dyn Store>,
    page_size: u32,
    idle_ttl: Duration,
    pagers: RwLock<HashMap<Uuid, RegistryEntry<R>>>,
}

impl<R: ReportRecord> PagerRegistry<R> {
    pub fn new(store: Arc<dyn Store>, page_size: u32, idle_ttl: Duration) -> Self {
        PagerRegistry {
            store,
            page_size,
            idle_ttl,
            pagers: RwLock::new(HashMap::new()),
        }
    }

    /// The user's open pager, creating one if none is open. Also drops
    /// every idle pager.
    pub async fn open(&self, user_id: Uuid) -> Arc<ReportPager<R>> {
        let now = Instant::now();
        let mut pagers = self.pagers.write().await;
        Self::drop_idle(&mut pagers, now, self.idle_ttl);

        let entry = pagers.entry(user_id).or_insert_with(|| RegistryEntry {
            pager: Arc::new(ReportPager::new(self.store.clone(), self.page_size)),
            last_touched: now,
        });
        entry.last_touched = now;
        entry.pager.clone()
    }

    pub async fn get(&self, user_id: Uuid) -> Option<Arc<ReportPager<R>>> {
        self.pagers
            .read()
            .await
            .get(&user_id)
            .map(|entry| entry.pager.clone())
    }

    /// Closes and forgets the user's pager. Returns false when none was open.
    pub async fn close(&self, user_id: Uuid) -> bool {
        match self.pagers.write().await.remove(&user_id) {
            Some(entry) => {
                entry.pager.close();
                true
            }
            None => false,
        }
    }

    /// Drops every idle pager and returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let mut pagers = self.pagers.write().await;
        Self::drop_idle(&mut pagers, Instant::now(), self.idle_ttl)
    }

    pub async fn open_count(&self) -> usize {
        self.pagers.read().await.len()
    }

    fn drop_idle(
        pagers: &mut HashMap<Uuid, RegistryEntry<R>>,
        now: Instant,
        idle_ttl: Duration,
    ) -> usize {
        let before = pagers.len();
        pagers.retain(|_, entry| {
            let alive = now.duration_since(entry.last_touched) <= idle_ttl;
            if !alive {
                entry.pager.close();
            }
            alive
        });
        before - pagers.len()
    }
}
