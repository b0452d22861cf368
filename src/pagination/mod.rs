pub mod response;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{ClientApi, FetchError};
use crate::model::{ClientRecord, PaginationState};

pub use response::{normalize_list_response, ListPage, ShapeError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load page {}: {source}", page + 1)]
    Fetch {
        page: u32,
        #[source]
        source: FetchError,
    },

    #[error("no data on page {}", page + 1)]
    Empty { page: u32 },
}

impl LoadError {
    pub fn page(&self) -> u32 {
        match self {
            Self::Fetch { page, .. } | Self::Empty { page } => *page,
        }
    }
}

// Raw result of one spawned list request, tagged with the request generation.
#[derive(Debug)]
pub struct ListOutcome {
    pub(crate) generation: u64,
    pub(crate) page: u32,
    pub(crate) result: Result<ListPage, FetchError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLoaded {
    pub page: u32,
    pub records: usize,
}

/// Owns the visible page of records and its pagination state. At most one
/// list request is outstanding; a newer request aborts the older one and any
/// outcome that still arrives for it is dropped.
pub struct PaginationController {
    api: Arc<dyn ClientApi>,
    state: PaginationState,
    records: Vec<ClientRecord>,
    generation: u64,
    loading: bool,
    in_flight: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<ListOutcome>,
    rx: mpsc::UnboundedReceiver<ListOutcome>,
}

impl PaginationController {
    pub fn new(api: Arc<dyn ClientApi>, page_size: u32) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            state: PaginationState::initial(page_size.max(1)),
            records: Vec::new(),
            generation: 0,
            loading: false,
            in_flight: None,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn records(&self) -> &[ClientRecord] {
        &self.records
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Spawns the list request for `page` and returns its generation.
    pub fn request_page(&mut self, page: u32) -> u64 {
        self.abort_in_flight();
        self.generation += 1;
        self.loading = true;

        let generation = self.generation;
        let page_size = self.state.page_size;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        debug!(page, page_size, generation, "requesting client page");
        self.in_flight = Some(tokio::spawn(async move {
            let result = match api.list_clients(page, page_size).await {
                Ok(body) => normalize_list_response(&body, page, page_size).map_err(|source| {
                    FetchError::Shape {
                        url: format!("/api/clients?page={page}&size={page_size}"),
                        source,
                    }
                }),
                Err(e) => Err(e),
            };
            let _ = tx.send(ListOutcome {
                generation,
                page,
                result,
            });
        }));
        generation
    }

    pub fn next_page(&mut self) -> Option<u64> {
        if !self.state.has_more {
            return None;
        }
        Some(self.request_page(self.state.page + 1))
    }

    pub fn previous_page(&mut self) -> Option<u64> {
        if self.state.page == 0 {
            return None;
        }
        Some(self.request_page(self.state.page - 1))
    }

    pub fn reload(&mut self) -> u64 {
        self.request_page(self.state.page)
    }

    /// Detaches any pending request; its eventual outcome becomes a no-op.
    pub fn cancel(&mut self) {
        self.abort_in_flight();
        self.generation += 1;
        self.loading = false;
    }

    pub async fn next_outcome(&mut self) -> Option<ListOutcome> {
        self.rx.recv().await
    }

    /// Applies an outcome. `None` means it was stale and changed nothing.
    pub fn apply(&mut self, outcome: ListOutcome) -> Option<Result<PageLoaded, LoadError>> {
        if outcome.generation != self.generation {
            debug!(
                page = outcome.page,
                generation = outcome.generation,
                current = self.generation,
                "discarding stale page outcome"
            );
            return None;
        }
        self.loading = false;
        self.in_flight = None;

        let page = outcome.page;
        let result = match outcome.result {
            Ok(list) if list.records.is_empty() => Err(LoadError::Empty { page }),
            Ok(list) => {
                let loaded = PageLoaded {
                    page,
                    records: list.records.len(),
                };
                self.records = list.records;
                self.state.settle(page, list.total_pages);
                Ok(loaded)
            }
            Err(source) => Err(LoadError::Fetch { page, source }),
        };

        if let Err(err) = &result {
            warn!(page, error = %err, "client page load failed, keeping last good state");
            // page and total_pages stay at the last stable values
            self.state.has_more = false;
        }
        Some(result)
    }

    /// Requests `page` and waits for its own outcome, skipping stale ones.
    pub async fn load_page(&mut self, page: u32) -> Result<PageLoaded, LoadError> {
        self.request_page(page);
        self.settle().await
    }

    pub(crate) async fn settle(&mut self) -> Result<PageLoaded, LoadError> {
        // the controller holds a sender, so recv only yields Some
        loop {
            if let Some(outcome) = self.next_outcome().await {
                if let Some(result) = self.apply(outcome) {
                    return result;
                }
            }
        }
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

impl Drop for PaginationController {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}
