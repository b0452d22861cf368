use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::api::ClientApi;
use crate::fetcher::{DetailState, PredictionExplainabilityFetcher};
use crate::format::{DisplayField, FieldFormatter, ProfileSummary, ScoreSummary};
use crate::history::HistoryStore;
use crate::model::{ClientRecord, HistoryEntry, PaginationState};
use crate::pagination::{LoadError, PageLoaded, PaginationController};
use crate::search;
use crate::shap::{self, FactorBar};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Clone, Debug)]
pub struct ViewOptions {
    pub page_size: u32,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid page_size {value}, expected positive integer")]
    InvalidPageSize { value: u32 },
}

#[derive(Debug)]
pub enum ViewUpdate {
    List(Result<PageLoaded, LoadError>),
    Detail,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DetailBody {
    Loading,
    Failed {
        message: String,
    },
    Ready {
        score: ScoreSummary,
        factors: Vec<FactorBar>,
        fields: Vec<DisplayField>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetailView {
    pub profile: ProfileSummary,
    pub body: DetailBody,
}

/// Two-pane roster: the list side (page, query, history) and the detail
/// side (selected client). Every mutation happens on the caller's task;
/// remote work lands through `next_update`.
pub struct ViewCoordinator {
    pager: PaginationController,
    details: PredictionExplainabilityFetcher,
    history: HistoryStore,
    formatter: FieldFormatter,
    query: String,
    selected: Option<ClientRecord>,
    history_open: bool,
    status: Option<String>,
}

impl ViewCoordinator {
    pub fn new(
        api: Arc<dyn ClientApi>,
        history: HistoryStore,
        formatter: FieldFormatter,
        options: ViewOptions,
    ) -> Result<Self, OptionsError> {
        if options.page_size == 0 {
            return Err(OptionsError::InvalidPageSize {
                value: options.page_size,
            });
        }
        Ok(Self {
            pager: PaginationController::new(Arc::clone(&api), options.page_size),
            details: PredictionExplainabilityFetcher::new(api),
            history,
            formatter,
            query: String::new(),
            selected: None,
            history_open: false,
            status: None,
        })
    }

    pub fn start(&mut self) {
        self.pager.request_page(0);
    }

    pub fn formatter(&self) -> &FieldFormatter {
        &self.formatter
    }

    pub fn pagination(&self) -> PaginationState {
        self.pager.state()
    }

    pub fn is_list_loading(&self) -> bool {
        self.pager.is_loading()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn visible_records(&self) -> Vec<&ClientRecord> {
        search::filter(self.pager.records(), &self.query)
    }

    pub fn next_page(&mut self) -> bool {
        self.pager.next_page().is_some()
    }

    pub fn previous_page(&mut self) -> bool {
        self.pager.previous_page().is_some()
    }

    pub fn reload(&mut self) {
        self.pager.reload();
    }

    pub fn selected(&self) -> Option<&ClientRecord> {
        self.selected.as_ref()
    }

    pub fn detail_state(&self) -> &DetailState {
        self.details.state()
    }

    pub fn select(&mut self, record: ClientRecord) {
        info!(id = %record.id, "client selected");
        self.history.record(HistoryEntry::from(&record));
        self.details.fetch_for(&record);
        self.selected = Some(record);
    }

    /// Selects the n-th row of the filtered list.
    pub fn select_visible(&mut self, index: usize) -> bool {
        let record = self.visible_records().get(index).map(|r| (*r).clone());
        match record {
            Some(record) => {
                self.select(record);
                true
            }
            None => false,
        }
    }

    /// Selects by id from the loaded page, falling back to history.
    pub fn select_id(&mut self, id: &str) -> bool {
        let record = self
            .pager
            .records()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .or_else(|| {
                self.history
                    .entries()
                    .iter()
                    .find(|e| e.id == id)
                    .map(ClientRecord::from)
            });
        match record {
            Some(record) => {
                self.select(record);
                true
            }
            None => false,
        }
    }

    pub fn select_history(&mut self, index: usize) -> bool {
        match self.history.get(index).map(ClientRecord::from) {
            Some(record) => {
                self.select(record);
                true
            }
            None => false,
        }
    }

    pub fn back(&mut self) {
        if let Some(record) = self.selected.take() {
            debug!(id = %record.id, "leaving detail view");
        }
        self.details.cancel();
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    pub fn history_open(&self) -> bool {
        self.history_open
    }

    pub fn toggle_history(&mut self) {
        self.history_open = !self.history_open;
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Waits for the next remote result that changes visible state.
    pub async fn next_update(&mut self) -> ViewUpdate {
        loop {
            tokio::select! {
                outcome = self.pager.next_outcome() => {
                    let Some(outcome) = outcome else { continue };
                    if let Some(result) = self.pager.apply(outcome) {
                        self.status = result.as_ref().err().map(|e| e.to_string());
                        return ViewUpdate::List(result);
                    }
                }
                outcome = self.details.next_outcome() => {
                    let Some(outcome) = outcome else { continue };
                    if self.details.apply(outcome) {
                        return ViewUpdate::Detail;
                    }
                }
            }
        }
    }

    pub fn detail_view(&self) -> Option<DetailView> {
        let record = self.selected.as_ref()?;
        let (prediction, body) = match self.details.state() {
            DetailState::Ready {
                id,
                prediction,
                factors,
            } if *id == record.id => (
                Some(prediction),
                DetailBody::Ready {
                    score: ScoreSummary::from_prediction(prediction),
                    factors: shap::normalize(factors),
                    fields: self.formatter.display_fields(prediction),
                },
            ),
            DetailState::Error { id, message } if *id == record.id => (
                None,
                DetailBody::Failed {
                    message: message.clone(),
                },
            ),
            _ => (None, DetailBody::Loading),
        };
        Some(DetailView {
            profile: ProfileSummary::build(record, prediction, &self.formatter),
            body,
        })
    }

    /// Detaches all pending work; late results become no-ops.
    pub fn teardown(&mut self) {
        self.pager.cancel();
        self.details.cancel();
        self.selected = None;
    }
}
