use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ClientApi, FetchError};
use crate::model::{ClientRecord, PredictionResult};
use crate::shap::{self, ShapFactor};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DetailState {
    #[default]
    Idle,
    Loading {
        id: String,
    },
    Ready {
        id: String,
        prediction: PredictionResult,
        factors: Vec<ShapFactor>,
    },
    Error {
        id: String,
        message: String,
    },
}

impl DetailState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

#[derive(Debug)]
pub struct DetailOutcome {
    pub(crate) generation: u64,
    pub(crate) id: String,
    pub(crate) result: Result<(PredictionResult, Vec<ShapFactor>), FetchError>,
}

/// Fetches the prediction and the attribution for one selected client at a
/// time. Both calls run concurrently; a newer selection aborts the older
/// fetch, and a stale outcome is dropped before it touches the state.
pub struct PredictionExplainabilityFetcher {
    api: Arc<dyn ClientApi>,
    state: DetailState,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<DetailOutcome>,
    rx: mpsc::UnboundedReceiver<DetailOutcome>,
}

impl PredictionExplainabilityFetcher {
    pub fn new(api: Arc<dyn ClientApi>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            state: DetailState::Idle,
            generation: 0,
            in_flight: None,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn fetch_for(&mut self, record: &ClientRecord) -> u64 {
        self.abort_in_flight();
        self.generation += 1;
        let generation = self.generation;
        let id = record.id.clone();
        self.state = DetailState::Loading { id: id.clone() };

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        debug!(%id, generation, "fetching prediction and attribution");
        self.in_flight = Some(tokio::spawn(async move {
            let result = fetch_pair(api.as_ref(), &id).await;
            let _ = tx.send(DetailOutcome {
                generation,
                id,
                result,
            });
        }));
        generation
    }

    /// Back navigation or teardown: drop the pending fetch and go idle.
    pub fn cancel(&mut self) {
        self.abort_in_flight();
        self.generation += 1;
        self.state = DetailState::Idle;
    }

    pub async fn next_outcome(&mut self) -> Option<DetailOutcome> {
        self.rx.recv().await
    }

    /// Returns false when the outcome was stale and ignored.
    pub fn apply(&mut self, outcome: DetailOutcome) -> bool {
        if outcome.generation != self.generation {
            debug!(
                id = %outcome.id,
                generation = outcome.generation,
                current = self.generation,
                "discarding stale detail outcome"
            );
            return false;
        }
        self.in_flight = None;
        let id = outcome.id;
        self.state = match outcome.result {
            Ok((prediction, factors)) => {
                info!(%id, factors = factors.len(), "detail ready");
                DetailState::Ready {
                    id,
                    prediction,
                    factors,
                }
            }
            Err(e) => {
                warn!(%id, network = e.is_network(), error = %e, "prediction fetch failed");
                DetailState::Error {
                    id,
                    message: e.to_string(),
                }
            }
        };
        true
    }

    /// Waits until the current fetch lands, skipping stale outcomes.
    pub async fn settle(&mut self) -> &DetailState {
        while self.state.is_loading() {
            if let Some(outcome) = self.next_outcome().await {
                self.apply(outcome);
            }
        }
        &self.state
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

impl Drop for PredictionExplainabilityFetcher {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

// Prediction failure fails the pair; attribution failure only empties it.
async fn fetch_pair(
    api: &dyn ClientApi,
    id: &str,
) -> Result<(PredictionResult, Vec<ShapFactor>), FetchError> {
    let (prediction, attribution) = futures::join!(api.predict(id), api.attribution(id));

    let body = prediction?;
    let prediction = PredictionResult::from_value(body).ok_or_else(|| FetchError::Format {
        url: format!("/api/client/{id}/predict"),
        message: "prediction body is not an object".to_string(),
    })?;

    let factors = match attribution {
        Ok(body) => shap::factors_from_body(&body),
        Err(e) => {
            debug!(%id, error = %e, "attribution unavailable, showing no factors");
            Vec::new()
        }
    };
    Ok((prediction, factors))
}
