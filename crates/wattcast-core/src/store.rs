//! Snapshot store for the active dataset and trend model
//!
//! The dataset and its model are published together as one immutable
//! [`Snapshot`]. Writers build the replacement off-lock and hold the write
//! lock only to swap the `Arc`; readers clone the `Arc` and keep a consistent
//! view for as long as they hold it.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::ForecastConfig;
use crate::error::{Error, Result};
use crate::ingest::{fingerprint, parse_csv};
use crate::models::{ColumnRoles, Dataset, Metrics};
use crate::trend::{TrendModel, MIN_RECORDS_FOR_ACCURACY};

/// One consistent view of the uploaded data and the model fitted to it
#[derive(Debug, Default)]
pub struct Snapshot {
    pub dataset: Arc<Dataset>,
    pub columns: Option<ColumnRoles>,
    pub model: Option<Arc<TrendModel>>,
    /// Held-out accuracy percentage, 0 when not scored
    pub accuracy: f64,
    /// SHA-256 of the uploaded bytes
    pub fingerprint: Option<String>,
    /// Incremented on every publish; 0 is the empty startup snapshot
    pub generation: u64,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn metrics(&self) -> Metrics {
        Metrics::new(&self.dataset, self.accuracy)
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }
}

/// Holds the current snapshot
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot visible right now
    pub fn current(&self) -> Result<Arc<Snapshot>> {
        let guard = self
            .current
            .read()
            .map_err(|_| Error::State("Failed to acquire snapshot lock".into()))?;
        Ok(Arc::clone(&guard))
    }

    fn swap(&self, build: impl FnOnce(u64) -> Snapshot) -> Result<Arc<Snapshot>> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| Error::State("Failed to acquire snapshot lock".into()))?;
        let next = Arc::new(build(guard.generation + 1));
        *guard = Arc::clone(&next);
        Ok(next)
    }

    /// Parse an upload, fit models, and publish the result
    ///
    /// Models are fitted only when there are enough records to score them;
    /// smaller uploads are published without a model.
    pub fn ingest(&self, bytes: &[u8], config: &ForecastConfig) -> Result<Arc<Snapshot>> {
        let parsed = parse_csv(bytes)?;
        let dataset = parsed.dataset;

        let model = if dataset.len() >= MIN_RECORDS_FOR_ACCURACY {
            let regressor = config.regressor.build(config.forest_trees, config.seed);
            Some(Arc::new(TrendModel::fit(&dataset, regressor.as_ref(), config)?))
        } else {
            info!(
                records = dataset.len(),
                "Upload too small to train; skipping model fit"
            );
            None
        };
        let accuracy = model.as_ref().map_or(0.0, |m| m.accuracy());
        let digest = fingerprint(bytes);

        let snapshot = self.swap(|generation| Snapshot {
            dataset: Arc::new(dataset),
            columns: Some(parsed.columns),
            model,
            accuracy,
            fingerprint: Some(digest),
            generation,
            loaded_at: Some(Utc::now()),
        })?;

        info!(
            generation = snapshot.generation,
            records = snapshot.dataset.len(),
            accuracy = snapshot.accuracy,
            "Dataset published"
        );
        Ok(snapshot)
    }

    /// Refit the model against the current dataset
    ///
    /// Fails with [`Error::State`] if another upload was published while
    /// fitting; the stale model is discarded.
    pub fn retrain(&self, config: &ForecastConfig) -> Result<Arc<Snapshot>> {
        let base = self.current()?;
        if base.is_empty() {
            return Err(Error::NoData);
        }

        let regressor = config.regressor.build(config.forest_trees, config.seed);
        let model = TrendModel::fit(&base.dataset, regressor.as_ref(), config)?;
        self.publish_model(&base, model)
    }

    /// Attach a model fitted on `base` and publish it, unless a newer
    /// snapshot has replaced `base` in the meantime
    pub fn publish_model(&self, base: &Snapshot, model: TrendModel) -> Result<Arc<Snapshot>> {
        let accuracy = model.accuracy();

        let mut guard = self
            .current
            .write()
            .map_err(|_| Error::State("Failed to acquire snapshot lock".into()))?;
        if guard.generation != base.generation {
            warn!(
                trained_on = base.generation,
                current = guard.generation,
                "Dataset replaced during retrain; discarding model"
            );
            return Err(Error::State("Dataset changed during retraining".into()));
        }

        let next = Arc::new(Snapshot {
            dataset: Arc::clone(&base.dataset),
            columns: base.columns.clone(),
            model: Some(Arc::new(model)),
            accuracy,
            fingerprint: base.fingerprint.clone(),
            generation: guard.generation + 1,
            loaded_at: base.loaded_at,
        });
        *guard = Arc::clone(&next);

        info!(generation = next.generation, accuracy, "Model retrained");
        Ok(next)
    }
}
