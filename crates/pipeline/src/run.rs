//! One prediction-and-reorder run, stage by stage.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use stockcast_core::{DateWindow, PipelineConfig, RunId};
use stockcast_decision::{DecisionOutcome, ReorderDirective, decide};
use stockcast_features::FeatureBuilder;
use stockcast_forecast::predict;
use stockcast_model::{ModelMetrics, train};
use stockcast_records::{EntityKind, RecordFilter, RecordStore, StoreError};
use stockcast_series::{clean, latest_stock_levels};

use crate::collaborators::{Notifier, NotifyError, OpportunitySink, ReorderSink, SinkError};
use crate::error::PipelineError;
use crate::registry::ModelRegistry;
use crate::retry::with_retry;

/// Outcome of one run: counters, held-out metrics, and every error met on
/// the way.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Raw records fetched, before cleaning.
    pub rows_processed: usize,
    /// Observations that survived cleaning.
    pub observations: usize,
    pub dropped_records: usize,
    /// Held-out scores of the freshly trained model. `None` when the run
    /// aborted before training finished.
    pub model_metrics: Option<ModelMetrics>,
    pub directives_emitted: usize,
    pub flags_emitted: usize,
    pub errors: Vec<PipelineError>,
}

impl RunResult {
    fn begin() -> Self {
        let now = Utc::now();
        Self {
            run_id: RunId::new(),
            started_at: now,
            finished_at: now,
            rows_processed: 0,
            observations: 0,
            dropped_records: 0,
            model_metrics: None,
            directives_emitted: 0,
            flags_emitted: 0,
            errors: Vec::new(),
        }
    }

    /// True when no fatal error occurred. Fan-out failures leave the run
    /// successful but are recorded in `errors`.
    pub fn is_success(&self) -> bool {
        self.errors.iter().all(|e| !e.is_fatal())
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {}: {} records in, {} observations ({} dropped), \
             {} directives, {} flags, {} errors",
            self.run_id,
            self.rows_processed,
            self.observations,
            self.dropped_records,
            self.directives_emitted,
            self.flags_emitted,
            self.errors.len(),
        )?;
        if let Some(m) = &self.model_metrics {
            write!(f, ", rmse {:.3}, r2 {:.3}", m.rmse, m.r2)?;
        }
        Ok(())
    }
}

/// Drives the fixed stage order: fetch, clean, featurize, train, publish,
/// forecast, decide, fan out.
///
/// Any failure through forecasting aborts the run at its stage boundary and
/// nothing is published downstream. Fan-out failures are per-item: each
/// directive or flag gets one retry on transient errors, then is recorded as
/// a non-fatal error while its siblings proceed.
pub struct Pipeline<S, N, R, O> {
    store: S,
    notifier: N,
    reorder_sink: R,
    opportunity_sink: O,
    registry: Arc<ModelRegistry>,
}

impl<S, N, R, O> Pipeline<S, N, R, O>
where
    S: RecordStore,
    N: Notifier,
    R: ReorderSink,
    O: OpportunitySink,
{
    pub fn new(store: S, notifier: N, reorder_sink: R, opportunity_sink: O) -> Self {
        Self {
            store,
            notifier,
            reorder_sink,
            opportunity_sink,
            registry: Arc::new(ModelRegistry::new()),
        }
    }

    /// Share a registry across pipelines, or hand one in for inspection.
    pub fn with_registry(mut self, registry: Arc<ModelRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Execute one full run. Never panics; every failure lands in the
    /// returned result's `errors`.
    pub fn run(&self, config: &PipelineConfig) -> RunResult {
        let mut result = RunResult::begin();
        info!(run = %result.run_id, "pipeline run started");

        if let Err(err) = self.execute(config, &mut result) {
            warn!(run = %result.run_id, error = %err, "pipeline run aborted");
            result.errors.push(err);
        }

        result.finished_at = Utc::now();
        info!(
            run = %result.run_id,
            success = result.is_success(),
            outcome = %result,
            "pipeline run finished"
        );
        result
    }

    fn execute(
        &self,
        config: &PipelineConfig,
        result: &mut RunResult,
    ) -> Result<(), PipelineError> {
        config.validate()?;
        let as_of = Utc::now().date_naive();

        let mut records = Vec::new();
        for (kind, filter) in [
            (EntityKind::SalesOrder, RecordFilter::confirmed_sales()),
            (EntityKind::StockMove, RecordFilter::done_moves()),
            (EntityKind::StockQuant, RecordFilter::new()),
        ] {
            let batch = with_retry(&config.retry, StoreError::is_transient, || {
                self.store.fetch(kind, &filter, config.window_days)
            })?;
            debug!(run = %result.run_id, kind = %kind, records = batch.len(), "records fetched");
            records.extend(batch);
        }
        result.rows_processed = records.len();

        let window = DateWindow::ending_at(as_of, config.window_days)?;
        let cleaned = clean(&records, window)?;
        result.observations = cleaned.observations.len();
        result.dropped_records = cleaned.dropped.total();
        let observations = cleaned.observations;

        let builder = FeatureBuilder::fit(&observations, config)?;
        let rows = builder.training_set(&observations);
        debug!(run = %result.run_id, rows = rows.len(), "training set built");

        let model = self.registry.publish(train(builder, rows, config)?);
        result.model_metrics = Some(model.metrics().clone());
        info!(
            run = %result.run_id,
            rmse = model.metrics().rmse,
            r2 = model.metrics().r2,
            training_rows = model.training_rows(),
            "model trained and published"
        );

        let inference = model.features().inference_set(&observations, as_of);
        let forecasts = predict(&model, &inference, config.horizon_days)?;
        debug!(run = %result.run_id, forecasts = forecasts.len(), "forecasts produced");

        let stock_levels = latest_stock_levels(&observations);
        let decisions = decide(&forecasts, &stock_levels, config);
        info!(
            run = %result.run_id,
            directives = decisions.directives.len(),
            flags = decisions.flags.len(),
            "decisions made"
        );

        self.fan_out(config, &decisions, result);
        Ok(())
    }

    /// Deliver directives and flags item by item. Failures are recorded and
    /// siblings continue.
    fn fan_out(
        &self,
        config: &PipelineConfig,
        decisions: &DecisionOutcome,
        result: &mut RunResult,
    ) {
        for directive in &decisions.directives {
            let upserted = with_retry(&config.retry, SinkError::is_transient, || {
                self.reorder_sink
                    .upsert_reorder_rule(directive.product_id, directive.recommended_quantity)
            });
            match upserted {
                Ok(()) => {
                    result.directives_emitted += 1;
                    self.notify_reorder(config, directive, result);
                }
                Err(err) => {
                    warn!(product = %directive.product_id, error = %err, "reorder upsert failed");
                    result.errors.push(PipelineError::Sink {
                        product_id: directive.product_id,
                        detail: err.to_string(),
                    });
                }
            }
        }

        for flag in &decisions.flags {
            let created = with_retry(&config.retry, SinkError::is_transient, || {
                self.opportunity_sink.create_opportunity(
                    flag.product_id,
                    &flag.reason,
                    &flag.recommended_action,
                )
            });
            match created {
                Ok(()) => result.flags_emitted += 1,
                Err(err) => {
                    warn!(product = %flag.product_id, error = %err, "opportunity write failed");
                    result.errors.push(PipelineError::Sink {
                        product_id: flag.product_id,
                        detail: err.to_string(),
                    });
                }
            }
        }
    }

    fn notify_reorder(
        &self,
        config: &PipelineConfig,
        directive: &ReorderDirective,
        result: &mut RunResult,
    ) {
        let subject = format!("Low stock reorder for product {}", directive.product_id);
        let body = format!(
            "Auto-generated reorder rule: predicted demand {:.0} units against {:.0} on hand; \
             ordering {:.0}.",
            directive.predicted_demand, directive.on_hand, directive.recommended_quantity,
        );
        let sent = with_retry(&config.retry, NotifyError::is_transient, || {
            self.notifier.send(&config.alert_recipient, &subject, &body)
        });
        if let Err(err) = sent {
            warn!(product = %directive.product_id, error = %err, "reorder notification failed");
            result.errors.push(PipelineError::Notification {
                product_id: directive.product_id,
                detail: err.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_result_is_successful_and_empty() {
        let result = RunResult::begin();
        assert!(result.is_success());
        assert_eq!(result.directives_emitted, 0);
        assert!(result.model_metrics.is_none());
    }

    #[test]
    fn fan_out_errors_do_not_break_success() {
        let mut result = RunResult::begin();
        result.errors.push(PipelineError::Notification {
            product_id: stockcast_core::ProductId::new(),
            detail: "mailbox unreachable".into(),
        });
        assert!(result.is_success());

        result.errors.push(PipelineError::EmptyDataset);
        assert!(!result.is_success());
    }

    #[test]
    fn display_summarizes_counts_and_metrics() {
        let mut result = RunResult::begin();
        result.rows_processed = 120;
        result.observations = 90;
        result.dropped_records = 3;
        result.directives_emitted = 2;
        result.flags_emitted = 1;
        result.model_metrics = Some(ModelMetrics {
            rmse: 1.25,
            r2: 0.75,
            evaluation_rows: 18,
        });

        let line = result.to_string();
        assert!(line.contains("120 records in"));
        assert!(line.contains("90 observations (3 dropped)"));
        assert!(line.contains("2 directives"));
        assert!(line.contains("rmse 1.250"));
        assert!(line.contains("r2 0.750"));
    }
}
