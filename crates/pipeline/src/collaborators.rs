//! Outbound ports for the fan-out stage and their in-memory adapters.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use stockcast_core::ProductId;

/// Notification delivery failure.
#[derive(Debug, Error)]
#[error("notification transport failed: {source}")]
pub struct NotifyError {
    /// Transient failures are worth one retry; permanent ones are not.
    pub transient: bool,
    #[source]
    pub source: anyhow::Error,
}

impl NotifyError {
    pub fn new(transient: bool, source: impl Into<anyhow::Error>) -> Self {
        Self {
            transient,
            source: source.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

/// Failure writing a directive or flag into the host system.
#[derive(Debug, Error)]
#[error("sink write failed: {source}")]
pub struct SinkError {
    pub transient: bool,
    #[source]
    pub source: anyhow::Error,
}

impl SinkError {
    pub fn new(transient: bool, source: impl Into<anyhow::Error>) -> Self {
        Self {
            transient,
            source: source.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

/// Outbound alert delivery. Fire-and-log: the pipeline records failures on
/// the run result but never aborts over them.
pub trait Notifier: Send + Sync {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        (**self).send(recipient, subject, body)
    }
}

/// Writes reorder rules into the host system. Upsert semantics: one rule per
/// product, the latest quantity wins.
pub trait ReorderSink: Send + Sync {
    fn upsert_reorder_rule(
        &self,
        product_id: ProductId,
        recommended_quantity: f64,
    ) -> Result<(), SinkError>;
}

impl<S> ReorderSink for Arc<S>
where
    S: ReorderSink + ?Sized,
{
    fn upsert_reorder_rule(
        &self,
        product_id: ProductId,
        recommended_quantity: f64,
    ) -> Result<(), SinkError> {
        (**self).upsert_reorder_rule(product_id, recommended_quantity)
    }
}

/// Records growth-opportunity flags in the host system.
pub trait OpportunitySink: Send + Sync {
    fn create_opportunity(
        &self,
        product_id: ProductId,
        reason: &str,
        recommended_action: &str,
    ) -> Result<(), SinkError>;
}

impl<S> OpportunitySink for Arc<S>
where
    S: OpportunitySink + ?Sized,
{
    fn create_opportunity(
        &self,
        product_id: ProductId,
        reason: &str,
        recommended_action: &str,
    ) -> Result<(), SinkError> {
        (**self).create_opportunity(product_id, reason, recommended_action)
    }
}

/// One delivered alert, kept verbatim for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentAlert {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// In-memory notifier.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    sent: RwLock<Vec<SentAlert>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentAlert> {
        self.sent.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for InMemoryNotifier {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(SentAlert {
                recipient: recipient.to_owned(),
                subject: subject.to_owned(),
                body: body.to_owned(),
            });
        Ok(())
    }
}

/// In-memory reorder sink.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryReorderSink {
    rules: RwLock<BTreeMap<ProductId, f64>>,
}

impl InMemoryReorderSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> BTreeMap<ProductId, f64> {
        self.rules.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ReorderSink for InMemoryReorderSink {
    fn upsert_reorder_rule(
        &self,
        product_id: ProductId,
        recommended_quantity: f64,
    ) -> Result<(), SinkError> {
        self.rules
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(product_id, recommended_quantity);
        Ok(())
    }
}

/// One recorded opportunity flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOpportunity {
    pub product_id: ProductId,
    pub reason: String,
    pub recommended_action: String,
}

/// In-memory opportunity sink.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryOpportunitySink {
    opportunities: RwLock<Vec<RecordedOpportunity>>,
}

impl InMemoryOpportunitySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opportunities(&self) -> Vec<RecordedOpportunity> {
        self.opportunities
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl OpportunitySink for InMemoryOpportunitySink {
    fn create_opportunity(
        &self,
        product_id: ProductId,
        reason: &str,
        recommended_action: &str,
    ) -> Result<(), SinkError> {
        self.opportunities
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedOpportunity {
                product_id,
                reason: reason.to_owned(),
                recommended_action: recommended_action.to_owned(),
            });
        Ok(())
    }
}
